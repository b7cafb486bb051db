//! Round controller. Owns one round's state and advances it one fixed
//! tick at a time: countdown, motion, spawns, effects, collisions,
//! termination, difficulty.
//!
//! A round goes `Idle → Running → Ended` exactly once.  Playing again means
//! building a new `Round`.

use std::fmt;

use rand::Rng;

use crate::collision;
use crate::config::{GameConfig, Scoring};
use crate::constants::{DIFFICULTY_INCREASE_RATE, TICKS_PER_SECOND, TICK_MS};
use crate::effects::EffectRegistry;
use crate::entities::{CollectedEffect, EffectKind, Playfield, RoundStats, World};
use crate::error::Result;
use crate::input::{InputFrame, InputSnapshot, InputTracker};
use crate::motion;
use crate::render::Renderer;
use crate::spawner::{self, Spawner};

// ── Round outcome ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The countdown reached zero.
    Time,
    /// Every corn stalk was destroyed.
    Corn,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Time => write!(f, "time"),
            EndReason::Corn => write!(f, "corn"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended(EndReason),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerInfo {
    pub nickname: String,
    pub organization: String,
}

/// Final score, term by term.  Each `*_points` field is the points earned
/// by that term, not the per-unit value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub hail_destroyed: u32,
    pub hail_points: u32,
    pub cloud_drops_destroyed: u32,
    pub cloud_drop_points: u32,
    pub corn_alive: u32,
    pub corn_points: u32,
}

impl ScoreBreakdown {
    pub fn new(stats: &RoundStats, corn_alive: usize, scoring: &Scoring) -> Self {
        let corn_alive = corn_alive as u32;
        Self {
            hail_destroyed: stats.hail_destroyed,
            hail_points: stats.hail_destroyed * scoring.hail_points,
            cloud_drops_destroyed: stats.cloud_drops_destroyed,
            cloud_drop_points: stats.cloud_drops_destroyed * scoring.cloud_drop_points,
            corn_alive,
            corn_points: corn_alive * scoring.corn_points,
        }
    }

    pub fn total(&self) -> u32 {
        self.hail_points + self.cloud_drop_points + self.corn_points
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundResult {
    pub player: PlayerInfo,
    pub reason: EndReason,
    pub breakdown: ScoreBreakdown,
    pub collected: Vec<CollectedEffect>,
    pub ended_at_ms: f64,
}

impl RoundResult {
    pub fn score(&self) -> u32 {
        self.breakdown.total()
    }
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// UI side of the round: score and countdown updates, and the end screen.
pub trait RoundObserver {
    fn on_score_changed(&mut self, _score: u32) {}
    fn on_countdown(&mut self, _remaining_secs: u32) {}
    fn on_round_end(&mut self, _reason: EndReason, _breakdown: &ScoreBreakdown) {}
}

impl RoundObserver for () {}

/// Persistence side: receives the final score once per round.
pub trait ScoreSink {
    fn record_score(&mut self, player: &PlayerInfo, score: u32) -> Result<()>;
}

impl ScoreSink for () {
    fn record_score(&mut self, _player: &PlayerInfo, _score: u32) -> Result<()> {
        Ok(())
    }
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// Round clock counted in whole ticks, so it lands on zero exactly.
#[derive(Clone, Debug)]
pub struct Countdown {
    total_ticks: u64,
    elapsed_ticks: u64,
    storm_at_tick: Option<u64>,
    storm_fired: bool,
}

/// What happened on one countdown step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountdownStep {
    /// Set when the displayed whole-second value changed.
    pub second: Option<u32>,
    /// Set once, on the step the timed storm cloud is due.
    pub storm_due: bool,
    pub expired: bool,
}

impl Countdown {
    pub fn new(round_secs: u32, storm_at_secs: Option<u32>) -> Self {
        let tps = TICKS_PER_SECOND as u64;
        Self {
            total_ticks: round_secs as u64 * tps,
            elapsed_ticks: 0,
            storm_at_tick: storm_at_secs.map(|s| s as u64 * tps),
            storm_fired: false,
        }
    }

    pub fn advance(&mut self) -> CountdownStep {
        let before = self.remaining_secs();
        self.elapsed_ticks = (self.elapsed_ticks + 1).min(self.total_ticks);
        let after = self.remaining_secs();

        let storm_due = !self.storm_fired
            && self.storm_at_tick.is_some_and(|at| self.elapsed_ticks >= at);
        if storm_due {
            self.storm_fired = true;
        }

        CountdownStep {
            second: (after != before).then_some(after),
            storm_due,
            expired: self.is_expired(),
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        let left = self.total_ticks - self.elapsed_ticks;
        left.div_ceil(TICKS_PER_SECOND as u64) as u32
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ticks as f64 * TICK_MS
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed_ticks >= self.total_ticks
    }
}

// ── Round ─────────────────────────────────────────────────────────────────────

pub struct Round<R: Rng> {
    config: GameConfig,
    phase: Phase,
    world: World,
    effects: EffectRegistry,
    spawner: Spawner,
    countdown: Countdown,
    input: InputTracker,
    ticks: u64,
    difficulty: f64,
    rng: R,
    player: PlayerInfo,
    last_score: Option<u32>,
    result: Option<RoundResult>,
}

impl<R: Rng> Round<R> {
    /// An idle round on a `width × height` playfield.
    pub fn new(config: GameConfig, width: f64, height: f64, rng: R) -> Self {
        let field = Playfield::new(width, height);
        Self {
            world: spawner::new_world(&field, config.corn_count),
            effects: EffectRegistry::new(),
            spawner: Spawner::new(config.token_selection, config.round_ms(), 0.0),
            countdown: Countdown::new(config.round_secs, config.storm_cloud_at_secs),
            input: InputTracker::new(),
            ticks: 0,
            difficulty: 1.0,
            phase: Phase::Idle,
            rng,
            player: PlayerInfo::default(),
            last_score: None,
            result: None,
            config,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct access to the entity collections, for scripted setups.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    pub fn now_ms(&self) -> f64 {
        self.ticks as f64 * TICK_MS
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn result(&self) -> Option<&RoundResult> {
        self.result.as_ref()
    }

    pub fn player(&self) -> &PlayerInfo {
        &self.player
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// `Idle → Running`.  Resets every collection, counter and the
    /// difficulty.  Returns `false` (and changes nothing) from any other
    /// phase.
    pub fn start(&mut self, player: PlayerInfo) -> bool {
        if self.phase != Phase::Idle {
            log::warn!("start ignored: round is {:?}", self.phase);
            return false;
        }

        self.world = spawner::new_world(&self.world.playfield, self.config.corn_count);
        self.effects.clear();
        self.spawner = Spawner::new(self.config.token_selection, self.config.round_ms(), 0.0);
        self.countdown = Countdown::new(self.config.round_secs, self.config.storm_cloud_at_secs);
        self.input.reset();
        self.ticks = 0;
        self.difficulty = 1.0;
        self.last_score = None;
        self.result = None;
        self.player = player;
        self.phase = Phase::Running;

        log::info!(
            "round started for {:?} (scale {:.2})",
            self.player.nickname,
            self.world.playfield.scale
        );
        true
    }

    /// Advance one fixed tick.  Does nothing unless the round is running.
    pub fn tick(
        &mut self,
        input: InputSnapshot,
        ui: &mut impl RoundObserver,
        sink: &mut impl ScoreSink,
    ) -> Phase {
        if self.phase != Phase::Running {
            return self.phase;
        }

        self.ticks += 1;
        let now = self.now_ms();

        let step = self.countdown.advance();
        if let Some(secs) = step.second {
            ui.on_countdown(secs);
        }
        if step.expired {
            self.end(EndReason::Time, ui, sink);
            return self.phase;
        }

        let frame = self.input.observe(input);
        self.advance_motion(&frame, now);
        self.run_spawns(now, step.storm_due);
        self.expire_effects(now);

        collision::resolve(
            &mut self.world,
            &mut self.effects,
            &self.config.scoring,
            now,
            &mut self.rng,
        );

        let score = self.world.stats.score;
        if self.last_score != Some(score) {
            self.last_score = Some(score);
            ui.on_score_changed(score);
        }

        if self.world.all_corn_dead() {
            self.end(EndReason::Corn, ui, sink);
            return self.phase;
        }

        self.difficulty += DIFFICULTY_INCREASE_RATE;
        self.spawner.retune_hail_interval(self.difficulty, now);
        self.phase
    }

    /// End the round from outside, as an external countdown would.
    pub fn expire_timer(&mut self, ui: &mut impl RoundObserver, sink: &mut impl ScoreSink) {
        if self.phase == Phase::Running {
            self.end(EndReason::Time, ui, sink);
        }
    }

    /// `Running → Ended`: stop every schedule, freeze the breakdown and hand
    /// the score to the sink.  A sink failure is logged, not propagated.
    fn end(&mut self, reason: EndReason, ui: &mut impl RoundObserver, sink: &mut impl ScoreSink) {
        self.phase = Phase::Ended(reason);
        self.spawner.clear();

        let breakdown = ScoreBreakdown::new(
            &self.world.stats,
            self.world.alive_corn(),
            &self.config.scoring,
        );
        let result = RoundResult {
            player: self.player.clone(),
            reason,
            breakdown,
            collected: self.world.stats.collected.clone(),
            ended_at_ms: self.now_ms(),
        };

        log::info!(
            "round ended ({}) after {:.1}s: {} points",
            reason,
            self.now_ms() / 1000.0,
            result.score()
        );

        ui.on_round_end(reason, &breakdown);
        if let Err(e) = sink.record_score(&self.player, result.score()) {
            log::warn!("Could not record score: {}", e);
        }
        self.result = Some(result);
    }

    // ── Tick stages ───────────────────────────────────────────────────────────

    fn advance_motion(&mut self, frame: &InputFrame, now: f64) {
        let field = self.world.playfield;
        let world = &mut self.world;

        motion::move_defender(&mut world.defender, frame, &field);

        let cadence_ready = world
            .defender
            .last_fire_ms
            .map_or(true, |last| now - last >= world.defender.fire_cadence_ms);
        if frame.fire_pressed || (frame.fire_held && cadence_ready) {
            let volley = spawner::defender_volley(
                &world.defender,
                field.scale,
                self.effects.is_active(EffectKind::ParallelBullets),
                self.effects.is_active(EffectKind::DiagonalBullets),
            );
            world.projectiles.extend(volley);
            world.defender.last_fire_ms = Some(now);
        }

        motion::advance_projectiles(&mut world.projectiles, &field);
        motion::advance_falling(&mut world.hail, &field);
        motion::advance_falling(&mut world.tokens, &field);

        if let Some(cloud) = world.cloud.as_mut() {
            motion::advance_cloud(cloud, &field);
        }
        if let Some(turret) = world.turret.as_mut() {
            motion::advance_turret(turret, &field);
        }
        if let Some(ring) = world.ring.as_mut() {
            if !motion::advance_ring(ring, now) {
                world.ring = None;
            }
        }

        motion::advance_particles(&mut world.particles);
        motion::advance_dying_corn(&mut world.dying_corn);
    }

    fn run_spawns(&mut self, now: f64, storm_due: bool) {
        let field = self.world.playfield;
        self.spawner.update(
            &mut self.world.hail,
            &mut self.world.tokens,
            &field,
            self.difficulty,
            now,
            self.countdown.elapsed_ms(),
            &mut self.rng,
        );

        if storm_due {
            let duration = EffectKind::StormCloud.duration_ms().unwrap_or_default();
            self.world.cloud = Some(spawner::new_storm_cloud(&field, now, duration, &mut self.rng));
            log::info!("timed storm cloud rolled in");
        }
        if let Some(cloud) = self.world.cloud.as_mut() {
            spawner::drop_from_cloud(cloud, field.scale, now, &mut self.rng);
        }
        if let Some(turret) = self.world.turret.as_mut() {
            spawner::fire_turret(turret, field.scale, now);
        }
    }

    fn expire_effects(&mut self, now: f64) {
        self.effects.tick(now, &mut self.world);

        if self.world.cloud.as_ref().is_some_and(|c| now > c.expires_at) {
            self.world.cloud = None;
        }
        if self.world.turret.as_ref().is_some_and(|t| now > t.expires_at) {
            self.world.turret = None;
        }
    }

    // ── Collaborator hooks ────────────────────────────────────────────────────

    /// Adopt a new playfield size, rescaling every entity in place.
    /// Degenerate sizes are ignored.
    pub fn resize(&mut self, width: f64, height: f64) {
        let field = Playfield::new(width, height);
        if !(field.scale.is_finite() && field.scale > 0.0) {
            log::warn!("resize to {}x{} ignored", width, height);
            return;
        }
        let old_scale = self.world.playfield.scale;
        if old_scale.is_finite() && old_scale > 0.0 {
            motion::rescale(&mut self.world, field);
            self.spawner.rescale(field.scale / old_scale);
        } else {
            self.reseat(field);
        }
        log::debug!("resized to {}x{} (scale {:.2})", width, height, field.scale);
    }

    /// Rebuild the world on `field` when the old one had no usable scale.
    /// Nothing on a zero-sized field can be rescaled, so only the corn
    /// flags, stats and fire state carry over.
    fn reseat(&mut self, field: Playfield) {
        let mut world = spawner::new_world(&field, self.world.corn.len());
        for (stalk, old) in world.corn.iter_mut().zip(&self.world.corn) {
            stalk.alive = old.alive;
        }
        world.defender.fire_cadence_ms = self.world.defender.fire_cadence_ms;
        world.defender.last_fire_ms = self.world.defender.last_fire_ms;
        world.stats = std::mem::take(&mut self.world.stats);
        self.world = world;
        self.spawner.drop_pending();
        log::debug!("world re-seated on {}x{}", field.width, field.height);
    }

    /// Hand every visible entity to the renderer, back to front.
    pub fn draw(&self, renderer: &mut impl Renderer) {
        let world = &self.world;
        renderer.clear();

        for stalk in world.corn.iter().filter(|s| s.alive) {
            renderer.draw_corn(stalk);
        }
        for corn in &world.dying_corn {
            renderer.draw_dying_corn(corn);
        }
        if let Some(cloud) = &world.cloud {
            renderer.draw_cloud(cloud);
            for drop in &cloud.drops {
                renderer.draw_cloud_drop(drop);
            }
        }
        for hail in &world.hail {
            renderer.draw_hail(hail);
        }
        for token in &world.tokens {
            renderer.draw_token(token);
        }
        if let Some(turret) = &world.turret {
            renderer.draw_turret(turret);
            for bullet in &turret.bullets {
                renderer.draw_projectile(bullet);
            }
        }
        for bullet in &world.projectiles {
            renderer.draw_projectile(bullet);
        }
        renderer.draw_defender(&world.defender);
        if let Some(ring) = &world.ring {
            renderer.draw_ring(ring);
        }
        for particle in &world.particles {
            renderer.draw_particle(particle);
        }
    }
}
