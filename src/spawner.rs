//! Spawner: time- and difficulty-driven creation of hail, tokens and the
//! entities owned by specials (cloud drops, turret bullets), plus the
//! constructors for everything created at round start or by an effect.
//!
//! All randomness comes through an injected `Rng` so callers control
//! determinism.

use std::f64::consts::TAU;

use rand::Rng;

use crate::config::TokenSelection;
use crate::constants::{
    BULLET_HEIGHT, BULLET_SPEED, BULLET_WIDTH, CANNON_HEIGHT, CLOUD_DROP_INTERVAL_MS,
    CLOUD_DROP_MAX_SIZE, CLOUD_DROP_MIN_SIZE, CLOUD_DROP_SPEED, CLOUD_HEIGHT, CLOUD_SPEED,
    CLOUD_WIDTH, CLOUD_Y, CORN_GAP, CORN_HEIGHT, DEFENDER_HEIGHT, DEFENDER_SPEED, DEFENDER_WIDTH,
    DEFENDER_Y_OFFSET, DIAGONAL_DRIFT, DIAGONAL_SPEED_MULTIPLIER, EXTRA_HAIL_BASE_PROBABILITY,
    EXTRA_HAIL_MAX_PROBABILITY, EXTRA_HAIL_PROBABILITY_SLOPE, EXTRA_HAIL_TIERS, FIRE_CADENCE_MS,
    HAIL_INTERVAL_REDUCTION_MS, HAIL_MIN_INTERVAL_MS, HAIL_MIN_SIZE, HAIL_RESCHEDULE_THRESHOLD_MS,
    HAIL_SIZE_RANGE, HAIL_START_INTERVAL_MS, MAX_SPEED_MULTIPLIER, PARTICLES_PER_SIZE,
    RING_DURATION_MS, RING_MAX_RADIUS_FACTOR, RING_SPEED, RING_START_RADIUS, TOKEN_MIN_INTERVAL_MS,
    TOKEN_SIZE, TOKEN_SPEED, TOKEN_START_INTERVAL_MS, TURRET_HEIGHT, TURRET_SPEED, TURRET_WIDTH,
};
use crate::entities::{
    CompanionTurret, CornStalk, Defender, EffectKind, ExplosionRing, Hail, Particle, ParticleTint,
    Playfield, Projectile, RoundStats, StormCloud, Token, World,
};

// ── Interval curves ───────────────────────────────────────────────────────────

/// Hail spawn interval for a difficulty multiplier: shrinks with `ln(d)`
/// down to a floor.
pub fn hail_interval_ms(difficulty: f64) -> f64 {
    (HAIL_START_INTERVAL_MS - difficulty.ln() * HAIL_INTERVAL_REDUCTION_MS * 3.0)
        .max(HAIL_MIN_INTERVAL_MS)
}

/// Token spawn interval: linear from the starting interval at round start
/// to the floor at the end of the round.
pub fn token_interval_ms(elapsed_ms: f64, round_ms: f64) -> f64 {
    let progress = if round_ms > 0.0 { elapsed_ms / round_ms } else { 1.0 };
    (TOKEN_START_INTERVAL_MS - progress * (TOKEN_START_INTERVAL_MS - TOKEN_MIN_INTERVAL_MS))
        .max(TOKEN_MIN_INTERVAL_MS)
}

/// Speed of a newly spawned hail unit: the difficulty multiplier, capped.
pub fn hail_speed(difficulty: f64, scale: f64) -> f64 {
    difficulty.min(MAX_SPEED_MULTIPLIER) * scale
}

/// Probability that a hail spawn brings a second unit along.  Rises
/// linearly with difficulty up to a cap.
pub fn extra_hail_probability(difficulty: f64) -> f64 {
    (EXTRA_HAIL_BASE_PROBABILITY + (difficulty - 1.0) * EXTRA_HAIL_PROBABILITY_SLOPE)
        .min(EXTRA_HAIL_MAX_PROBABILITY)
}

// ── Spawner ───────────────────────────────────────────────────────────────────

/// An extra hail unit waiting for its delay to run out.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingHail {
    pub due_at: f64,
    /// Speed fixed when the burst was rolled.
    pub speed: f64,
}

/// Owns the hail and token schedules and the queue of delayed extra hail.
#[derive(Clone, Debug)]
pub struct Spawner {
    selection: TokenSelection,
    next_token: usize,
    pending: Vec<PendingHail>,
    hail_interval_ms: f64,
    next_hail_at: f64,
    round_ms: f64,
    next_token_at: f64,
}

impl Spawner {
    /// Schedules start at `now`: the first hail after one hail interval, the
    /// first token after the starting token interval.
    pub fn new(selection: TokenSelection, round_ms: f64, now: f64) -> Self {
        let hail_interval = hail_interval_ms(1.0);
        Self {
            selection,
            next_token: 0,
            pending: Vec::new(),
            hail_interval_ms: hail_interval,
            next_hail_at: now + hail_interval,
            round_ms,
            next_token_at: now + token_interval_ms(0.0, round_ms),
        }
    }

    pub fn hail_interval(&self) -> f64 {
        self.hail_interval_ms
    }

    pub fn next_hail_at(&self) -> f64 {
        self.next_hail_at
    }

    pub fn next_token_at(&self) -> f64 {
        self.next_token_at
    }

    pub fn pending(&self) -> &[PendingHail] {
        &self.pending
    }

    /// Run the schedules for this tick: release due extra hail, then fire
    /// the hail and token timers if they are due.
    pub fn update(
        &mut self,
        hail: &mut Vec<Hail>,
        tokens: &mut Vec<Token>,
        field: &Playfield,
        difficulty: f64,
        now: f64,
        elapsed_ms: f64,
        rng: &mut impl Rng,
    ) {
        self.release_pending(hail, field, now, rng);

        if now >= self.next_hail_at {
            self.create_hail(hail, field, difficulty, now, rng);
            self.next_hail_at += self.hail_interval_ms;
            // Never leave the timer more than one interval behind.
            if self.next_hail_at <= now {
                self.next_hail_at = now + self.hail_interval_ms;
            }
        }

        if now >= self.next_token_at {
            self.create_token(tokens, field, rng);
            self.next_token_at = now + token_interval_ms(elapsed_ms, self.round_ms);
        }
    }

    /// Insert one hail unit now and roll the delayed extras.
    pub fn create_hail(
        &mut self,
        hail: &mut Vec<Hail>,
        field: &Playfield,
        difficulty: f64,
        now: f64,
        rng: &mut impl Rng,
    ) {
        let speed = hail_speed(difficulty, field.scale);
        hail.push(new_hail(field, speed, rng));

        let p = extra_hail_probability(difficulty);
        for (threshold, reduction, max_delay) in EXTRA_HAIL_TIERS {
            if difficulty > threshold && rng.gen::<f64>() < p - reduction {
                self.pending.push(PendingHail {
                    due_at: now + rng.gen::<f64>() * max_delay,
                    speed,
                });
            }
        }
        log::trace!("hail spawned, {} extra pending", self.pending.len());
    }

    /// Move every due extra unit into the hail collection.
    pub fn release_pending(
        &mut self,
        hail: &mut Vec<Hail>,
        field: &Playfield,
        now: f64,
        rng: &mut impl Rng,
    ) -> usize {
        let mut released = 0;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_at <= now {
                let due = self.pending.remove(i);
                hail.push(new_hail(field, due.speed, rng));
                released += 1;
            } else {
                i += 1;
            }
        }
        released
    }

    /// Insert one token at a random column.
    pub fn create_token(&mut self, tokens: &mut Vec<Token>, field: &Playfield, rng: &mut impl Rng) {
        let kind = self.select_token_kind(rng);
        let size = TOKEN_SIZE * field.scale;
        tokens.push(Token {
            x: rng.gen::<f64>() * (field.width - size).max(0.0),
            y: -size,
            size,
            speed: TOKEN_SPEED * field.scale,
            kind,
            rotation: 0.0,
            pulse: 0.0,
            pulse_rising: true,
        });
        log::debug!("token spawned: {:?}", kind);
    }

    pub fn select_token_kind(&mut self, rng: &mut impl Rng) -> EffectKind {
        match self.selection {
            TokenSelection::Sequential => {
                let kind = EffectKind::ALL[self.next_token];
                self.next_token = (self.next_token + 1) % EffectKind::ALL.len();
                kind
            }
            TokenSelection::Weighted { bonus_probability } => {
                let want_bonus = rng.gen::<f64>() < bonus_probability;
                let pool: Vec<EffectKind> = EffectKind::ALL
                    .iter()
                    .copied()
                    .filter(|k| k.is_bonus() == want_bonus)
                    .collect();
                pool[rng.gen_range(0..pool.len())]
            }
        }
    }

    /// Re-derive the hail interval from the current difficulty.  The timer
    /// is only rescheduled when the new interval drifted past the
    /// threshold; returns whether it was.
    pub fn retune_hail_interval(&mut self, difficulty: f64, now: f64) -> bool {
        let interval = hail_interval_ms(difficulty);
        if (interval - self.hail_interval_ms).abs() <= HAIL_RESCHEDULE_THRESHOLD_MS {
            return false;
        }
        self.hail_interval_ms = interval;
        self.next_hail_at = self.next_hail_at.min(now + interval);
        log::debug!("hail interval rescheduled to {:.0} ms", interval);
        true
    }

    /// Scale pending burst speeds after a resize.
    pub fn rescale(&mut self, ratio: f64) {
        for due in self.pending.iter_mut() {
            due.speed *= ratio;
        }
    }

    /// Forget queued extra hail without touching the timers.
    pub fn drop_pending(&mut self) {
        self.pending.clear();
    }

    /// Drop every pending spawn and stop both timers.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.next_hail_at = f64::INFINITY;
        self.next_token_at = f64::INFINITY;
    }
}

fn new_hail(field: &Playfield, speed: f64, rng: &mut impl Rng) -> Hail {
    let size = (HAIL_MIN_SIZE + rng.gen::<f64>() * HAIL_SIZE_RANGE) * field.scale;
    Hail {
        x: rng.gen::<f64>() * (field.width - size).max(0.0),
        y: -size,
        size,
        speed,
    }
}

// ── Round-start entities ──────────────────────────────────────────────────────

/// A fresh round world: centred defender, a full row of corn, nothing else.
pub fn new_world(field: &Playfield, corn_count: usize) -> World {
    World {
        playfield: *field,
        defender: new_defender(field),
        projectiles: Vec::new(),
        hail: Vec::new(),
        corn: plant_corn(field, corn_count),
        tokens: Vec::new(),
        cloud: None,
        turret: None,
        ring: None,
        particles: Vec::new(),
        dying_corn: Vec::new(),
        stats: RoundStats::default(),
    }
}

pub fn new_defender(field: &Playfield) -> Defender {
    let width = DEFENDER_WIDTH * field.scale;
    let height = DEFENDER_HEIGHT * field.scale;
    Defender {
        x: field.width / 2.0 - width / 2.0,
        y: field.height - height - DEFENDER_Y_OFFSET * field.scale,
        width,
        height,
        speed: DEFENDER_SPEED * field.scale,
        fire_cadence_ms: FIRE_CADENCE_MS,
        last_fire_ms: None,
    }
}

/// Lay out `count` equal stalk slots along the bottom edge, all alive.
pub fn plant_corn(field: &Playfield, count: usize) -> Vec<CornStalk> {
    if count == 0 {
        return Vec::new();
    }
    let slot = (field.width / count as f64).floor();
    let height = CORN_HEIGHT * field.scale;
    (0..count)
        .map(|i| CornStalk {
            x: i as f64 * slot,
            y: field.height - height,
            width: slot - CORN_GAP * field.scale,
            height,
            alive: true,
        })
        .collect()
}

// ── Projectiles ───────────────────────────────────────────────────────────────

fn bullet(x_center: f64, y: f64, scale: f64, speed: f64, drift: f64) -> Projectile {
    let width = BULLET_WIDTH * scale;
    Projectile {
        x: x_center - width / 2.0,
        y,
        width,
        height: BULLET_HEIGHT * scale,
        speed,
        drift,
    }
}

/// One defender volley: the centre shot, plus the parallel and diagonal
/// pairs when those effects are active.
pub fn defender_volley(
    defender: &Defender,
    scale: f64,
    parallel: bool,
    diagonal: bool,
) -> Vec<Projectile> {
    let y = defender.y - CANNON_HEIGHT * scale;
    let speed = BULLET_SPEED * scale;
    let centre = defender.x + defender.width / 2.0;

    let mut volley = vec![bullet(centre, y, scale, speed, 0.0)];
    if parallel {
        volley.push(bullet(defender.x + defender.width / 4.0, y, scale, speed, 0.0));
        volley.push(bullet(defender.x + defender.width * 3.0 / 4.0, y, scale, speed, 0.0));
    }
    if diagonal {
        let slow = speed * DIAGONAL_SPEED_MULTIPLIER;
        let drift = DIAGONAL_DRIFT * scale;
        volley.push(bullet(centre, y, scale, slow, -drift));
        volley.push(bullet(centre, y, scale, slow, drift));
    }
    volley
}

/// Fire the turret if its cadence allows.  Returns whether it fired.
pub fn fire_turret(turret: &mut CompanionTurret, scale: f64, now: f64) -> bool {
    if let Some(last) = turret.last_fire_ms {
        if now - last <= turret.fire_cadence_ms {
            return false;
        }
    }
    let height = BULLET_HEIGHT * scale;
    turret.bullets.push(bullet(
        turret.x + turret.width / 2.0,
        turret.y - height,
        scale,
        BULLET_SPEED * scale,
        0.0,
    ));
    turret.last_fire_ms = Some(now);
    true
}

// ── Specials ──────────────────────────────────────────────────────────────────

pub fn new_storm_cloud(
    field: &Playfield,
    now: f64,
    duration_ms: f64,
    rng: &mut impl Rng,
) -> StormCloud {
    let width = CLOUD_WIDTH * field.scale;
    let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    StormCloud {
        x: rng.gen::<f64>() * (field.width - width).max(0.0),
        y: CLOUD_Y * field.scale,
        width,
        height: CLOUD_HEIGHT * field.scale,
        speed_x: CLOUD_SPEED * field.scale * direction,
        last_drop_ms: None,
        drops: Vec::new(),
        expires_at: now + duration_ms,
    }
}

/// Drop one hail unit from under the cloud if the drop cadence allows.
pub fn drop_from_cloud(
    cloud: &mut StormCloud,
    scale: f64,
    now: f64,
    rng: &mut impl Rng,
) -> bool {
    if let Some(last) = cloud.last_drop_ms {
        if now - last <= CLOUD_DROP_INTERVAL_MS {
            return false;
        }
    }
    let size = rng.gen_range(CLOUD_DROP_MIN_SIZE..CLOUD_DROP_MAX_SIZE) * scale;
    cloud.drops.push(Hail {
        x: cloud.x + rng.gen::<f64>() * cloud.width - size / 2.0,
        y: cloud.y + cloud.height,
        size,
        speed: CLOUD_DROP_SPEED * scale,
    });
    cloud.last_drop_ms = Some(now);
    true
}

/// The turret rolls out from the defender's side.
pub fn new_turret(defender: &Defender, scale: f64, now: f64, duration_ms: f64) -> CompanionTurret {
    CompanionTurret {
        x: defender.x - defender.width / 2.0,
        y: defender.y + defender.height / 2.0,
        width: TURRET_WIDTH * scale,
        height: TURRET_HEIGHT * scale,
        speed_x: TURRET_SPEED * scale,
        fire_cadence_ms: FIRE_CADENCE_MS,
        last_fire_ms: None,
        bullets: Vec::new(),
        expires_at: now + duration_ms,
    }
}

/// A ring centred on the defender, big enough to sweep the whole field.
pub fn new_explosion_ring(defender: &Defender, field: &Playfield, now: f64) -> ExplosionRing {
    ExplosionRing {
        x: defender.x + defender.width / 2.0,
        y: defender.y + defender.height / 2.0,
        radius: RING_START_RADIUS * field.scale,
        max_radius: field.width.max(field.height) * RING_MAX_RADIUS_FACTOR,
        speed: RING_SPEED * field.scale,
        started_at: now,
        duration_ms: RING_DURATION_MS,
        alpha: 1.0,
    }
}

// ── Visuals ───────────────────────────────────────────────────────────────────

/// Shatter a hail unit (or cloud drop) at `(x, y)`: one particle per 1.5
/// units of size, flung in random directions from its centre.
pub fn shatter(
    particles: &mut Vec<Particle>,
    hail: &Hail,
    tint: ParticleTint,
    scale: f64,
    rng: &mut impl Rng,
) {
    let count = (hail.size * PARTICLES_PER_SIZE).floor() as usize;
    let (cx, cy) = (hail.x + hail.size / 2.0, hail.y + hail.size / 2.0);
    for _ in 0..count {
        let angle = rng.gen::<f64>() * TAU;
        let speed = (rng.gen::<f64>() * 2.0 + 1.0) * scale;
        particles.push(Particle {
            x: cx,
            y: cy,
            size: (rng.gen::<f64>() * 3.0 + 1.0) * scale,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            alpha: 1.0,
            tint,
        });
    }
}
