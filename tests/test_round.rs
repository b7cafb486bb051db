use hail_defense::config::{GameConfig, Scoring, TokenSelection};
use hail_defense::entities::*;
use hail_defense::error::{Error, Result};
use hail_defense::input::{InputSnapshot, InputTracker};
use hail_defense::round::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn config(round_secs: u32) -> GameConfig {
    GameConfig {
        round_secs,
        storm_cloud_at_secs: None,
        ..GameConfig::default()
    }
}

fn make_round(cfg: GameConfig) -> Round<StdRng> {
    let mut round = Round::new(cfg, 600.0, 400.0, StdRng::seed_from_u64(42));
    assert!(round.start(PlayerInfo {
        nickname: "tester".into(),
        organization: "farm".into(),
    }));
    round
}

fn idle() -> InputSnapshot {
    InputSnapshot::default()
}

fn fire() -> InputSnapshot {
    InputSnapshot {
        fire: true,
        ..InputSnapshot::default()
    }
}

#[derive(Default)]
struct Recorder {
    scores: Vec<u32>,
    countdown: Vec<u32>,
    ended: Vec<(EndReason, ScoreBreakdown)>,
}

impl RoundObserver for Recorder {
    fn on_score_changed(&mut self, score: u32) {
        self.scores.push(score);
    }
    fn on_countdown(&mut self, remaining_secs: u32) {
        self.countdown.push(remaining_secs);
    }
    fn on_round_end(&mut self, reason: EndReason, breakdown: &ScoreBreakdown) {
        self.ended.push((reason, *breakdown));
    }
}

#[derive(Default)]
struct MemorySink {
    recorded: Vec<(String, u32)>,
}

impl ScoreSink for MemorySink {
    fn record_score(&mut self, player: &PlayerInfo, score: u32) -> Result<()> {
        self.recorded.push((player.nickname.clone(), score));
        Ok(())
    }
}

struct FailingSink;

impl ScoreSink for FailingSink {
    fn record_score(&mut self, _player: &PlayerInfo, _score: u32) -> Result<()> {
        Err(Error::Io(std::io::Error::other("disk full")))
    }
}

/// A stationary token sitting on the defender, picked up next tick.
fn token_on_defender(kind: EffectKind) -> Token {
    Token {
        x: 285.0,
        y: 360.0,
        size: 30.0,
        speed: 0.0,
        kind,
        rotation: 0.0,
        pulse: 0.0,
        pulse_rising: true,
    }
}

fn revive_corn(round: &mut Round<StdRng>) {
    for stalk in round.world_mut().corn.iter_mut() {
        stalk.alive = true;
    }
}

fn run_ticks(round: &mut Round<StdRng>, n: usize) -> Phase {
    let mut phase = round.phase();
    for _ in 0..n {
        phase = round.tick(idle(), &mut (), &mut ());
    }
    phase
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn new_round_is_idle_and_ignores_ticks() {
    let mut round = Round::new(config(120), 600.0, 400.0, StdRng::seed_from_u64(1));
    assert_eq!(round.phase(), Phase::Idle);
    assert_eq!(round.tick(fire(), &mut (), &mut ()), Phase::Idle);
    assert!(round.world().projectiles.is_empty());
    assert_eq!(round.now_ms(), 0.0);
}

#[test]
fn start_resets_the_world() {
    let round = make_round(config(120));
    let world = round.world();
    assert_eq!(round.phase(), Phase::Running);
    assert_eq!(world.alive_corn(), 20);
    assert!(world.hail.is_empty());
    assert_eq!(world.stats.score, 0);
    assert_eq!(round.difficulty(), 1.0);
    assert_eq!(round.remaining_secs(), 120);
}

#[test]
fn start_only_from_idle() {
    let mut round = make_round(config(120));
    assert!(!round.start(PlayerInfo::default()));
    assert_eq!(round.player().nickname, "tester");
}

// ── Termination ───────────────────────────────────────────────────────────────

#[test]
fn round_ends_when_time_runs_out() {
    let mut round = make_round(config(1));
    let mut ui = Recorder::default();
    let mut sink = MemorySink::default();

    for _ in 0..59 {
        assert_eq!(round.tick(idle(), &mut ui, &mut sink), Phase::Running);
    }
    let phase = round.tick(idle(), &mut ui, &mut sink);

    assert_eq!(phase, Phase::Ended(EndReason::Time));
    assert_eq!(ui.countdown, vec![0]);
    assert_eq!(ui.ended.len(), 1);
    assert_eq!(sink.recorded, vec![("tester".to_string(), 1000)]);
}

#[test]
fn round_ends_when_all_corn_is_gone() {
    let mut round = make_round(config(120));
    let mut ui = Recorder::default();
    let mut sink = MemorySink::default();
    for stalk in round.world_mut().corn.iter_mut() {
        stalk.alive = false;
    }

    let phase = round.tick(idle(), &mut ui, &mut sink);

    assert_eq!(phase, Phase::Ended(EndReason::Corn));
    let result = round.result().expect("result stored");
    assert_eq!(result.reason, EndReason::Corn);
    assert_eq!(result.breakdown.corn_alive, 0);
    assert_eq!(sink.recorded, vec![("tester".to_string(), 0)]);
}

#[test]
fn ended_round_is_frozen() {
    let mut round = make_round(config(120));
    let mut sink = MemorySink::default();
    for stalk in round.world_mut().corn.iter_mut() {
        stalk.alive = false;
    }
    round.tick(idle(), &mut (), &mut sink);

    let world = round.world_mut();
    world.hail.push(Hail {
        x: 100.0,
        y: 100.0,
        size: 20.0,
        speed: 1.0,
    });
    world.projectiles.push(Projectile {
        x: 105.0,
        y: 105.0,
        width: 5.0,
        height: 10.0,
        speed: 7.0,
        drift: 0.0,
    });

    assert_eq!(round.tick(fire(), &mut (), &mut sink), Phase::Ended(EndReason::Corn));
    assert_eq!(round.world().stats.score, 0);
    assert_eq!(round.world().hail.len(), 1);
    assert_eq!(sink.recorded.len(), 1, "score recorded exactly once");
}

#[test]
fn expiry_wins_over_same_tick_collision() {
    let mut round = make_round(config(1));
    run_ticks(&mut round, 59);

    let world = round.world_mut();
    world.hail.clear();
    world.hail.push(Hail {
        x: 100.0,
        y: 100.0,
        size: 20.0,
        speed: 0.0,
    });
    world.projectiles.push(Projectile {
        x: 105.0,
        y: 112.0,
        width: 5.0,
        height: 10.0,
        speed: 7.0,
        drift: 0.0,
    });
    let before = round.world().stats.score;

    assert_eq!(round.tick(idle(), &mut (), &mut ()), Phase::Ended(EndReason::Time));
    assert_eq!(round.world().stats.score, before);
}

#[test]
fn external_timer_ends_round() {
    let mut round = make_round(config(120));
    let mut sink = MemorySink::default();
    round.expire_timer(&mut (), &mut sink);
    assert_eq!(round.phase(), Phase::Ended(EndReason::Time));
    assert_eq!(sink.recorded.len(), 1);

    round.expire_timer(&mut (), &mut sink);
    assert_eq!(sink.recorded.len(), 1);
}

#[test]
fn failing_sink_does_not_abort_the_round() {
    let mut round = make_round(config(120));
    round.expire_timer(&mut (), &mut FailingSink);
    assert_eq!(round.phase(), Phase::Ended(EndReason::Time));
    assert!(round.result().is_some());
}

// ── Score ─────────────────────────────────────────────────────────────────────

#[test]
fn final_score_adds_every_term() {
    let stats = RoundStats {
        score: 40,
        hail_destroyed: 3,
        cloud_drops_destroyed: 2,
        collected: Vec::new(),
    };
    let b = ScoreBreakdown::new(&stats, 4, &Scoring::default());
    assert_eq!(b.hail_points, 30);
    assert_eq!(b.cloud_drop_points, 10);
    assert_eq!(b.corn_points, 200);
    assert_eq!(b.total(), 240);
}

#[test]
fn shooting_hail_reports_score() {
    let mut round = make_round(config(120));
    let mut ui = Recorder::default();
    round.world_mut().hail.push(Hail {
        x: 290.0,
        y: 330.0,
        size: 20.0,
        speed: 0.0,
    });

    round.tick(fire(), &mut ui, &mut ());

    assert_eq!(round.world().stats.hail_destroyed, 1);
    assert_eq!(ui.scores.last(), Some(&10));
}

// ── Firing ────────────────────────────────────────────────────────────────────

#[test]
fn held_fire_obeys_cadence() {
    let mut round = make_round(config(120));
    for _ in 0..3 {
        round.tick(fire(), &mut (), &mut ());
    }
    assert_eq!(round.world().projectiles.len(), 1);

    // The cadence reopens 15 ticks after the first shot.
    for _ in 0..14 {
        round.tick(fire(), &mut (), &mut ());
    }
    assert_eq!(round.world().projectiles.len(), 2);
}

#[test]
fn fresh_press_bypasses_cadence() {
    let mut round = make_round(config(120));
    round.tick(fire(), &mut (), &mut ());
    round.tick(idle(), &mut (), &mut ());
    round.tick(fire(), &mut (), &mut ());
    assert_eq!(round.world().projectiles.len(), 2);
}

#[test]
fn input_tracker_detects_edges() {
    let mut tracker = InputTracker::new();
    assert!(tracker.observe(fire()).fire_pressed);
    let held = tracker.observe(fire());
    assert!(held.fire_held && !held.fire_pressed);
    assert!(!tracker.observe(idle()).fire_held);
    tracker.observe(fire());
    tracker.reset();
    assert!(tracker.observe(fire()).fire_pressed);
}

// ── Difficulty & schedules ────────────────────────────────────────────────────

#[test]
fn difficulty_rises_every_tick() {
    let mut round = make_round(config(120));
    run_ticks(&mut round, 100);
    assert!((round.difficulty() - 1.05).abs() < 1e-9);
}

#[test]
fn hail_starts_falling_after_a_second() {
    let mut round = make_round(config(120));
    run_ticks(&mut round, 59);
    assert!(round.world().hail.is_empty());
    run_ticks(&mut round, 2);
    assert!(!round.world().hail.is_empty());
}

#[test]
fn storm_cloud_rolls_in_on_schedule() {
    let cfg = GameConfig {
        round_secs: 30,
        storm_cloud_at_secs: Some(1),
        ..GameConfig::default()
    };
    let mut round = make_round(cfg);
    run_ticks(&mut round, 59);
    assert!(round.world().cloud.is_none());
    run_ticks(&mut round, 1);
    assert!(round.world().cloud.is_some());

    // Ten seconds later the cloud expires on its own.  Keep the corn
    // standing so the round outlives it.
    for _ in 0..601 {
        for stalk in round.world_mut().corn.iter_mut() {
            stalk.alive = true;
        }
        assert_eq!(round.tick(idle(), &mut (), &mut ()), Phase::Running);
    }
    assert!(round.world().cloud.is_none());
}

#[test]
fn picked_up_cloud_does_not_cut_timed_cloud_short() {
    let cfg = GameConfig {
        round_secs: 30,
        storm_cloud_at_secs: Some(3),
        ..GameConfig::default()
    };
    let mut round = make_round(cfg);
    round
        .world_mut()
        .tokens
        .push(token_on_defender(EffectKind::StormCloud));
    round.tick(idle(), &mut (), &mut ());
    assert!(round.effects().is_active(EffectKind::StormCloud));

    // The timed cloud replaces the picked-up one at 3 s and lasts until 13 s,
    // past the point where the pickup's own entry runs out.
    while round.now_ms() < 12_950.0 {
        revive_corn(&mut round);
        assert_eq!(round.tick(idle(), &mut (), &mut ()), Phase::Running);
        if round.now_ms() > 3_000.0 {
            let cloud = round.world().cloud.as_ref().expect("timed cloud still up");
            assert!((cloud.expires_at - 13_000.0).abs() < 1e-6);
        }
    }
    assert!(!round.effects().is_active(EffectKind::StormCloud));

    for _ in 0..6 {
        revive_corn(&mut round);
        round.tick(idle(), &mut (), &mut ());
    }
    assert!(round.world().cloud.is_none());
}

// ── Corn ──────────────────────────────────────────────────────────────────────

#[test]
fn standing_corn_never_grows_back_on_its_own() {
    let cfg = GameConfig {
        round_secs: 60,
        storm_cloud_at_secs: None,
        token_selection: TokenSelection::weighted(),
        ..GameConfig::default()
    };
    let mut round = make_round(cfg);

    let mut alive = round.world().alive_corn();
    while round.phase() == Phase::Running && round.now_ms() < 40_000.0 {
        round
            .world_mut()
            .tokens
            .retain(|t| t.kind != EffectKind::RecoverCorn);
        round.tick(idle(), &mut (), &mut ());
        let now_alive = round.world().alive_corn();
        assert!(now_alive <= alive, "corn grew from {} to {}", alive, now_alive);
        alive = now_alive;
    }
    assert!(alive < 20, "hail should have reached the corn");
}

#[test]
fn recover_corn_pickup_brings_stalks_back() {
    let mut round = make_round(config(120));
    for stalk in round.world_mut().corn.iter_mut().take(8) {
        stalk.alive = false;
    }
    round
        .world_mut()
        .tokens
        .push(token_on_defender(EffectKind::RecoverCorn));
    assert_eq!(round.world().alive_corn(), 12);

    round.tick(idle(), &mut (), &mut ());

    assert_eq!(round.world().alive_corn(), 17);
}

// ── Resize ────────────────────────────────────────────────────────────────────

#[test]
fn resize_rescales_live_round() {
    let mut round = make_round(config(120));
    round.world_mut().hail.push(Hail {
        x: 100.0,
        y: 100.0,
        size: 20.0,
        speed: 2.0,
    });

    round.resize(300.0, 200.0);

    let world = round.world();
    assert_eq!(world.playfield.scale, 0.5);
    assert_eq!(world.hail[0].size, 10.0);
    assert_eq!(world.hail[0].speed, 1.0);
    assert_eq!(world.defender.width, 25.0);
}

#[test]
fn degenerate_resize_is_ignored() {
    let mut round = make_round(config(120));
    round.resize(0.0, 400.0);
    assert_eq!(round.world().playfield.scale, 1.0);
}

#[test]
fn resize_recovers_a_zero_sized_field() {
    let mut round = Round::new(config(120), 600.0, 0.0, StdRng::seed_from_u64(7));
    assert!(round.start(PlayerInfo::default()));
    assert_eq!(round.world().playfield.scale, 0.0);
    round.world_mut().corn[3].alive = false;

    round.resize(600.0, 400.0);

    let world = round.world();
    assert_eq!(world.playfield.scale, 1.0);
    assert_eq!(world.defender.width, 50.0);
    assert_eq!(world.defender.y, 360.0);
    assert_eq!(world.corn.len(), 20);
    assert_eq!(world.alive_corn(), 19);
    assert!(world.corn.iter().all(|s| s.width.is_finite() && s.width > 0.0));
}

// ── Countdown ─────────────────────────────────────────────────────────────────

#[test]
fn countdown_reports_whole_seconds() {
    let mut countdown = Countdown::new(2, Some(1));
    let mut seconds = Vec::new();
    let mut storms = 0;
    while !countdown.is_expired() {
        let step = countdown.advance();
        seconds.extend(step.second);
        storms += step.storm_due as u32;
    }
    assert_eq!(seconds, vec![1, 0]);
    assert_eq!(storms, 1);
    assert!((countdown.elapsed_ms() - 2000.0).abs() < 1e-6);
}
