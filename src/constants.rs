//! Tuning constants, expressed at the 600×400 reference playfield.
//!
//! Every size and speed here is multiplied by the playfield scale factor
//! when an entity is created.  Speeds are in pixels per tick; times are in
//! milliseconds of simulated round time.

// ── Playfield & clock ─────────────────────────────────────────────────────────

pub const BASE_WIDTH: f64 = 600.0;
pub const BASE_HEIGHT: f64 = 400.0;

/// Simulation rate.
pub const TICKS_PER_SECOND: u32 = 60;
/// Duration of one tick in milliseconds.
pub const TICK_MS: f64 = 1000.0 / TICKS_PER_SECOND as f64;

pub const ROUND_SECS: u32 = 120;

// ── Difficulty ────────────────────────────────────────────────────────────────

/// Added to the difficulty multiplier once per tick.
pub const DIFFICULTY_INCREASE_RATE: f64 = 0.0005;
/// Hail speed never exceeds this multiple of the scale factor.
pub const MAX_SPEED_MULTIPLIER: f64 = 1.6;

// ── Defender ──────────────────────────────────────────────────────────────────

pub const DEFENDER_WIDTH: f64 = 50.0;
pub const DEFENDER_HEIGHT: f64 = 30.0;
pub const DEFENDER_SPEED: f64 = 5.0;
/// Gap between the defender's wheels and the bottom edge.
pub const DEFENDER_Y_OFFSET: f64 = 10.0;
/// Cannon height; bullets leave from its tip.
pub const CANNON_HEIGHT: f64 = 10.0;
/// Minimum delay between two held-fire shots.
pub const FIRE_CADENCE_MS: f64 = 250.0;

pub const SPEED_UP_FACTOR: f64 = 1.5;
pub const SLOW_DOWN_FACTOR: f64 = 0.5;

// ── Projectiles ───────────────────────────────────────────────────────────────

pub const BULLET_WIDTH: f64 = 5.0;
pub const BULLET_HEIGHT: f64 = 10.0;
pub const BULLET_SPEED: f64 = 7.0;
pub const DIAGONAL_SPEED_MULTIPLIER: f64 = 0.9;
pub const DIAGONAL_DRIFT: f64 = 2.0;

// ── Hail ──────────────────────────────────────────────────────────────────────

pub const HAIL_MIN_SIZE: f64 = 20.0;
pub const HAIL_SIZE_RANGE: f64 = 5.0;
pub const HAIL_POINTS: u32 = 10;

pub const HAIL_START_INTERVAL_MS: f64 = 1000.0;
pub const HAIL_MIN_INTERVAL_MS: f64 = 300.0;
pub const HAIL_INTERVAL_REDUCTION_MS: f64 = 100.0;
/// A re-derived hail interval only replaces the scheduled one past this drift.
pub const HAIL_RESCHEDULE_THRESHOLD_MS: f64 = 10.0;

/// Extra-hail probability curve: `min(BASE + (d - 1) * SLOPE, MAX)`.
pub const EXTRA_HAIL_BASE_PROBABILITY: f64 = 0.3;
pub const EXTRA_HAIL_PROBABILITY_SLOPE: f64 = 0.25;
pub const EXTRA_HAIL_MAX_PROBABILITY: f64 = 0.8;

/// `(difficulty threshold, probability reduction, max delay ms)` for each
/// extra unit beyond the first.
pub const EXTRA_HAIL_TIERS: [(f64, f64, f64); 3] = [
    (0.0, 0.0, 300.0),
    (1.2, 0.2, 500.0),
    (1.5, 0.4, 700.0),
];

// ── Corn ──────────────────────────────────────────────────────────────────────

pub const CORN_COUNT: usize = 20;
pub const CORN_HEIGHT: f64 = 40.0;
/// Horizontal gap between neighbouring stalks, unscaled.
pub const CORN_GAP: f64 = 2.0;
pub const CORN_POINTS: u32 = 50;
pub const CORN_RECOVER_COUNT: usize = 5;

// ── Tokens ────────────────────────────────────────────────────────────────────

pub const TOKEN_SIZE: f64 = 30.0;
pub const TOKEN_SPEED: f64 = 2.0;
pub const TOKEN_START_INTERVAL_MS: f64 = 10_000.0;
pub const TOKEN_MIN_INTERVAL_MS: f64 = 4_000.0;
pub const TOKEN_BONUS_PROBABILITY: f64 = 0.7;
pub const TOKEN_ROTATION_STEP: f64 = 0.02;
pub const TOKEN_PULSE_STEP: f64 = 0.05;

// ── Storm cloud ───────────────────────────────────────────────────────────────

pub const CLOUD_WIDTH: f64 = 120.0;
pub const CLOUD_HEIGHT: f64 = 60.0;
pub const CLOUD_Y: f64 = 50.0;
pub const CLOUD_SPEED: f64 = 1.0;
pub const CLOUD_DROP_INTERVAL_MS: f64 = 400.0;
pub const CLOUD_DROP_MIN_SIZE: f64 = 8.0;
pub const CLOUD_DROP_MAX_SIZE: f64 = 14.0;
pub const CLOUD_DROP_SPEED: f64 = 3.0;
pub const CLOUD_DROP_POINTS: u32 = 5;

// ── Companion turret ──────────────────────────────────────────────────────────

pub const TURRET_WIDTH: f64 = 30.0;
pub const TURRET_HEIGHT: f64 = 20.0;
pub const TURRET_SPEED: f64 = 2.0;

// ── Explosion ring ────────────────────────────────────────────────────────────

pub const RING_START_RADIUS: f64 = 10.0;
pub const RING_SPEED: f64 = 12.0;
/// Width of the destructive leading edge, unscaled.
pub const RING_BAND_WIDTH: f64 = 15.0;
pub const RING_DURATION_MS: f64 = 1000.0;
/// Max radius as a multiple of the larger playfield dimension.
pub const RING_MAX_RADIUS_FACTOR: f64 = 1.5;

// ── Visuals ───────────────────────────────────────────────────────────────────

pub const PARTICLES_PER_SIZE: f64 = 1.5;
pub const PARTICLE_FADE: f64 = 0.025;
pub const PARTICLE_SHRINK: f64 = 0.98;
pub const DYING_CORN_FADE: f64 = 0.01;
pub const DYING_CORN_ROTATION: f64 = 0.01;
