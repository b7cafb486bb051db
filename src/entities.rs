//! All game entity types. Plain data, no game rules.
//!
//! Positions are the top-left corner of the entity's bounding box, in
//! playfield pixels with `y` growing downward.  Speeds are pixels per tick.

use crate::constants::{BASE_HEIGHT, BASE_WIDTH};

// ── Playfield ─────────────────────────────────────────────────────────────────

/// Current playfield size and the uniform scale factor derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playfield {
    pub width: f64,
    pub height: f64,
    /// `min(width / BASE_WIDTH, height / BASE_HEIGHT)`.
    pub scale: f64,
}

impl Playfield {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale: (width / BASE_WIDTH).min(height / BASE_HEIGHT),
        }
    }
}

// ── Tokens & effects ──────────────────────────────────────────────────────────

/// Every bonus/malus a falling token can carry.  Durations, polarity and
/// revert behaviour live in the table in `effects`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Halves the defender's fire cadence.
    RapidFire,
    /// Two extra bullets at ¼ and ¾ of the defender width.
    ParallelBullets,
    /// Two extra bullets drifting left and right.
    DiagonalBullets,
    SpeedUp,
    /// Instantly revives a handful of dead stalks.
    RecoverCorn,
    /// A small cart that drives along the bottom and fires on its own.
    CompanionTurret,
    /// An expanding ring that destroys hail on its leading edge.
    Explosion,
    SlowDown,
    /// A cloud that drifts across the top and drops its own hail.
    StormCloud,
}

/// A falling bonus/malus pickup.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed: f64,
    pub kind: EffectKind,
    /// Decorative spin, radians.
    pub rotation: f64,
    /// Decorative pulse phase in `[0, 1]`.
    pub pulse: f64,
    pub pulse_rising: bool,
}

/// One pickup, kept for the end-of-round recap.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedEffect {
    pub kind: EffectKind,
    pub at_ms: f64,
}

// ── Defender & projectiles ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Defender {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
    /// Minimum delay between two shots while fire is held.
    pub fire_cadence_ms: f64,
    pub last_fire_ms: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Upward speed.
    pub speed: f64,
    /// Horizontal drift per tick (negative = leftward).
    pub drift: f64,
}

// ── Hail & corn ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Hail {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed: f64,
}

/// Hail dropped by a storm cloud.  Same shape and motion as regular hail;
/// it is scored and counted separately.
pub type CloudDrop = Hail;

/// A corn stalk occupies a fixed slot for the whole round; only `alive`
/// changes.
#[derive(Clone, Debug, PartialEq)]
pub struct CornStalk {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub alive: bool,
}

// ── Special entities ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct StormCloud {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub speed_x: f64,
    pub last_drop_ms: Option<f64>,
    pub drops: Vec<CloudDrop>,
    pub expires_at: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompanionTurret {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub speed_x: f64,
    pub fire_cadence_ms: f64,
    pub last_fire_ms: Option<f64>,
    pub bullets: Vec<Projectile>,
    pub expires_at: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExplosionRing {
    /// Centre.
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub max_radius: f64,
    /// Radius growth per tick.
    pub speed: f64,
    pub started_at: f64,
    pub duration_ms: f64,
    /// Fades from 1 to 0 over the ring's lifetime.
    pub alpha: f64,
}

// ── Visual side effects ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleTint {
    Hail,
    CloudDrop,
}

/// Shard flying off a destroyed hail unit or cloud drop.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Centre.
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub vx: f64,
    pub vy: f64,
    pub alpha: f64,
    pub tint: ParticleTint,
}

/// A stalk wilting after a hit: fades out while tilting over.
#[derive(Clone, Debug, PartialEq)]
pub struct DyingCorn {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub alpha: f64,
    pub rotation: f64,
}

// ── Session counters ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundStats {
    /// Running in-round score (hail and cloud drop points only).
    pub score: u32,
    pub hail_destroyed: u32,
    pub cloud_drops_destroyed: u32,
    pub collected: Vec<CollectedEffect>,
}

// ── Master round state ────────────────────────────────────────────────────────

/// Every entity collection of one round.  Owned by the round controller and
/// lent to the motion, spawn, effect and collision passes each tick.
#[derive(Clone, Debug)]
pub struct World {
    pub playfield: Playfield,
    pub defender: Defender,
    pub projectiles: Vec<Projectile>,
    pub hail: Vec<Hail>,
    pub corn: Vec<CornStalk>,
    pub tokens: Vec<Token>,
    pub cloud: Option<StormCloud>,
    pub turret: Option<CompanionTurret>,
    pub ring: Option<ExplosionRing>,
    pub particles: Vec<Particle>,
    pub dying_corn: Vec<DyingCorn>,
    pub stats: RoundStats,
}

impl World {
    pub fn alive_corn(&self) -> usize {
        self.corn.iter().filter(|stalk| stalk.alive).count()
    }

    pub fn all_corn_dead(&self) -> bool {
        self.alive_corn() == 0
    }
}
