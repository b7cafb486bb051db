//! Status effects: what each token kind does on pickup, which effects are
//! currently running, and the revert that runs when the last instance of a
//! kind runs out.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{
    CORN_RECOVER_COUNT, DEFENDER_SPEED, FIRE_CADENCE_MS, SLOW_DOWN_FACTOR, SPEED_UP_FACTOR,
};
use crate::entities::{CollectedEffect, CornStalk, EffectKind, World};
use crate::spawner::{new_explosion_ring, new_storm_cloud, new_turret};

// ── Effect table ──────────────────────────────────────────────────────────────

/// How a timed effect is undone once no instance of its kind is left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revert {
    FireCadence,
    MoveSpeed,
    DespawnTurret,
}

impl EffectKind {
    /// Every kind, in the order the sequential token selection walks them.
    pub const ALL: [EffectKind; 9] = [
        EffectKind::RapidFire,
        EffectKind::ParallelBullets,
        EffectKind::DiagonalBullets,
        EffectKind::SpeedUp,
        EffectKind::RecoverCorn,
        EffectKind::CompanionTurret,
        EffectKind::Explosion,
        EffectKind::SlowDown,
        EffectKind::StormCloud,
    ];

    pub fn is_bonus(self) -> bool {
        !matches!(self, EffectKind::SlowDown | EffectKind::StormCloud)
    }

    /// How long the effect stays registered.  `None` for instant effects.
    pub fn duration_ms(self) -> Option<f64> {
        match self {
            EffectKind::RapidFire => Some(15_000.0),
            EffectKind::ParallelBullets => Some(12_000.0),
            EffectKind::DiagonalBullets => Some(12_000.0),
            EffectKind::SpeedUp => Some(10_000.0),
            EffectKind::CompanionTurret => Some(15_000.0),
            EffectKind::SlowDown => Some(8_000.0),
            EffectKind::StormCloud => Some(10_000.0),
            EffectKind::RecoverCorn | EffectKind::Explosion => None,
        }
    }

    pub fn revert(self) -> Option<Revert> {
        match self {
            EffectKind::RapidFire => Some(Revert::FireCadence),
            EffectKind::SpeedUp | EffectKind::SlowDown => Some(Revert::MoveSpeed),
            EffectKind::CompanionTurret => Some(Revert::DespawnTurret),
            EffectKind::ParallelBullets
            | EffectKind::DiagonalBullets
            | EffectKind::RecoverCorn
            | EffectKind::Explosion
            | EffectKind::StormCloud => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectKind::RapidFire => "Rapid Fire",
            EffectKind::ParallelBullets => "Parallel Shots",
            EffectKind::DiagonalBullets => "Diagonal Shots",
            EffectKind::SpeedUp => "Speed Up",
            EffectKind::RecoverCorn => "Recover Corn",
            EffectKind::CompanionTurret => "Robot Cart",
            EffectKind::Explosion => "Explosion",
            EffectKind::SlowDown => "Slow Down",
            EffectKind::StormCloud => "Storm Cloud",
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub expires_at: f64,
}

#[derive(Clone, Debug, Default)]
pub struct EffectRegistry {
    active: Vec<ActiveEffect>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[ActiveEffect] {
        &self.active
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    /// Time left on the latest-expiring instance of `kind`.
    pub fn remaining_ms(&self, kind: EffectKind, now: f64) -> Option<f64> {
        self.active
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (e.expires_at - now).max(0.0))
            .reduce(f64::max)
    }

    /// Apply a picked-up token to the world.  Timed kinds are registered
    /// until `now + duration`.
    pub fn apply(&mut self, kind: EffectKind, world: &mut World, now: f64, rng: &mut impl Rng) {
        world.stats.collected.push(CollectedEffect { kind, at_ms: now });
        let scale = world.playfield.scale;

        match kind {
            EffectKind::RapidFire => {
                world.defender.fire_cadence_ms = FIRE_CADENCE_MS / 2.0;
            }
            EffectKind::ParallelBullets | EffectKind::DiagonalBullets => {}
            EffectKind::SpeedUp => {
                world.defender.speed = DEFENDER_SPEED * SPEED_UP_FACTOR * scale;
            }
            EffectKind::SlowDown => {
                world.defender.speed = DEFENDER_SPEED * SLOW_DOWN_FACTOR * scale;
            }
            EffectKind::RecoverCorn => {
                let revived = recover_corn(&mut world.corn, CORN_RECOVER_COUNT, rng);
                log::debug!("recovered {} corn stalks", revived);
            }
            EffectKind::CompanionTurret => {
                let duration = kind.duration_ms().unwrap_or_default();
                world.turret = Some(new_turret(&world.defender, scale, now, duration));
            }
            EffectKind::Explosion => {
                world.ring = Some(new_explosion_ring(&world.defender, &world.playfield, now));
            }
            EffectKind::StormCloud => {
                let duration = kind.duration_ms().unwrap_or_default();
                world.cloud = Some(new_storm_cloud(&world.playfield, now, duration, rng));
            }
        }

        if let Some(duration) = kind.duration_ms() {
            self.active.push(ActiveEffect {
                kind,
                expires_at: now + duration,
            });
        }
        log::info!("effect applied: {}", kind.label());
    }

    /// Remove every entry that expired before `now`.  Returns the reverts
    /// owed: one per kind whose last instance just went away, never one per
    /// instance.
    pub fn expire(&mut self, now: f64) -> Vec<Revert> {
        let mut ended: Vec<EffectKind> = Vec::new();
        self.active.retain(|e| {
            if now > e.expires_at {
                if !ended.contains(&e.kind) {
                    ended.push(e.kind);
                }
                false
            } else {
                true
            }
        });

        ended
            .into_iter()
            .filter(|kind| !self.is_active(*kind))
            .filter_map(|kind| kind.revert())
            .collect()
    }

    /// Expire effects and run their reverts on the world.
    pub fn tick(&mut self, now: f64, world: &mut World) -> Vec<Revert> {
        let reverts = self.expire(now);
        for revert in &reverts {
            self.restore(*revert, world);
            log::debug!("effect reverted: {:?}", revert);
        }
        reverts
    }

    /// Undo one effect.  Move speed falls back to whichever speed effect is
    /// still running, so a lapsing malus does not cancel a live bonus.
    fn restore(&self, revert: Revert, world: &mut World) {
        let scale = world.playfield.scale;
        match revert {
            Revert::FireCadence => world.defender.fire_cadence_ms = FIRE_CADENCE_MS,
            Revert::MoveSpeed => {
                let factor = if self.is_active(EffectKind::SpeedUp) {
                    SPEED_UP_FACTOR
                } else if self.is_active(EffectKind::SlowDown) {
                    SLOW_DOWN_FACTOR
                } else {
                    1.0
                };
                world.defender.speed = DEFENDER_SPEED * factor * scale;
            }
            Revert::DespawnTurret => world.turret = None,
        }
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// Revive up to `count` dead stalks, picked at random without
/// replacement.  Returns how many came back.
pub fn recover_corn(corn: &mut [CornStalk], count: usize, rng: &mut impl Rng) -> usize {
    let mut dead: Vec<usize> = corn
        .iter()
        .enumerate()
        .filter(|(_, stalk)| !stalk.alive)
        .map(|(i, _)| i)
        .collect();
    dead.shuffle(rng);

    let revived = count.min(dead.len());
    for &i in &dead[..revived] {
        corn[i].alive = true;
    }
    revived
}
