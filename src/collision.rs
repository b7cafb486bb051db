//! Collision resolution.  Runs the pairwise checks in a fixed order; each
//! check removes what it hits before the next one looks, so later checks
//! see collections already shrunk by earlier ones.

use rand::Rng;

use crate::config::Scoring;
use crate::constants::RING_BAND_WIDTH;
use crate::effects::EffectRegistry;
use crate::entities::{
    CornStalk, Defender, DyingCorn, ExplosionRing, Hail, Particle, ParticleTint, Projectile,
    RoundStats, Token, World,
};
use crate::spawner::shatter;

// ── Primitive tests ───────────────────────────────────────────────────────────

/// Axis-aligned bounding-box overlap of `(x, y, w, h)` boxes.
pub fn boxes_overlap(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
    a.0 < b.0 + b.2 && a.0 + a.2 > b.0 && a.1 < b.1 + b.3 && a.1 + a.3 > b.1
}

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (ax - bx).hypot(ay - by)
}

pub fn bullet_hits(bullet: &Projectile, hail: &Hail) -> bool {
    boxes_overlap(
        (bullet.x, bullet.y, bullet.width, bullet.height),
        (hail.x, hail.y, hail.size, hail.size),
    )
}

/// Token pickup: centre distance under the sum of radii.  The defender's
/// radius is the mean of its half-extents.
pub fn token_touches(token: &Token, defender: &Defender) -> bool {
    let token_r = token.size / 2.0;
    let defender_r = (defender.width + defender.height) / 4.0;
    let d = distance(
        token.x + token_r,
        token.y + token_r,
        defender.x + defender.width / 2.0,
        defender.y + defender.height / 2.0,
    );
    d < token_r + defender_r
}

/// Hail hits a stalk when its horizontal centre is over the stalk and its
/// bottom is below the stalk's top.  Narrower than a box overlap on purpose.
pub fn hail_strikes(hail: &Hail, stalk: &CornStalk) -> bool {
    let cx = hail.x + hail.size / 2.0;
    cx > stalk.x && cx < stalk.x + stalk.width && hail.y + hail.size > stalk.y
}

/// Only the ring's leading band destroys: `radius - band <= d <= radius`.
pub fn ring_catches(ring: &ExplosionRing, hail: &Hail, scale: f64) -> bool {
    let d = distance(ring.x, ring.y, hail.x + hail.size / 2.0, hail.y + hail.size / 2.0);
    let band_low = ring.radius - RING_BAND_WIDTH * scale;
    band_low <= d && d <= ring.radius
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// What one resolution pass destroyed or triggered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hits {
    pub hail: u32,
    pub cloud_drops: u32,
    pub tokens: u32,
    pub corn_lost: u32,
}

/// Run every collision check for this tick, in order:
/// bullets ↔ hail/drops, turret bullets ↔ hail/drops, tokens ↔ defender,
/// hail ↔ corn, drops ↔ corn, ring ↔ hail/drops.
pub fn resolve(
    world: &mut World,
    effects: &mut EffectRegistry,
    scoring: &Scoring,
    now: f64,
    rng: &mut impl Rng,
) -> Hits {
    let mut hits = Hits::default();
    let scale = world.playfield.scale;

    {
        let World {
            projectiles,
            hail,
            cloud,
            turret,
            particles,
            stats,
            ..
        } = world;

        let mut targets = Targets {
            hail,
            drops: cloud.as_mut().map(|c| &mut c.drops),
            particles,
            stats,
            scoring,
            scale,
        };
        targets.shoot_down(projectiles, &mut hits, rng);
        if let Some(turret) = turret.as_mut() {
            targets.shoot_down(&mut turret.bullets, &mut hits, rng);
        }
    }

    collect_tokens(world, effects, now, &mut hits, rng);

    {
        let World {
            hail,
            corn,
            cloud,
            dying_corn,
            ..
        } = world;
        hits.corn_lost += strike_corn(hail, corn, dying_corn);
        if let Some(cloud) = cloud.as_mut() {
            hits.corn_lost += strike_corn(&mut cloud.drops, corn, dying_corn);
        }
    }

    sweep_ring(world, scoring, &mut hits, rng);
    hits
}

/// The collections a bullet pool can hit, borrowed out of the world.
struct Targets<'a> {
    hail: &'a mut Vec<Hail>,
    drops: Option<&'a mut Vec<Hail>>,
    particles: &'a mut Vec<Particle>,
    stats: &'a mut RoundStats,
    scoring: &'a Scoring,
    scale: f64,
}

impl Targets<'_> {
    /// Each bullet hits at most one target: the first hail unit in order,
    /// else the first cloud drop.  A hit consumes both.
    fn shoot_down(&mut self, bullets: &mut Vec<Projectile>, hits: &mut Hits, rng: &mut impl Rng) {
        let mut i = 0;
        while i < bullets.len() {
            let bullet = &bullets[i];

            if let Some(j) = self.hail.iter().position(|h| bullet_hits(bullet, h)) {
                let hail = self.hail.remove(j);
                bullets.remove(i);
                shatter(self.particles, &hail, ParticleTint::Hail, self.scale, rng);
                self.stats.score += self.scoring.hail_points;
                self.stats.hail_destroyed += 1;
                hits.hail += 1;
                continue;
            }

            if let Some(drops) = self.drops.as_deref_mut() {
                if let Some(j) = drops.iter().position(|d| bullet_hits(bullet, d)) {
                    let drop = drops.remove(j);
                    bullets.remove(i);
                    shatter(self.particles, &drop, ParticleTint::CloudDrop, self.scale, rng);
                    self.stats.score += self.scoring.cloud_drop_points;
                    self.stats.cloud_drops_destroyed += 1;
                    hits.cloud_drops += 1;
                    continue;
                }
            }

            i += 1;
        }
    }
}

fn collect_tokens(
    world: &mut World,
    effects: &mut EffectRegistry,
    now: f64,
    hits: &mut Hits,
    rng: &mut impl Rng,
) {
    let mut i = 0;
    while i < world.tokens.len() {
        if token_touches(&world.tokens[i], &world.defender) {
            let token = world.tokens.remove(i);
            effects.apply(token.kind, world, now, rng);
            hits.tokens += 1;
        } else {
            i += 1;
        }
    }
}

/// Each falling unit kills at most one live stalk and is consumed by it.
/// Dead stalks are skipped.
fn strike_corn(falling: &mut Vec<Hail>, corn: &mut [CornStalk], dying: &mut Vec<DyingCorn>) -> u32 {
    let mut lost = 0;
    falling.retain(|hail| {
        let Some(stalk) = corn.iter_mut().find(|s| s.alive && hail_strikes(hail, s)) else {
            return true;
        };
        stalk.alive = false;
        dying.push(DyingCorn {
            x: stalk.x,
            y: stalk.y,
            width: stalk.width,
            height: stalk.height,
            alpha: 1.0,
            rotation: 0.0,
        });
        lost += 1;
        false
    });
    lost
}

/// Sweep the ring's leading band over hail and cloud drops, walking each
/// collection backwards so removals don't skip neighbours.
fn sweep_ring(world: &mut World, scoring: &Scoring, hits: &mut Hits, rng: &mut impl Rng) {
    let Some(ring) = world.ring.as_ref() else {
        return;
    };
    let scale = world.playfield.scale;

    for i in (0..world.hail.len()).rev() {
        if ring_catches(ring, &world.hail[i], scale) {
            let hail = world.hail.remove(i);
            shatter(&mut world.particles, &hail, ParticleTint::Hail, scale, rng);
            world.stats.score += scoring.hail_points;
            world.stats.hail_destroyed += 1;
            hits.hail += 1;
        }
    }

    if let Some(cloud) = world.cloud.as_mut() {
        for i in (0..cloud.drops.len()).rev() {
            if ring_catches(ring, &cloud.drops[i], scale) {
                let drop = cloud.drops.remove(i);
                shatter(&mut world.particles, &drop, ParticleTint::CloudDrop, scale, rng);
                world.stats.score += scoring.cloud_drop_points;
                world.stats.cloud_drops_destroyed += 1;
                hits.cloud_drops += 1;
            }
        }
    }
}
