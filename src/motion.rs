//! Entity motion: per-tick kinematics shared by every moving entity,
//! off-screen culling, and in-place rescaling on resize.

use crate::constants::{
    DEFENDER_Y_OFFSET, DYING_CORN_FADE, DYING_CORN_ROTATION, PARTICLE_FADE, PARTICLE_SHRINK,
    TOKEN_PULSE_STEP, TOKEN_ROTATION_STEP,
};
use crate::entities::{
    CompanionTurret, Defender, DyingCorn, ExplosionRing, Hail, Particle, Playfield, Projectile,
    StormCloud, Token, World,
};
use crate::input::InputFrame;
use crate::spawner::plant_corn;

// ── Falling entities ──────────────────────────────────────────────────────────

/// Anything that drops straight down and leaves through the bottom edge.
pub trait Falling {
    fn fall(&mut self);
    fn is_below(&self, field: &Playfield) -> bool;
}

impl Falling for Hail {
    fn fall(&mut self) {
        self.y += self.speed;
    }

    fn is_below(&self, field: &Playfield) -> bool {
        self.y > field.height + self.size
    }
}

impl Falling for Token {
    fn fall(&mut self) {
        self.y += self.speed;
        self.rotation += TOKEN_ROTATION_STEP;

        if self.pulse_rising {
            self.pulse += TOKEN_PULSE_STEP;
        } else {
            self.pulse -= TOKEN_PULSE_STEP;
        }
        if self.pulse >= 1.0 {
            self.pulse_rising = false;
        }
        if self.pulse <= 0.0 {
            self.pulse_rising = true;
        }
    }

    fn is_below(&self, field: &Playfield) -> bool {
        self.y > field.height + self.size
    }
}

/// Advance every item one tick and drop those that left the playfield.
/// Returns how many were culled.
pub fn advance_falling<T: Falling>(items: &mut Vec<T>, field: &Playfield) -> usize {
    let before = items.len();
    items.retain_mut(|item| {
        item.fall();
        !item.is_below(field)
    });
    before - items.len()
}

// ── Projectiles ───────────────────────────────────────────────────────────────

/// Move bullets up (and sideways for diagonal shots).  Bullets past the top
/// or either side are culled in the same sweep.
pub fn advance_projectiles(bullets: &mut Vec<Projectile>, field: &Playfield) -> usize {
    let before = bullets.len();
    bullets.retain_mut(|b| {
        b.y -= b.speed;
        b.x += b.drift;
        !(b.y < 0.0 || b.x < 0.0 || b.x > field.width)
    });
    before - bullets.len()
}

// ── Drifting entities ─────────────────────────────────────────────────────────

/// Horizontal velocity after an edge check.  The sign flips only while the
/// entity is at or past an edge *and* still heading into it, so a single
/// crossing inverts it exactly once.
pub fn bounce(x: f64, width: f64, speed_x: f64, field_width: f64) -> f64 {
    if (x <= 0.0 && speed_x < 0.0) || (x + width >= field_width && speed_x > 0.0) {
        -speed_x
    } else {
        speed_x
    }
}

pub fn advance_cloud(cloud: &mut StormCloud, field: &Playfield) {
    cloud.x += cloud.speed_x;
    cloud.speed_x = bounce(cloud.x, cloud.width, cloud.speed_x, field.width);
    advance_falling(&mut cloud.drops, field);
}

pub fn advance_turret(turret: &mut CompanionTurret, field: &Playfield) {
    turret.x += turret.speed_x;
    turret.speed_x = bounce(turret.x, turret.width, turret.speed_x, field.width);
    advance_projectiles(&mut turret.bullets, field);
}

/// Grow the ring and fade it.  Returns `false` once it is spent.
pub fn advance_ring(ring: &mut ExplosionRing, now: f64) -> bool {
    let progress = (now - ring.started_at) / ring.duration_ms;
    ring.radius += ring.speed;
    ring.alpha = (1.0 - progress).max(0.0);
    ring.radius < ring.max_radius && progress < 1.0
}

// ── Defender ──────────────────────────────────────────────────────────────────

/// Move the defender by one step per held direction.  It may hang a third
/// of its width past the left edge and two thirds past the right one.
pub fn move_defender(defender: &mut Defender, input: &InputFrame, field: &Playfield) {
    if input.left && defender.x > -defender.width / 3.0 {
        defender.x -= defender.speed;
    }
    if input.right && defender.x < field.width - defender.width * 2.0 / 3.0 {
        defender.x += defender.speed;
    }
}

// ── Visuals ───────────────────────────────────────────────────────────────────

pub fn advance_particles(particles: &mut Vec<Particle>) {
    particles.retain_mut(|p| {
        p.x += p.vx;
        p.y += p.vy;
        p.alpha -= PARTICLE_FADE;
        p.size *= PARTICLE_SHRINK;
        p.alpha > 0.0
    });
}

pub fn advance_dying_corn(dying: &mut Vec<DyingCorn>) {
    dying.retain_mut(|corn| {
        corn.alpha -= DYING_CORN_FADE;
        corn.rotation += DYING_CORN_ROTATION;
        corn.alpha > 0.0
    });
}

// ── Resize ────────────────────────────────────────────────────────────────────

/// Rescale every entity in place for a new playfield.  Sizes and speeds
/// follow the scale-factor ratio; positions follow the width/height ratios
/// so entities keep their relative place on screen.  Corn slots are laid out
/// again with their alive flags preserved.
pub fn rescale(world: &mut World, field: Playfield) {
    let old = world.playfield;
    let k = field.scale / old.scale;
    let kx = field.width / old.width;
    let ky = field.height / old.height;

    let d = &mut world.defender;
    d.width *= k;
    d.height *= k;
    d.speed *= k;
    d.x *= kx;
    d.y = field.height - d.height - DEFENDER_Y_OFFSET * field.scale;

    for b in world.projectiles.iter_mut() {
        rescale_projectile(b, k, kx, ky);
    }
    for h in world.hail.iter_mut() {
        rescale_hail(h, k, kx, ky);
    }
    for t in world.tokens.iter_mut() {
        t.x *= kx;
        t.y *= ky;
        t.size *= k;
        t.speed *= k;
    }
    for p in world.particles.iter_mut() {
        p.x *= kx;
        p.y *= ky;
        p.size *= k;
        p.vx *= k;
        p.vy *= k;
    }
    for corn in world.dying_corn.iter_mut() {
        corn.x *= kx;
        corn.y *= ky;
        corn.width *= kx;
        corn.height *= k;
    }

    if let Some(cloud) = world.cloud.as_mut() {
        cloud.x *= kx;
        cloud.y *= ky;
        cloud.width *= k;
        cloud.height *= k;
        cloud.speed_x *= k;
        for drop in cloud.drops.iter_mut() {
            rescale_hail(drop, k, kx, ky);
        }
    }
    if let Some(turret) = world.turret.as_mut() {
        turret.x *= kx;
        turret.y *= ky;
        turret.width *= k;
        turret.height *= k;
        turret.speed_x *= k;
        for b in turret.bullets.iter_mut() {
            rescale_projectile(b, k, kx, ky);
        }
    }
    if let Some(ring) = world.ring.as_mut() {
        ring.x *= kx;
        ring.y *= ky;
        ring.radius *= k;
        ring.speed *= k;
        ring.max_radius *= k;
    }

    let alive: Vec<bool> = world.corn.iter().map(|stalk| stalk.alive).collect();
    world.corn = plant_corn(&field, alive.len());
    for (stalk, was_alive) in world.corn.iter_mut().zip(alive) {
        stalk.alive = was_alive;
    }

    world.playfield = field;
}

fn rescale_hail(h: &mut Hail, k: f64, kx: f64, ky: f64) {
    h.x *= kx;
    h.y *= ky;
    h.size *= k;
    h.speed *= k;
}

fn rescale_projectile(b: &mut Projectile, k: f64, kx: f64, ky: f64) {
    b.x *= kx;
    b.y *= ky;
    b.width *= k;
    b.height *= k;
    b.speed *= k;
    b.drift *= k;
}
