use hail_defense::entities::*;
use hail_defense::input::InputFrame;
use hail_defense::motion::*;
use hail_defense::spawner::new_world;

fn field() -> Playfield {
    Playfield::new(600.0, 400.0)
}

fn hail_at(x: f64, y: f64) -> Hail {
    Hail {
        x,
        y,
        size: 20.0,
        speed: 2.0,
    }
}

fn bullet_at(x: f64, y: f64) -> Projectile {
    Projectile {
        x,
        y,
        width: 5.0,
        height: 10.0,
        speed: 7.0,
        drift: 0.0,
    }
}

fn held(left: bool, right: bool) -> InputFrame {
    InputFrame {
        left,
        right,
        ..InputFrame::default()
    }
}

// ── Playfield ─────────────────────────────────────────────────────────────────

#[test]
fn scale_is_the_tighter_axis() {
    assert_eq!(Playfield::new(600.0, 400.0).scale, 1.0);
    assert_eq!(Playfield::new(1200.0, 400.0).scale, 1.0);
    assert_eq!(Playfield::new(300.0, 400.0).scale, 0.5);
}

// ── Falling ───────────────────────────────────────────────────────────────────

#[test]
fn hail_falls_by_its_speed() {
    let mut hail = vec![hail_at(100.0, 50.0)];
    let culled = advance_falling(&mut hail, &field());
    assert_eq!(culled, 0);
    assert_eq!(hail[0].y, 52.0);
    assert_eq!(hail[0].x, 100.0);
}

#[test]
fn hail_culled_only_once_fully_below() {
    // Culled when y > height + size, i.e. past 420.
    let mut hail = vec![hail_at(0.0, 417.0), hail_at(0.0, 419.0)];
    let culled = advance_falling(&mut hail, &field());
    assert_eq!(culled, 1);
    assert_eq!(hail.len(), 1);
    assert_eq!(hail[0].y, 419.0);
}

#[test]
fn token_spins_and_pulses_while_falling() {
    let mut tokens = vec![Token {
        x: 0.0,
        y: 0.0,
        size: 30.0,
        speed: 2.0,
        kind: EffectKind::RapidFire,
        rotation: 0.0,
        pulse: 0.98,
        pulse_rising: true,
    }];
    advance_falling(&mut tokens, &field());
    let t = &tokens[0];
    assert_eq!(t.y, 2.0);
    assert!((t.rotation - 0.02).abs() < 1e-9);
    assert!(!t.pulse_rising, "pulse turns around at the top");
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[test]
fn bullets_move_up_and_cull_above_top() {
    let mut bullets = vec![bullet_at(100.0, 50.0), bullet_at(100.0, 5.0)];
    let culled = advance_projectiles(&mut bullets, &field());
    assert_eq!(culled, 1);
    assert_eq!(bullets[0].y, 43.0);
}

#[test]
fn diagonal_bullets_cull_at_side_edges() {
    let mut left = bullet_at(1.0, 200.0);
    left.drift = -2.0;
    let mut right = bullet_at(599.0, 200.0);
    right.drift = 2.0;
    let mut bullets = vec![left, right];
    advance_projectiles(&mut bullets, &field());
    assert!(bullets.is_empty());
}

// ── Bounce ────────────────────────────────────────────────────────────────────

#[test]
fn bounce_flips_when_heading_into_edge() {
    assert_eq!(bounce(-1.0, 100.0, -1.0, 600.0), 1.0);
    assert_eq!(bounce(501.0, 100.0, 1.0, 600.0), -1.0);
}

#[test]
fn bounce_does_not_flip_back_while_leaving_edge() {
    assert_eq!(bounce(-1.0, 100.0, 1.0, 600.0), 1.0);
    assert_eq!(bounce(501.0, 100.0, -1.0, 600.0), -1.0);
    assert_eq!(bounce(250.0, 100.0, 1.0, 600.0), 1.0);
}

#[test]
fn cloud_stays_inside_after_crossing_edge() {
    let mut world = new_world(&field(), 20);
    world.cloud = Some(StormCloud {
        x: 0.5,
        y: 50.0,
        width: 120.0,
        height: 60.0,
        speed_x: -1.0,
        last_drop_ms: None,
        drops: Vec::new(),
        expires_at: 10_000.0,
    });
    let f = field();
    let cloud = world.cloud.as_mut().unwrap();
    advance_cloud(cloud, &f);
    assert_eq!(cloud.speed_x, 1.0);
    advance_cloud(cloud, &f);
    assert_eq!(cloud.speed_x, 1.0, "no second flip on the way back");
    assert!(cloud.x > 0.0);
}

// ── Defender ──────────────────────────────────────────────────────────────────

#[test]
fn defender_moves_by_speed() {
    let world = new_world(&field(), 20);
    let mut d = world.defender.clone();
    let x0 = d.x;
    move_defender(&mut d, &held(true, false), &field());
    assert_eq!(d.x, x0 - 5.0);
    move_defender(&mut d, &held(false, true), &field());
    assert_eq!(d.x, x0);
}

#[test]
fn defender_may_hang_a_third_past_left_edge() {
    let world = new_world(&field(), 20);
    let mut d = world.defender.clone();
    d.x = -d.width / 3.0;
    move_defender(&mut d, &held(true, false), &field());
    assert_eq!(d.x, -d.width / 3.0, "already at the limit");

    d.x = 0.0;
    move_defender(&mut d, &held(true, false), &field());
    assert_eq!(d.x, -5.0);
}

#[test]
fn defender_may_hang_two_thirds_past_right_edge() {
    let world = new_world(&field(), 20);
    let mut d = world.defender.clone();
    let limit = 600.0 - d.width * 2.0 / 3.0;
    d.x = limit;
    move_defender(&mut d, &held(false, true), &field());
    assert_eq!(d.x, limit);
}

// ── Ring & visuals ────────────────────────────────────────────────────────────

#[test]
fn ring_grows_then_expires_after_duration() {
    let mut ring = ExplosionRing {
        x: 300.0,
        y: 350.0,
        radius: 10.0,
        max_radius: 900.0,
        speed: 12.0,
        started_at: 0.0,
        duration_ms: 1000.0,
        alpha: 1.0,
    };
    assert!(advance_ring(&mut ring, 500.0));
    assert_eq!(ring.radius, 22.0);
    assert!((ring.alpha - 0.5).abs() < 1e-9);
    assert!(!advance_ring(&mut ring, 1000.0));
}

#[test]
fn ring_expires_at_max_radius() {
    let mut ring = ExplosionRing {
        x: 0.0,
        y: 0.0,
        radius: 95.0,
        max_radius: 100.0,
        speed: 12.0,
        started_at: 0.0,
        duration_ms: 1000.0,
        alpha: 1.0,
    };
    assert!(!advance_ring(&mut ring, 16.0));
}

#[test]
fn particles_fade_out() {
    let mut particles = vec![Particle {
        x: 0.0,
        y: 0.0,
        size: 2.0,
        vx: 1.0,
        vy: -1.0,
        alpha: 0.05,
        tint: ParticleTint::Hail,
    }];
    advance_particles(&mut particles);
    assert_eq!(particles.len(), 1);
    assert_eq!(particles[0].x, 1.0);
    advance_particles(&mut particles);
    assert!(particles.is_empty());
}

#[test]
fn dying_corn_tilts_and_fades() {
    let mut dying = vec![DyingCorn {
        x: 0.0,
        y: 360.0,
        width: 28.0,
        height: 40.0,
        alpha: 1.0,
        rotation: 0.0,
    }];
    advance_dying_corn(&mut dying);
    assert!((dying[0].alpha - 0.99).abs() < 1e-9);
    assert!((dying[0].rotation - 0.01).abs() < 1e-9);
}

// ── Resize ────────────────────────────────────────────────────────────────────

#[test]
fn resize_halves_sizes_and_speeds() {
    let mut world = new_world(&field(), 20);
    world.hail.push(hail_at(100.0, 100.0));

    rescale(&mut world, Playfield::new(300.0, 200.0));

    assert_eq!(world.playfield.scale, 0.5);
    let h = &world.hail[0];
    assert_eq!(h.size, 10.0);
    assert_eq!(h.speed, 1.0);
    assert_eq!(h.x, 50.0);
    assert_eq!(h.y, 50.0);

    assert_eq!(world.defender.width, 25.0);
    assert_eq!(world.defender.speed, 2.5);
}

#[test]
fn resize_keeps_defender_on_bottom_edge() {
    let mut world = new_world(&field(), 20);
    rescale(&mut world, Playfield::new(300.0, 200.0));
    let d = &world.defender;
    // height 15, offset 5
    assert_eq!(d.y, 200.0 - 15.0 - 5.0);
}

#[test]
fn resize_relays_corn_keeping_alive_flags() {
    let mut world = new_world(&field(), 20);
    world.corn[3].alive = false;
    world.corn[7].alive = false;

    rescale(&mut world, Playfield::new(300.0, 200.0));

    assert_eq!(world.corn.len(), 20);
    assert!(!world.corn[3].alive);
    assert!(!world.corn[7].alive);
    assert_eq!(world.alive_corn(), 18);
    assert_eq!(world.corn[1].x, 15.0);
    assert_eq!(world.corn[0].y, 200.0 - 20.0);
}
