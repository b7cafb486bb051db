//! Drawing collaborator.  The round walks its entities once per frame and
//! hands each one to a `Renderer`; nothing drawn feeds back into the
//! simulation.

use crate::entities::{
    CloudDrop, CompanionTurret, CornStalk, Defender, DyingCorn, ExplosionRing, Hail, Particle,
    Projectile, StormCloud, Token,
};

/// Every method defaults to a no-op so a renderer only implements what it
/// can show.
pub trait Renderer {
    fn clear(&mut self) {}
    fn draw_corn(&mut self, _stalk: &CornStalk) {}
    fn draw_dying_corn(&mut self, _corn: &DyingCorn) {}
    fn draw_defender(&mut self, _defender: &Defender) {}
    fn draw_projectile(&mut self, _bullet: &Projectile) {}
    fn draw_hail(&mut self, _hail: &Hail) {}
    fn draw_token(&mut self, _token: &Token) {}
    fn draw_cloud(&mut self, _cloud: &StormCloud) {}
    fn draw_cloud_drop(&mut self, _drop: &CloudDrop) {}
    fn draw_turret(&mut self, _turret: &CompanionTurret) {}
    fn draw_ring(&mut self, _ring: &ExplosionRing) {}
    fn draw_particle(&mut self, _particle: &Particle) {}
}
