//! Rendering layer: all terminal I/O lives here.
//!
//! The round works in playfield pixels; the painter maps them onto
//! terminal cells, `PX_PER_COL` pixels per column and `PX_PER_ROW` per
//! row.  Row 0 is the HUD and the last row is the controls hint.

use std::io::{self, Write};

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use rand::Rng;

use hail_defense::effects::EffectRegistry;
use hail_defense::entities::{
    CloudDrop, CompanionTurret, CornStalk, Defender, DyingCorn, EffectKind, ExplosionRing, Hail,
    Particle, ParticleTint, Projectile, StormCloud, Token,
};
use hail_defense::leaderboard::Leaderboard;
use hail_defense::render::Renderer;
use hail_defense::round::{EndReason, PlayerInfo, Round, RoundObserver, RoundResult, ScoreBreakdown};

pub const PX_PER_COL: f64 = 10.0;
pub const PX_PER_ROW: f64 = 20.0;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_TIME: Color = Color::Cyan;
const C_HUD_CORN: Color = Color::Green;
const C_CORN: Color = Color::Green;
const C_CORN_TOP: Color = Color::Yellow;
const C_DYING: Color = Color::DarkYellow;
const C_DEFENDER: Color = Color::White;
const C_BULLET: Color = Color::Cyan;
const C_HAIL: Color = Color::White;
const C_DROP: Color = Color::Blue;
const C_CLOUD: Color = Color::DarkGrey;
const C_TURRET: Color = Color::Magenta;
const C_RING: Color = Color::Yellow;
const C_BONUS: Color = Color::Yellow;
const C_MALUS: Color = Color::Red;
const C_HINT: Color = Color::DarkGrey;

/// Playfield size, in pixels, for a terminal of `cols × rows` cells.
pub fn playfield_size(cols: u16, rows: u16) -> (f64, f64) {
    (
        cols as f64 * PX_PER_COL,
        rows.saturating_sub(2) as f64 * PX_PER_ROW,
    )
}

// ── HUD state ─────────────────────────────────────────────────────────────────

/// What the round reports back through its observer hooks.
#[derive(Debug, Default)]
pub struct Hud {
    pub score: u32,
    pub remaining_secs: u32,
    pub ended: Option<(EndReason, ScoreBreakdown)>,
}

impl RoundObserver for Hud {
    fn on_score_changed(&mut self, score: u32) {
        self.score = score;
    }

    fn on_countdown(&mut self, remaining_secs: u32) {
        self.remaining_secs = remaining_secs;
    }

    fn on_round_end(&mut self, reason: EndReason, breakdown: &ScoreBreakdown) {
        self.ended = Some((reason, *breakdown));
    }
}

// ── Painter ───────────────────────────────────────────────────────────────────

/// `Renderer` over a crossterm writer.  Draw calls can't fail, so the first
/// I/O error is kept and returned by `finish`.
pub struct TerminalPainter<'a, W: Write> {
    out: &'a mut W,
    cols: u16,
    rows: u16,
    error: Option<io::Error>,
}

impl<'a, W: Write> TerminalPainter<'a, W> {
    pub fn new(out: &'a mut W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            cols,
            rows,
            error: None,
        }
    }

    pub fn finish(self) -> io::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Cell under a playfield point, if it lies inside the play area.
    fn cell(&self, x: f64, y: f64) -> Option<(u16, u16)> {
        let col = (x / PX_PER_COL).floor();
        let row = (y / PX_PER_ROW).floor() + 1.0;
        let bottom = self.rows.saturating_sub(1) as f64;
        if col < 0.0 || col >= self.cols as f64 || row < 1.0 || row >= bottom {
            return None;
        }
        Some((col as u16, row as u16))
    }

    fn put(&mut self, x: f64, y: f64, glyph: &str, color: Color) {
        if self.error.is_some() {
            return;
        }
        let Some((col, row)) = self.cell(x, y) else {
            return;
        };
        let result = self
            .out
            .queue(cursor::MoveTo(col, row))
            .and_then(|o| o.queue(style::SetForegroundColor(color)))
            .and_then(|o| o.queue(Print(glyph)))
            .map(|_| ());
        if let Err(e) = result {
            self.error = Some(e);
        }
    }

    /// Paint every cell a pixel box touches.  A box smaller than a cell
    /// still gets one.
    fn fill(&mut self, x: f64, y: f64, w: f64, h: f64, glyph: &str, color: Color) {
        let cols = (w / PX_PER_COL).ceil().max(1.0) as usize;
        let rows = (h / PX_PER_ROW).ceil().max(1.0) as usize;
        for r in 0..rows {
            for c in 0..cols {
                self.put(
                    x + c as f64 * PX_PER_COL,
                    y + r as f64 * PX_PER_ROW,
                    glyph,
                    color,
                );
            }
        }
    }
}

fn token_glyph(kind: EffectKind) -> &'static str {
    match kind {
        EffectKind::RapidFire => "!",
        EffectKind::ParallelBullets => "=",
        EffectKind::DiagonalBullets => "V",
        EffectKind::SpeedUp => "»",
        EffectKind::RecoverCorn => "+",
        EffectKind::CompanionTurret => "T",
        EffectKind::Explosion => "✸",
        EffectKind::SlowDown => "«",
        EffectKind::StormCloud => "☁",
    }
}

impl<W: Write> Renderer for TerminalPainter<'_, W> {
    fn clear(&mut self) {
        if let Err(e) = self.out.queue(terminal::Clear(terminal::ClearType::All)) {
            self.error = Some(e);
        }
    }

    fn draw_corn(&mut self, stalk: &CornStalk) {
        self.fill(stalk.x, stalk.y, stalk.width, stalk.height, "║", C_CORN);
        self.fill(stalk.x, stalk.y, stalk.width, 1.0, "ψ", C_CORN_TOP);
    }

    fn draw_dying_corn(&mut self, corn: &DyingCorn) {
        let glyph = if corn.rotation < 0.3 { "╲" } else { "_" };
        let color = if corn.alpha > 0.4 { C_DYING } else { Color::DarkGrey };
        self.fill(corn.x, corn.y + corn.height / 2.0, corn.width, 1.0, glyph, color);
    }

    fn draw_defender(&mut self, defender: &Defender) {
        self.fill(defender.x, defender.y, defender.width, defender.height, "█", C_DEFENDER);
        self.put(defender.x + defender.width / 2.0, defender.y - 1.0, "▲", C_DEFENDER);
    }

    fn draw_projectile(&mut self, bullet: &Projectile) {
        let glyph = if bullet.drift < 0.0 {
            "╲"
        } else if bullet.drift > 0.0 {
            "╱"
        } else {
            "│"
        };
        self.put(bullet.x + bullet.width / 2.0, bullet.y, glyph, C_BULLET);
    }

    fn draw_hail(&mut self, hail: &Hail) {
        let half = hail.size / 2.0;
        self.put(hail.x + half, hail.y + half, "●", C_HAIL);
    }

    fn draw_token(&mut self, token: &Token) {
        let color = if token.kind.is_bonus() { C_BONUS } else { C_MALUS };
        let half = token.size / 2.0;
        self.put(token.x + half, token.y + half, token_glyph(token.kind), color);
    }

    fn draw_cloud(&mut self, cloud: &StormCloud) {
        self.fill(cloud.x, cloud.y, cloud.width, cloud.height, "▓", C_CLOUD);
    }

    fn draw_cloud_drop(&mut self, drop: &CloudDrop) {
        let half = drop.size / 2.0;
        self.put(drop.x + half, drop.y + half, "•", C_DROP);
    }

    fn draw_turret(&mut self, turret: &CompanionTurret) {
        self.fill(turret.x, turret.y, turret.width, turret.height, "▄", C_TURRET);
    }

    fn draw_ring(&mut self, ring: &ExplosionRing) {
        const STEPS: usize = 48;
        for i in 0..STEPS {
            let angle = i as f64 / STEPS as f64 * std::f64::consts::TAU;
            let x = ring.x + ring.radius * angle.cos();
            let y = ring.y + ring.radius * angle.sin();
            self.put(x, y, "∘", C_RING);
        }
    }

    fn draw_particle(&mut self, particle: &Particle) {
        if particle.alpha < 0.2 {
            return;
        }
        let color = match particle.tint {
            ParticleTint::Hail => C_HAIL,
            ParticleTint::CloudDrop => C_DROP,
        };
        self.put(particle.x, particle.y, "·", color);
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// Render one complete frame: playfield, HUD, hint, and the end overlay
/// once the round is over.
pub fn render<W: Write, R: Rng>(
    out: &mut W,
    round: &Round<R>,
    hud: &Hud,
    best: Option<u32>,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    {
        let mut painter = TerminalPainter::new(out, cols, rows);
        round.draw(&mut painter);
        painter.finish()?;
    }

    draw_hud(out, round, hud, cols)?;
    draw_controls_hint(out, rows)?;

    if let Some(result) = round.result() {
        draw_round_over(out, result, best, cols, rows)?;
    }

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn effect_tags(effects: &EffectRegistry, now: f64) -> String {
    let mut tags = String::new();
    for kind in EffectKind::ALL {
        if let Some(ms) = effects.remaining_ms(kind, now) {
            tags.push_str(&format!("[{} {:>2}s] ", kind.label(), (ms / 1000.0).ceil() as u32));
        }
    }
    tags
}

fn draw_hud<W: Write, R: Rng>(
    out: &mut W,
    round: &Round<R>,
    hud: &Hud,
    cols: u16,
) -> io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score:{:>6}", hud.score)))?;

    out.queue(style::SetForegroundColor(C_HUD_TIME))?;
    out.queue(Print(format!("  Time:{:>4}s", hud.remaining_secs)))?;

    out.queue(style::SetForegroundColor(C_HUD_CORN))?;
    out.queue(Print(format!("  Corn:{:>3}", round.world().alive_corn())))?;

    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(format!("  x{:.2}", round.difficulty())))?;

    let tags = effect_tags(round.effects(), round.now_ms());
    if !tags.is_empty() {
        let x = cols.saturating_sub(tags.chars().count() as u16 + 1);
        out.queue(cursor::MoveTo(x, 0))?;
        out.queue(style::SetForegroundColor(C_BONUS))?;
        out.queue(Print(&tags))?;
    }
    Ok(())
}

fn draw_controls_hint<W: Write>(out: &mut W, rows: u16) -> io::Result<()> {
    out.queue(cursor::MoveTo(1, rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("← → / A D : Move   SPACE : Shoot   Q : Quit"))?;
    Ok(())
}

// ── Round-over overlay ────────────────────────────────────────────────────────

fn centred<W: Write>(out: &mut W, cx: u16, row: u16, text: &str, color: Color) -> io::Result<()> {
    let col = cx.saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

/// Only a strictly higher score beats the previous best.
fn best_line(best: Option<u32>, total: u32) -> String {
    match best {
        Some(best) if best < total => format!("★ NEW BEST: {:>6} ★", total),
        Some(best) => format!("Best Score:  {:>6}", best),
        None => String::new(),
    }
}

fn draw_round_over<W: Write>(
    out: &mut W,
    result: &RoundResult,
    best: Option<u32>,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    let b = &result.breakdown;
    let title = match result.reason {
        EndReason::Time => "║   TIME'S UP!       ║",
        EndReason::Corn => "║   CORN DESTROYED   ║",
    };
    let lines: Vec<(String, Color)> = vec![
        ("╔════════════════════╗".to_string(), Color::Red),
        (title.to_string(), Color::Red),
        ("╚════════════════════╝".to_string(), Color::Red),
        (
            format!("Hail      {:>4}  {:>6} pts", b.hail_destroyed, b.hail_points),
            Color::White,
        ),
        (
            format!(
                "Drops     {:>4}  {:>6} pts",
                b.cloud_drops_destroyed, b.cloud_drop_points
            ),
            Color::White,
        ),
        (
            format!("Corn left {:>4}  {:>6} pts", b.corn_alive, b.corn_points),
            Color::Green,
        ),
        (format!("Final Score: {:>6}", b.total()), Color::Yellow),
        (best_line(best, b.total()), Color::DarkGrey),
        ("R - Play Again  Q - Quit".to_string(), Color::White),
    ];

    let cx = cols / 2;
    let start = (rows / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (text, color)) in lines.iter().enumerate() {
        centred(out, cx, start + i as u16, text, *color)?;
    }
    Ok(())
}

// ── Menu ──────────────────────────────────────────────────────────────────────

pub fn draw_menu<W: Write>(
    out: &mut W,
    player: &PlayerInfo,
    board: &Leaderboard,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let cx = cols / 2;
    let cy = rows / 2;
    let top = cy.saturating_sub(9);

    centred(out, cx, top, "❄  HAIL  DEFENSE  ❄", Color::Cyan)?;
    let who = if player.organization.is_empty() {
        format!("Player: {}", player.nickname)
    } else {
        format!("Player: {} ({})", player.nickname, player.organization)
    };
    centred(out, cx, top + 1, &who, Color::White)?;

    centred(out, cx, top + 3, "── Top Scores ──", Color::Yellow)?;
    if board.records().is_empty() {
        centred(out, cx, top + 4, "no scores yet", Color::DarkGrey)?;
    }
    for (i, record) in board.records().iter().enumerate() {
        let line = format!("{:>2}. {:<12} {:>6}", i + 1, record.nickname, record.score);
        centred(out, cx, top + 4 + i as u16, &line, Color::White)?;
    }

    let legend_row = top + 5 + board.records().len().max(1) as u16;
    centred(out, cx, legend_row, "Catch tokens: yellow helps, red hurts", C_HINT)?;
    centred(out, cx, legend_row + 2, "ENTER / SPACE : Start   Q : Quit", C_HINT)?;

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}
