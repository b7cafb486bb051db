mod display;

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use hail_defense::config::{GameConfig, CONFIG_FILE};
use hail_defense::constants::TICKS_PER_SECOND;
use hail_defense::input::InputSnapshot;
use hail_defense::leaderboard::Leaderboard;
use hail_defense::round::{Phase, PlayerInfo, Round};

use display::Hud;

const FRAME: Duration = Duration::from_micros(1_000_000 / TICKS_PER_SECOND as u64);

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events.
const HOLD_WINDOW: u64 = 8;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn snapshot(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> InputSnapshot {
    let any = |keys: &[KeyCode]| keys.iter().any(|k| is_held(key_frame, k, frame));
    InputSnapshot {
        left: any(&[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')]),
        right: any(&[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')]),
        fire: any(&[KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')]),
    }
}

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hail_defense", about = "Defend the corn field from a hail storm")]
struct Args {
    /// Name shown on the leaderboard
    #[arg(short, long, default_value = "player")]
    nickname: String,

    /// Organization shown next to the nickname
    #[arg(short, long, default_value = "")]
    organization: String,

    /// Path to the RON config file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Seed the random generator for a reproducible round
    #[arg(long)]
    seed: Option<u64>,
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    player: &PlayerInfo,
    board: &Leaderboard,
) -> std::io::Result<MenuResult> {
    let (cols, rows) = terminal::size()?;
    display::draw_menu(out, player, board, cols, rows)?;

    // Block until the user makes a choice
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            })) => match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit)
                }
                _ => {}
            },
            Ok(Event::Resize(cols, rows)) => display::draw_menu(out, player, board, cols, rows)?,
            Ok(_) => {}
            Err(_) => return Ok(MenuResult::Quit),
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program,  `false` → back to menu.
///
/// Input model: a `key_frame` map records the frame of the last press or
/// repeat event for every key.  Each frame the keys still "fresh" become
/// one `InputSnapshot`, so Space and A/D can be held together.
fn game_loop<W: Write>(
    out: &mut W,
    round: &mut Round<StdRng>,
    board: &mut Leaderboard,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<bool> {
    let (mut cols, mut rows) = terminal::size()?;
    let mut hud = Hud {
        remaining_secs: round.remaining_secs(),
        ..Hud::default()
    };
    let best_before = board.best_for(&round.player().nickname);

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    kind,
                    modifiers,
                    ..
                }) => match kind {
                    KeyEventKind::Press => {
                        key_frame.insert(code, frame);
                        match code {
                            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                                return Ok(true);
                            }
                            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                                return Ok(true);
                            }
                            KeyCode::Char('r') | KeyCode::Char('R') if hud.ended.is_some() => {
                                return Ok(false);
                            }
                            _ => {}
                        }
                    }
                    KeyEventKind::Repeat => {
                        key_frame.insert(code, frame);
                    }
                    KeyEventKind::Release => {
                        key_frame.remove(&code);
                    }
                },
                Event::Resize(c, r) => {
                    cols = c;
                    rows = r;
                    let (w, h) = display::playfield_size(cols, rows);
                    round.resize(w, h);
                }
                _ => {}
            }
        }

        if round.phase() == Phase::Running {
            let input = snapshot(&key_frame, frame);
            round.tick(input, &mut hud, board);
        }

        display::render(out, round, &hud, best_before, cols, rows)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> hail_defense::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = GameConfig::load(&args.config);
    let mut board = Leaderboard::load_or_empty(&config.leaderboard_path, config.leaderboard_size);
    let player = PlayerInfo {
        nickname: args.nickname,
        organization: args.organization,
    };
    log::info!("config: {:?}", config);

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking event reads live on their own thread so the game loop never
    // waits on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, &config, &player, &mut board, args.seed);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.map_err(Into::into)
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &GameConfig,
    player: &PlayerInfo,
    board: &mut Leaderboard,
    seed: Option<u64>,
) -> std::io::Result<()> {
    let mut round_no: u64 = 0;

    loop {
        match show_menu(out, rx, player, board)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                let rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(round_no)),
                    None => StdRng::from_entropy(),
                };
                round_no += 1;

                let (cols, rows) = terminal::size()?;
                let (w, h) = display::playfield_size(cols, rows);
                let mut round = Round::new(config.clone(), w, h, rng);
                round.start(player.clone());

                if game_loop(out, &mut round, board, rx)? {
                    break;
                }
            }
        }
    }
    Ok(())
}
