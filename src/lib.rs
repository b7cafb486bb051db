//! Hail Defense: shoot down falling hail before it flattens the corn.
//!
//! The simulation is frame-independent of any terminal; `Round` advances
//! one fixed tick per call and draws through the `Renderer` trait.

pub mod collision;
pub mod config;
pub mod constants;
pub mod effects;
pub mod entities;
pub mod error;
pub mod input;
pub mod leaderboard;
pub mod motion;
pub mod render;
pub mod round;
pub mod spawner;

pub use config::{GameConfig, Scoring, TokenSelection};
pub use entities::{EffectKind, Playfield, World};
pub use error::{Error, Result};
pub use input::InputSnapshot;
pub use leaderboard::{Leaderboard, ScoreRecord};
pub use round::{
    EndReason, Phase, PlayerInfo, Round, RoundObserver, RoundResult, ScoreBreakdown, ScoreSink,
};
