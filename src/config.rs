//! Round configuration.  Loaded from `hail_defense.ron` at startup; every
//! field falls back to the tuning constants when absent.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CLOUD_DROP_POINTS, CORN_COUNT, CORN_POINTS, HAIL_POINTS, ROUND_SECS,
    TOKEN_BONUS_PROBABILITY,
};
use crate::error::Result;

pub const CONFIG_FILE: &str = "hail_defense.ron";

/// How the spawner picks the kind of the next token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TokenSelection {
    /// Walk the full kind list in order, wrapping around.
    Sequential,
    /// Roll bonus vs malus first, then a uniform kind inside that pool.
    Weighted { bonus_probability: f64 },
}

impl TokenSelection {
    pub fn weighted() -> Self {
        TokenSelection::Weighted {
            bonus_probability: TOKEN_BONUS_PROBABILITY,
        }
    }
}

/// Points awarded per destroyed hail unit, per destroyed cloud drop and per
/// stalk still alive when the round ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    pub hail_points: u32,
    pub cloud_drop_points: u32,
    pub corn_points: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            hail_points: HAIL_POINTS,
            cloud_drop_points: CLOUD_DROP_POINTS,
            corn_points: CORN_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Round length in seconds.
    #[serde(default = "default_round_secs")]
    pub round_secs: u32,
    #[serde(default)]
    pub scoring: Scoring,
    #[serde(default = "default_corn_count")]
    pub corn_count: usize,
    #[serde(default = "default_token_selection")]
    pub token_selection: TokenSelection,
    /// Elapsed seconds at which a storm cloud rolls in regardless of
    /// pickups.  `None` disables it.
    #[serde(default = "default_storm_cloud_at")]
    pub storm_cloud_at_secs: Option<u32>,
    #[serde(default = "default_leaderboard_path")]
    pub leaderboard_path: PathBuf,
    /// Number of records the leaderboard keeps.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

fn default_round_secs() -> u32 {
    ROUND_SECS
}
fn default_corn_count() -> usize {
    CORN_COUNT
}
fn default_token_selection() -> TokenSelection {
    TokenSelection::Sequential
}
fn default_storm_cloud_at() -> Option<u32> {
    Some(60)
}
fn default_leaderboard_path() -> PathBuf {
    PathBuf::from("hail_defense_scores.json")
}
fn default_leaderboard_size() -> usize {
    10
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_secs: default_round_secs(),
            scoring: Scoring::default(),
            corn_count: default_corn_count(),
            token_selection: default_token_selection(),
            storm_cloud_at_secs: default_storm_cloud_at(),
            leaderboard_path: default_leaderboard_path(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

impl GameConfig {
    /// Load config from `path`.  A missing or invalid file yields the
    /// defaults; an invalid one is logged.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_ron(&data)
    }

    pub fn from_ron(data: &str) -> Result<Self> {
        Ok(ron::from_str(data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let s = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, s)?;
        Ok(())
    }

    pub fn round_ms(&self) -> f64 {
        self.round_secs as f64 * 1000.0
    }
}
