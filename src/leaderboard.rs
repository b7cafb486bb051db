//! Local high-score table, persisted as JSON next to the binary.  Best
//! score first; ties keep the older record ahead.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::round::{PlayerInfo, ScoreSink};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub nickname: String,
    #[serde(default)]
    pub organization: String,
    pub score: u32,
    /// Unix seconds.
    pub recorded_at: u64,
}

#[derive(Clone, Debug)]
pub struct Leaderboard {
    path: Option<PathBuf>,
    capacity: usize,
    records: Vec<ScoreRecord>,
}

impl Leaderboard {
    /// An empty, in-memory table.
    pub fn new(capacity: usize) -> Self {
        Self {
            path: None,
            capacity,
            records: Vec::new(),
        }
    }

    /// Read the table at `path`.  A missing file is an empty table; every
    /// later `record_score` writes back to `path`.
    pub fn load(path: &Path, capacity: usize) -> Result<Self> {
        let mut board = Self::new(capacity);
        board.path = Some(path.to_path_buf());
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let records: Vec<ScoreRecord> = serde_json::from_str(&data)?;
            for record in records {
                board.insert(record);
            }
        }
        Ok(board)
    }

    /// Like `load`, but a corrupt file is logged and replaced by an empty
    /// table.
    pub fn load_or_empty(path: &Path, capacity: usize) -> Self {
        Self::load(path, capacity).unwrap_or_else(|e| {
            log::warn!("Could not read leaderboard {:?}: {}", path, e);
            let mut board = Self::new(capacity);
            board.path = Some(path.to_path_buf());
            board
        })
    }

    /// Insert in rank order and drop whatever falls past capacity.  Returns
    /// the 0-based rank, or `None` when the record did not make the table.
    pub fn insert(&mut self, record: ScoreRecord) -> Option<usize> {
        let rank = self
            .records
            .iter()
            .position(|r| record.score > r.score)
            .unwrap_or(self.records.len());
        if rank >= self.capacity {
            return None;
        }
        self.records.insert(rank, record);
        self.records.truncate(self.capacity);
        Some(rank)
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    /// Highest score recorded under `nickname`, ignoring case.
    pub fn best_for(&self, nickname: &str) -> Option<u32> {
        let wanted = nickname.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.nickname.to_lowercase() == wanted)
            .map(|r| r.score)
            .max()
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl ScoreSink for Leaderboard {
    fn record_score(&mut self, player: &PlayerInfo, score: u32) -> Result<()> {
        let rank = self.insert(ScoreRecord {
            nickname: player.nickname.clone(),
            organization: player.organization.clone(),
            score,
            recorded_at: unix_now(),
        });
        match rank {
            Some(rank) => log::info!("{} placed #{} with {}", player.nickname, rank + 1, score),
            None => log::debug!("{} did not make the table", score),
        }
        self.save()
    }
}
