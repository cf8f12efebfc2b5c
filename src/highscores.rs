//! High score leaderboard and lifetime statistics
//!
//! The display-only side of the persistence collaborator: the simulation
//! emits a [`RunSummary`] when a run ends, this module folds it into
//! aggregate stats, checks achievement triggers, and keeps the top-10 board.
//! None of it feeds back into simulation behavior.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::SessionStats;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Everything a finished run reports to the progression layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    pub level_reached: u32,
    pub duration_s: f32,
    pub stats: SessionStats,
    /// Achievement triggers for this run
    pub perfect_level_cleared: bool,
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Unix timestamp (s) when achieved; stamped by the driver
    pub timestamp: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a new score (if it qualifies). Returns the 1-indexed rank
    /// achieved, or None.
    pub fn add_score(&mut self, score: u64, level: u32, timestamp: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let entry = HighScoreEntry { score, level, timestamp };
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// Lifetime aggregate statistics across every run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub games_played: u32,
    pub total_score: u64,
    pub enemies_killed: u64,
    pub bosses_defeated: u32,
    pub powerups_collected: u32,
    pub levels_completed: u32,
    pub perfect_levels: u32,
    pub highest_level: u32,
    pub shots_fired: u64,
    pub shots_hit: u64,
    pub total_time_played_s: f64,
}

/// Lifetime achievement flags, derived from the aggregates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Achievements {
    pub first_kill: bool,
    pub exterminator: bool,
    pub first_boss: bool,
    pub boss_hunter: bool,
    pub collector: bool,
    pub perfectionist: bool,
}

impl GameStats {
    /// Fold one finished run into the lifetime aggregates
    pub fn record_run(&mut self, run: &RunSummary) {
        self.games_played += 1;
        self.total_score += run.score;
        self.enemies_killed += run.stats.enemies_killed as u64;
        self.bosses_defeated += run.stats.bosses_defeated;
        self.powerups_collected += run.stats.powerups_collected;
        self.levels_completed += run.stats.levels_completed;
        if run.perfect_level_cleared {
            self.perfect_levels += 1;
        }
        self.highest_level = self.highest_level.max(run.level_reached);
        self.shots_fired += run.stats.shots_fired as u64;
        self.shots_hit += run.stats.shots_hit as u64;
        self.total_time_played_s += run.duration_s as f64;
    }

    pub fn accuracy(&self) -> f64 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f64 / self.shots_fired as f64
        }
    }

    pub fn achievements(&self) -> Achievements {
        Achievements {
            first_kill: self.enemies_killed >= 1,
            exterminator: self.enemies_killed >= 1000,
            first_boss: self.bosses_defeated >= 1,
            boss_hunter: self.bosses_defeated >= 10,
            collector: self.powerups_collected >= 100,
            perfectionist: self.perfect_levels >= 1,
        }
    }
}

/// Combined persistence envelope saved between sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveData {
    pub highscores: HighScores,
    pub stats: GameStats,
}

impl SaveData {
    /// Load from a JSON file; any failure yields a fresh save
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    log::info!("loaded save data from {}", path.display());
                    data
                }
                Err(err) => {
                    log::warn!("save file {} unreadable ({err}), starting fresh", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(err) = std::fs::write(path, json) {
                    log::warn!("could not save to {}: {err}", path.display());
                }
            }
            Err(err) => log::warn!("could not serialize save data: {err}"),
        }
    }
}
