//! Data-driven game balance
//!
//! Every number a designer might want to retune lives here rather than in
//! code: the score table, power-up durations, damage values. The simulation
//! treats a [`Tuning`] as read-only input; defaults match the shipped
//! balance and a full table can be loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::sim::entity::EnemyKind;

/// Points awarded per kill / pickup / clear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTable {
    pub enemy_basic: u64,
    pub enemy_fast: u64,
    pub enemy_heavy: u64,
    pub enemy_shooter: u64,
    pub enemy_kamikaze: u64,
    /// Multiplied by the boss's level
    pub boss: u64,
    pub powerup: u64,
    pub level_complete: u64,
    /// Extra bonus for a zero-damage level
    pub perfect_level: u64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            enemy_basic: 10,
            enemy_fast: 15,
            enemy_heavy: 25,
            enemy_shooter: 20,
            enemy_kamikaze: 30,
            boss: 500,
            powerup: 5,
            level_complete: 1000,
            perfect_level: 2000,
        }
    }
}

impl ScoreTable {
    pub fn enemy(&self, kind: EnemyKind) -> u64 {
        match kind {
            EnemyKind::Basic => self.enemy_basic,
            EnemyKind::Fast => self.enemy_fast,
            EnemyKind::Heavy => self.enemy_heavy,
            EnemyKind::Shooter => self.enemy_shooter,
            EnemyKind::Kamikaze => self.enemy_kamikaze,
        }
    }
}

/// Timed power-up durations, milliseconds of sim time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpDurations {
    pub shield_ms: f32,
    pub gun_upgrade_ms: f32,
    pub speed_boost_ms: f32,
    pub rapid_fire_ms: f32,
}

impl Default for PowerUpDurations {
    fn default() -> Self {
        Self {
            shield_ms: 5000.0,
            gun_upgrade_ms: 10_000.0,
            speed_boost_ms: 10_000.0,
            rapid_fire_ms: 8000.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    pub score: ScoreTable,
    pub durations: PowerUpDurations,
    /// Ramming damage from an enemy ship
    pub collision_damage: i32,
    /// Default hostile bullet damage
    pub enemy_shot_damage: i32,
    /// Boss hit points are this times the level number
    pub boss_base_health: i32,
    /// Wave budget: base + per_level * (level - 1)
    pub enemies_per_level_base: u32,
    pub enemies_per_level_step: u32,
    /// Speed power-up multiplier
    pub speed_boost_factor: f32,
    /// Health power-up heal amount
    pub heal_amount: i32,
    /// Base chance of a power-up drop per roll, plus a per-level bonus
    pub powerup_chance: f32,
    pub powerup_chance_per_level: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            score: ScoreTable::default(),
            durations: PowerUpDurations::default(),
            collision_damage: 25,
            enemy_shot_damage: 10,
            boss_base_health: 50,
            enemies_per_level_base: 15,
            enemies_per_level_step: 5,
            speed_boost_factor: 1.5,
            heal_amount: 25,
            powerup_chance: 0.1,
            powerup_chance_per_level: 0.02,
        }
    }
}

impl Tuning {
    /// Total enemies the director will spawn before the boss
    pub fn enemies_for_level(&self, level: u32) -> u32 {
        self.enemies_per_level_base + self.enemies_per_level_step * level.saturating_sub(1)
    }

    /// Parse a tuning table from JSON, e.g. loaded by the driver
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
