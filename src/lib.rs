//! Star Barrage - a wave-based vertical space shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, AI, collisions, level director)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `highscores`: Leaderboard and aggregate statistics
//!
//! Rendering, audio playback and asset loading are external collaborators:
//! the simulation consumes a [`sim::TickInput`] snapshot each tick and
//! produces [`sim::GameEvent`]s plus a [`sim::RenderSnapshot`] for them.

pub mod highscores;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::{GameStats, HighScores};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Playfield dimensions. +y points down, (0, 0) is the top-left corner.
    pub const FIELD_WIDTH: f32 = 900.0;
    pub const FIELD_HEIGHT: f32 = 700.0;
    /// Projectiles live a little past the field edge before despawning
    pub const OFFSCREEN_MARGIN: f32 = 50.0;

    /// Player kinematics (units/second)
    pub const PLAYER_ACCEL: f32 = 1800.0;
    /// Velocity fraction shed per tick while no directional input is held
    pub const PLAYER_FRICTION: f32 = 0.1;
    pub const PLAYER_LIVES: u32 = 3;
    /// Post-hit protection window
    pub const HIT_PROTECTION_MS: f32 = 1000.0;

    /// Projectile defaults
    pub const BULLET_SPEED: f32 = 600.0;
    pub const BULLET_LIFETIME_TICKS: u32 = 300;
    pub const FIRE_INTERVAL_FLOOR_MS: f32 = 100.0;

    /// Enemy baselines, scaled per kind and per level
    pub const ENEMY_BASE_HEALTH: i32 = 2;
    pub const ENEMY_BASE_SPEED: f32 = 120.0;
    pub const ENEMY_SPAWN_INTERVAL_MS: f32 = 2000.0;
    pub const SPAWN_INTERVAL_FLOOR_MS: f32 = 500.0;
    pub const MAX_CONCURRENT_ENEMIES: usize = 15;

    /// Boss pacing
    pub const BOSS_ENTRY_Y: f32 = 50.0;
    pub const BOSS_PATTERN_MS: f32 = 5000.0;
    pub const BOSS_PATTERN_FLOOR_MS: f32 = 2000.0;
    pub const BOSS_FIRE_INTERVAL_MS: f32 = 1000.0;
    pub const BOSS_FIRE_FLOOR_MS: f32 = 300.0;
    pub const MINION_COOLDOWN_MS: f32 = 8000.0;

    /// Level pacing
    pub const LEVEL_TIME_MS: f32 = 60_000.0;
    /// Kill fraction of the wave budget that triggers the boss
    pub const BOSS_KILL_FRACTION: f32 = 0.8;
    pub const POWERUP_ROLL_MS: f32 = 5000.0;
    pub const POWERUP_TTL_MS: f32 = 10_000.0;

    /// Uniform grid cell size for collision pruning
    pub const GRID_CELL: f32 = 100.0;

    /// Visual particle cap
    pub const MAX_PARTICLES: usize = 256;
}

/// Linear interpolation
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Quadratic ease-in-out over t in [0, 1]
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 { 2.0 * t * t } else { -1.0 + (4.0 - 2.0 * t) * t }
}

/// Quadratic ease-out over t in [0, 1]
#[inline]
pub fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Unit vector from `from` toward `to`.
///
/// When the points coincide the direction is undefined; falls back to
/// straight down (the natural heading for everything hostile here).
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let d = to - from;
    if d.length_squared() < 1e-6 {
        Vec2::Y
    } else {
        d.normalize()
    }
}

/// Pick an entry from a weighted table.
///
/// Weights need not sum to 1. An empty table is a caller bug; a table whose
/// weights are all zero falls back to the first entry.
pub fn weighted_choice<'a, T>(rng: &mut impl rand::Rng, choices: &'a [(T, f32)]) -> &'a T {
    let total: f32 = choices.iter().map(|(_, w)| w).sum();
    let mut r = rng.random_range(0.0..total.max(f32::MIN_POSITIVE));
    for (choice, weight) in choices {
        if r <= *weight {
            return choice;
        }
        r -= weight;
    }
    &choices[0].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 10.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(2.0, 10.0, 0.5), 6.0);
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        // Ease-out front-loads the motion
        assert!(ease_out(0.5) > 0.5);
    }

    #[test]
    fn test_direction_to_degenerate() {
        // Coincident points must not produce NaN - defined fallback is down
        let d = direction_to(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        assert_eq!(d, Vec2::Y);
    }

    #[test]
    fn test_direction_to_unit_length() {
        let d = direction_to(Vec2::ZERO, Vec2::new(30.0, -40.0));
        assert!((d.length() - 1.0).abs() < 1e-5);
        assert!(d.x > 0.0 && d.y < 0.0);
    }

    #[test]
    fn test_weighted_choice_respects_weights() {
        use rand::SeedableRng;
        let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
        let table = [("common", 1.0), ("never", 0.0)];
        for _ in 0..100 {
            assert_eq!(*weighted_choice(&mut rng, &table), "common");
        }
    }
}
