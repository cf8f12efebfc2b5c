//! Level and wave direction
//!
//! A state machine that paces each level: spawn enemies at a level-scaled
//! cadence while under budget, hand over to the boss when enough of the wave
//! is down (or the clock runs out), and declare the level complete only when
//! the boss dies. Difficulty multipliers are pure functions of the level
//! number, so a given level always plays at the same strength.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::EnemyKind;
use crate::consts::*;
use crate::tuning::Tuning;

/// Visual theme, cycled per level and handed to the renderer untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelTheme {
    Space,
    Nebula,
    Asteroid,
    Cyber,
    Solar,
}

impl LevelTheme {
    pub fn for_level(level: u32) -> Self {
        match (level - 1) % 5 {
            0 => LevelTheme::Space,
            1 => LevelTheme::Nebula,
            2 => LevelTheme::Asteroid,
            3 => LevelTheme::Cyber,
            _ => LevelTheme::Solar,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LevelTheme::Space => "space",
            LevelTheme::Nebula => "nebula",
            LevelTheme::Asteroid => "asteroid",
            LevelTheme::Cyber => "cyber",
            LevelTheme::Solar => "solar",
        }
    }
}

/// Where the director is in the level's life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectorPhase {
    /// Trash-wave spawning
    SpawningWave,
    /// Boss condition met; the boss spawns on the next update
    BossPending,
    /// Boss on the field - its death ends the level
    BossActive,
    /// Waiting for the driver to advance
    LevelComplete,
}

/// What the director wants the tick to do
#[derive(Debug, Default)]
pub struct DirectorActions {
    pub spawn_enemies: Vec<EnemyKind>,
    pub spawn_boss: bool,
    pub spawn_powerup: bool,
    /// Set on the single update where the level completes
    pub level_completed: bool,
}

/// End-of-level summary for the progression/persistence collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: u32,
    pub theme: LevelTheme,
    pub duration_s: f32,
    pub enemies_killed: u32,
    pub damage_taken: u32,
    pub powerups_collected: u32,
    pub score: u64,
    /// Zero damage taken over the whole level
    pub perfect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDirector {
    pub level: u32,
    pub theme: LevelTheme,
    pub phase: DirectorPhase,
    pub enemies_spawned: u32,
    pub enemies_killed: u32,
    pub total_for_level: u32,
    pub level_started_ms: f32,
    pub last_spawn_ms: f32,
    pub last_powerup_roll_ms: f32,
    /// Derived difficulty, fixed for the level's duration
    pub health_mult: f32,
    pub speed_mult: f32,
    pub spawn_interval_ms: f32,
    /// Damage the player took this level - zero means a perfect clear
    pub damage_taken: u32,
    pub powerups_collected: u32,
    pub level_score: u64,
}

impl Default for LevelDirector {
    fn default() -> Self {
        let mut d = Self {
            level: 1,
            theme: LevelTheme::Space,
            phase: DirectorPhase::SpawningWave,
            enemies_spawned: 0,
            enemies_killed: 0,
            total_for_level: 0,
            level_started_ms: 0.0,
            last_spawn_ms: 0.0,
            last_powerup_roll_ms: 0.0,
            health_mult: 1.0,
            speed_mult: 1.0,
            spawn_interval_ms: ENEMY_SPAWN_INTERVAL_MS,
            damage_taken: 0,
            powerups_collected: 0,
            level_score: 0,
        };
        d.start_level(1, 0.0, &Tuning::default());
        d
    }
}

impl LevelDirector {
    pub fn start_level(&mut self, level: u32, now_ms: f32, tuning: &Tuning) {
        let l = level.saturating_sub(1) as f32;
        self.level = level;
        self.theme = LevelTheme::for_level(level);
        self.phase = DirectorPhase::SpawningWave;
        self.enemies_spawned = 0;
        self.enemies_killed = 0;
        self.total_for_level = tuning.enemies_for_level(level);
        self.level_started_ms = now_ms;
        self.last_spawn_ms = now_ms;
        self.last_powerup_roll_ms = now_ms;
        self.health_mult = 1.0 + l * 0.2;
        self.speed_mult = 1.0 + l * 0.1;
        self.spawn_interval_ms = (ENEMY_SPAWN_INTERVAL_MS / (1.0 + l * 0.1)).max(SPAWN_INTERVAL_FLOOR_MS);
        self.damage_taken = 0;
        self.powerups_collected = 0;
        self.level_score = 0;
        log::info!("level {} started, theme {}", level, self.theme.name());
    }

    /// Per-tick decision step. Runs after collision resolution so that a
    /// kill landing this tick can flip the boss condition this tick.
    pub fn update(
        &mut self,
        now_ms: f32,
        live_enemies: usize,
        boss_alive: bool,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> DirectorActions {
        let mut actions = DirectorActions::default();

        match self.phase {
            DirectorPhase::SpawningWave => {
                if self.boss_condition_met(now_ms) {
                    self.phase = DirectorPhase::BossPending;
                } else if now_ms - self.last_spawn_ms > self.spawn_interval_ms
                    && live_enemies < MAX_CONCURRENT_ENEMIES
                    && self.enemies_spawned < self.total_for_level
                {
                    actions.spawn_enemies.push(self.roll_enemy_kind(rng));
                    self.enemies_spawned += 1;
                    self.last_spawn_ms = now_ms;
                }
            }
            DirectorPhase::BossPending => {
                // Exactly one boss per level
                actions.spawn_boss = true;
                self.phase = DirectorPhase::BossActive;
                log::info!("boss spawned for level {}", self.level);
            }
            DirectorPhase::BossActive => {
                if !boss_alive {
                    self.phase = DirectorPhase::LevelComplete;
                    actions.level_completed = true;
                }
            }
            DirectorPhase::LevelComplete => {}
        }

        // Power-up drops roll on their own clock, in any active phase
        if self.phase != DirectorPhase::LevelComplete
            && now_ms - self.last_powerup_roll_ms > POWERUP_ROLL_MS
        {
            self.last_powerup_roll_ms = now_ms;
            let chance = tuning.powerup_chance
                + tuning.powerup_chance_per_level * self.level.saturating_sub(1) as f32;
            if rng.random_range(0.0..1.0) < chance {
                actions.spawn_powerup = true;
            }
        }

        actions
    }

    fn boss_condition_met(&self, now_ms: f32) -> bool {
        let kill_target = (self.total_for_level as f32 * BOSS_KILL_FRACTION).ceil() as u32;
        self.enemies_killed >= kill_target || now_ms - self.level_started_ms >= LEVEL_TIME_MS
    }

    /// Level-tiered spawn weights: early levels are gentle, later ones mix
    /// in the nasty kinds
    fn roll_enemy_kind(&self, rng: &mut impl Rng) -> EnemyKind {
        use EnemyKind::*;
        let weights: &[(EnemyKind, f32)] = if self.level <= 2 {
            &[(Basic, 0.7), (Fast, 0.3)]
        } else if self.level <= 4 {
            &[(Basic, 0.4), (Fast, 0.3), (Heavy, 0.2), (Shooter, 0.1)]
        } else {
            &[(Basic, 0.3), (Fast, 0.25), (Heavy, 0.2), (Shooter, 0.15), (Kamikaze, 0.1)]
        };
        *crate::weighted_choice(rng, weights)
    }

    pub fn note_enemy_killed(&mut self, count: u32, score: u64) {
        self.enemies_killed += count;
        self.level_score += score;
    }

    pub fn note_damage(&mut self, amount: u32) {
        self.damage_taken += amount;
    }

    pub fn note_powerup(&mut self, count: u32) {
        self.powerups_collected += count;
    }

    /// Completion bonus: base + remaining-time bonus + perfect bonus
    pub fn completion_bonus(&self, now_ms: f32, tuning: &Tuning) -> u64 {
        let remaining_ms = (LEVEL_TIME_MS - (now_ms - self.level_started_ms)).max(0.0);
        let time_bonus = (remaining_ms / 100.0) as u64;
        let perfect = if self.damage_taken == 0 { tuning.score.perfect_level } else { 0 };
        tuning.score.level_complete + time_bonus + perfect
    }

    /// Wave progress in [0, 1]; pegged once the boss takes over
    pub fn progress(&self) -> f32 {
        match self.phase {
            DirectorPhase::SpawningWave => {
                self.enemies_killed as f32 / self.total_for_level.max(1) as f32
            }
            _ => 1.0,
        }
    }

    pub fn boss_active(&self) -> bool {
        self.phase == DirectorPhase::BossActive
    }

    pub fn summary(&self, now_ms: f32) -> LevelSummary {
        LevelSummary {
            level: self.level,
            theme: self.theme,
            duration_s: (now_ms - self.level_started_ms) / 1000.0,
            enemies_killed: self.enemies_killed,
            damage_taken: self.damage_taken,
            powerups_collected: self.powerups_collected,
            score: self.level_score,
            perfect: self.damage_taken == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn director(level: u32) -> LevelDirector {
        let mut d = LevelDirector::default();
        d.start_level(level, 0.0, &Tuning::default());
        d
    }

    #[test]
    fn test_difficulty_scales_with_level() {
        let d1 = director(1);
        assert_eq!(d1.total_for_level, 15);
        assert!((d1.health_mult - 1.0).abs() < 1e-6);

        let d4 = director(4);
        assert_eq!(d4.total_for_level, 30);
        assert!((d4.health_mult - 1.6).abs() < 1e-6);
        assert!((d4.speed_mult - 1.3).abs() < 1e-6);
        assert!(d4.spawn_interval_ms < d1.spawn_interval_ms);
    }

    #[test]
    fn test_spawn_interval_floor() {
        let d = director(50);
        assert!(d.spawn_interval_ms >= SPAWN_INTERVAL_FLOOR_MS);
    }

    #[test]
    fn test_boss_trigger_at_80_percent() {
        // Scenario: budget 20, 16 kills recorded -> boss pending, then one
        // boss spawn on the following update
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut d = director(2);
        assert_eq!(d.total_for_level, 20);

        d.note_enemy_killed(15, 150);
        d.update(1000.0, 0, false, &tuning, &mut rng);
        assert_eq!(d.phase, DirectorPhase::SpawningWave);

        d.note_enemy_killed(1, 10);
        d.update(1016.0, 0, false, &tuning, &mut rng);
        assert_eq!(d.phase, DirectorPhase::BossPending);

        let actions = d.update(1033.0, 0, false, &tuning, &mut rng);
        assert!(actions.spawn_boss);
        assert_eq!(d.phase, DirectorPhase::BossActive);

        // Never a second boss
        let actions = d.update(1050.0, 0, true, &tuning, &mut rng);
        assert!(!actions.spawn_boss);
    }

    #[test]
    fn test_boss_trigger_on_timer_expiry() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut d = director(1);
        d.update(LEVEL_TIME_MS + 1.0, 0, false, &tuning, &mut rng);
        assert_eq!(d.phase, DirectorPhase::BossPending);
    }

    #[test]
    fn test_completion_only_when_boss_dies() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut d = director(1);
        d.note_enemy_killed(d.total_for_level, 0);
        d.update(100.0, 0, false, &tuning, &mut rng); // -> pending
        d.update(116.0, 0, false, &tuning, &mut rng); // -> active

        // Boss alive: nothing completes, even with every trash enemy dead
        let a = d.update(133.0, 0, true, &tuning, &mut rng);
        assert!(!a.level_completed);

        let a = d.update(150.0, 0, false, &tuning, &mut rng);
        assert!(a.level_completed);
        assert_eq!(d.phase, DirectorPhase::LevelComplete);
    }

    #[test]
    fn test_spawn_respects_caps() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut d = director(1);

        // Concurrent cap
        let a = d.update(5000.0, MAX_CONCURRENT_ENEMIES, false, &tuning, &mut rng);
        assert!(a.spawn_enemies.is_empty());

        // Level budget
        d.enemies_spawned = d.total_for_level;
        let a = d.update(10_000.0, 0, false, &tuning, &mut rng);
        assert!(a.spawn_enemies.is_empty());
    }

    #[test]
    fn test_low_levels_never_spawn_kamikaze() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut d = director(2);
        for i in 0..200u32 {
            d.enemies_spawned = 0;
            d.last_spawn_ms = -10_000.0;
            let a = d.update(i as f32 * 16.0, 0, false, &tuning, &mut rng);
            for kind in a.spawn_enemies {
                assert!(matches!(kind, EnemyKind::Basic | EnemyKind::Fast));
            }
        }
    }

    #[test]
    fn test_completion_bonus_includes_perfect() {
        let tuning = Tuning::default();
        let d = director(1);
        let bonus = d.completion_bonus(30_000.0, &tuning);
        // 1000 base + 300 time bonus + 2000 perfect
        assert_eq!(bonus, 1000 + 300 + 2000);

        let mut damaged = director(1);
        damaged.note_damage(25);
        assert_eq!(damaged.completion_bonus(30_000.0, &tuning), 1000 + 300);
    }

    #[test]
    fn test_theme_cycles() {
        assert_eq!(LevelTheme::for_level(1), LevelTheme::Space);
        assert_eq!(LevelTheme::for_level(5), LevelTheme::Solar);
        assert_eq!(LevelTheme::for_level(6), LevelTheme::Space);
    }
}
