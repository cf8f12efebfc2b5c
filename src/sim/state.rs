//! Game state and core simulation types
//!
//! Everything needed to resume or replay a run deterministically lives here
//! and is serializable; purely visual state (particles, pending events) is
//! rebuilt each tick and skipped.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Boss, Enemy, Owner, PowerUp, Projectile, ProjectileSpawn, SHIP_MASK, SpriteMask};
use super::events::GameEvent;
use super::level::LevelDirector;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused; the simulation clock stops
    Paused,
    /// Boss down - waiting for the driver to advance to the next level
    LevelComplete,
    /// Run ended
    GameOver,
}

/// Player weapon tiers. Pickups advance Basic through Spread; Laser and
/// Homing are ship loadout options outside the upgrade chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Basic,
    Double,
    Triple,
    Spread,
    Laser,
    Homing,
}

impl WeaponKind {
    /// One step up the pickup chain, capped at Spread
    pub fn upgraded(self) -> Self {
        match self {
            WeaponKind::Basic => WeaponKind::Double,
            WeaponKind::Double => WeaponKind::Triple,
            _ => WeaponKind::Spread,
        }
    }
}

/// Player ship classes with distinct base stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShipKind {
    #[default]
    Fighter,
    Interceptor,
    Tank,
    Assault,
}

impl ShipKind {
    /// (max speed units/s, max health, fire interval ms)
    pub fn stats(&self) -> (f32, i32, f32) {
        match self {
            ShipKind::Fighter => (480.0, 100, 500.0),
            ShipKind::Interceptor => (720.0, 75, 300.0),
            ShipKind::Tank => (300.0, 150, 700.0),
            ShipKind::Assault => (420.0, 120, 400.0),
        }
    }
}

/// A stacked speed boost; reverted by dividing the factor back out so
/// multiple boosts compose and unwind cleanly
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeedBoost {
    pub factor: f32,
    pub until_ms: f32,
}

/// Rapid fire halves the fire interval; the pre-halving interval is saved
/// because the floor clamp makes division-back inexact
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RapidFire {
    pub saved_interval_ms: f32,
    pub until_ms: f32,
}

/// Timed status effects, each tracked as an expiry on the sim clock and
/// reverted exactly once by the per-tick sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub shield_until_ms: Option<f32>,
    /// Post-hit invulnerability window
    pub protection_until_ms: Option<f32>,
    /// Weapon upgrade expiry; reverts to Basic
    pub weapon_until_ms: Option<f32>,
    pub speed_boosts: Vec<SpeedBoost>,
    pub rapid_fire: Option<RapidFire>,
}

/// Outcome of applying damage to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Shield or protection window absorbed it
    Blocked,
    Damaged,
    /// Health hit zero; a life was spent and health reset
    LifeLost,
    /// No lives left
    GameOver,
}

/// The player ship - singleton per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub ship: ShipKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub lives: u32,
    pub max_speed: f32,
    pub weapon: WeaponKind,
    pub fire_interval_ms: f32,
    pub last_shot_ms: f32,
    pub effects: ActiveEffects,
    pub hit_flash_until_ms: f32,
}

impl Player {
    pub const SIZE: Vec2 = Vec2::new(50.0, 40.0);

    pub fn new(ship: ShipKind) -> Self {
        let (max_speed, max_health, fire_interval_ms) = ship.stats();
        Self {
            ship,
            pos: Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT - 50.0),
            vel: Vec2::ZERO,
            health: max_health,
            max_health,
            lives: PLAYER_LIVES,
            max_speed,
            weapon: WeaponKind::Basic,
            fire_interval_ms,
            // Far enough in the past that the first trigger pull always fires
            last_shot_ms: -1.0e9,
            effects: ActiveEffects::default(),
            hit_flash_until_ms: 0.0,
        }
    }

    pub fn hitbox(&self) -> super::entity::Hitbox {
        super::entity::Hitbox::new(self.pos, Self::SIZE)
    }

    pub fn mask(&self) -> Option<&'static SpriteMask> {
        Some(&SHIP_MASK)
    }

    pub fn shielded(&self, now_ms: f32) -> bool {
        self.effects.shield_until_ms.is_some_and(|t| now_ms < t)
    }

    pub fn protected(&self, now_ms: f32) -> bool {
        self.effects.protection_until_ms.is_some_and(|t| now_ms < t)
    }

    /// Apply incoming damage with shield/protection gating. A successful hit
    /// opens the post-hit protection window so one bad frame can't drain
    /// several hits' worth of health.
    pub fn apply_damage(&mut self, amount: i32, now_ms: f32) -> DamageOutcome {
        if self.shielded(now_ms) || self.protected(now_ms) {
            return DamageOutcome::Blocked;
        }
        self.health = (self.health - amount).max(0);
        self.effects.protection_until_ms = Some(now_ms + HIT_PROTECTION_MS);
        self.hit_flash_until_ms = now_ms + 100.0;
        if self.health == 0 {
            self.lives = self.lives.saturating_sub(1);
            if self.lives > 0 {
                self.health = self.max_health;
                DamageOutcome::LifeLost
            } else {
                DamageOutcome::GameOver
            }
        } else {
            DamageOutcome::Damaged
        }
    }

    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Ready to fire given the current interval?
    pub fn can_fire(&self, now_ms: f32) -> bool {
        now_ms - self.last_shot_ms >= self.fire_interval_ms
    }
}

/// A particle for visual effects - gameplay-inert, never serialized
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Palette index for the renderer
    pub color: u32,
    /// 0..1, decreases over time
    pub life: f32,
    pub size: f32,
}

/// Per-run counters, folded into the aggregate stats at game end
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub enemies_killed: u32,
    pub bosses_defeated: u32,
    pub powerups_collected: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_taken: u32,
    pub levels_completed: u32,
}

impl SessionStats {
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Sim clock in milliseconds; every timer in the core compares against
    /// this, never a wall clock
    pub elapsed_ms: f32,
    pub score: u64,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bosses: Vec<Boss>,
    pub player_bullets: Vec<Projectile>,
    pub enemy_bullets: Vec<Projectile>,
    pub powerups: Vec<PowerUp>,
    pub director: LevelDirector,
    pub stats: SessionStats,
    pub tuning: Tuning,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    /// Side effects for the rendering/audio collaborators, drained per tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64, ship: ShipKind, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            time_ticks: 0,
            elapsed_ms: 0.0,
            score: 0,
            player: Player::new(ship),
            enemies: Vec::new(),
            bosses: Vec::new(),
            player_bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            powerups: Vec::new(),
            director: LevelDirector::default(),
            stats: SessionStats::default(),
            tuning,
            particles: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };
        state.director.start_level(1, 0.0, &state.tuning);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// File a projectile spawn into the group matching its owner
    pub fn spawn_projectile(&mut self, spawn: ProjectileSpawn) {
        let id = self.next_entity_id();
        let owner = spawn.owner;
        let projectile = spawn.into_projectile(id);
        match owner {
            Owner::Player => self.player_bullets.push(projectile),
            Owner::Enemy => self.enemy_bullets.push(projectile),
        }
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand the tick's side effects to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn boss_alive(&self) -> bool {
        self.bosses.iter().any(|b| b.alive)
    }

    /// Nearest live enemy to a point - homing target acquisition
    pub fn nearest_enemy(&self, pos: Vec2) -> Option<&Enemy> {
        self.enemies
            .iter()
            .filter(|e| e.alive)
            .min_by(|a, b| {
                let da = a.pos.distance_squared(pos);
                let db = b.pos.distance_squared(pos);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Ensure groups are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.bosses.sort_by_key(|b| b.id);
        self.player_bullets.sort_by_key(|p| p.id);
        self.enemy_bullets.sort_by_key(|p| p.id);
        self.powerups.sort_by_key(|p| p.id);
    }
}
