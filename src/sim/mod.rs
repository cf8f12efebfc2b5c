//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (groups sorted by entity ID)
//! - No rendering, audio or platform dependencies
//!
//! Per-tick order is fixed and observable: entity advancement, AI spawns,
//! collision resolution, level direction, end-of-tick sweep.

pub mod ai;
pub mod collision;
pub mod entity;
pub mod events;
pub mod level;
pub mod powerup;
pub mod snapshot;
pub mod spatial;
pub mod state;
pub mod tick;
pub mod weapon;

pub use collision::{CollisionReport, resolve};
pub use entity::{
    Boss, BossPattern, Enemy, EnemyKind, Owner, PowerUp, PowerUpKind, Projectile, ProjectileKind,
    ProjectileSpawn,
};
pub use events::{EffectKind, EffectRequest, GameEvent, SoundCue};
pub use level::{DirectorPhase, LevelDirector, LevelSummary, LevelTheme};
pub use snapshot::{RenderSnapshot, SpriteTag, capture};
pub use state::{
    DamageOutcome, GamePhase, GameState, Player, SessionStats, ShipKind, WeaponKind,
};
pub use tick::{TickInput, advance_level, tick};
