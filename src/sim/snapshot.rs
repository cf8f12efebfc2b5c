//! Per-tick readable view for the rendering collaborator
//!
//! The renderer never reaches into [`GameState`]; it gets a flat snapshot of
//! every live entity with a sprite tag and the visual flags it needs
//! (hit-flash, shield), plus HUD numbers. Effect spawn requests travel
//! separately as drained [`super::GameEvent`]s.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EnemyKind, ProjectileKind};
use super::level::LevelTheme;
use super::state::{GamePhase, GameState};

/// Which sprite the renderer should draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteTag {
    Ship,
    EnemyBasic,
    EnemyFast,
    EnemyHeavy,
    EnemyShooter,
    EnemyKamikaze,
    Boss,
    Bullet,
    Laser,
    Missile,
    Rocket,
    EnemyShot,
    PowerUp,
}

impl From<EnemyKind> for SpriteTag {
    fn from(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Basic => SpriteTag::EnemyBasic,
            EnemyKind::Fast => SpriteTag::EnemyFast,
            EnemyKind::Heavy => SpriteTag::EnemyHeavy,
            EnemyKind::Shooter => SpriteTag::EnemyShooter,
            EnemyKind::Kamikaze => SpriteTag::EnemyKamikaze,
        }
    }
}

impl From<ProjectileKind> for SpriteTag {
    fn from(kind: ProjectileKind) -> Self {
        match kind {
            ProjectileKind::Bullet | ProjectileKind::Spread => SpriteTag::Bullet,
            ProjectileKind::Laser => SpriteTag::Laser,
            ProjectileKind::Homing => SpriteTag::Missile,
            ProjectileKind::Rocket => SpriteTag::Rocket,
            ProjectileKind::EnemyShot => SpriteTag::EnemyShot,
        }
    }
}

/// One drawable entity
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntityView {
    pub id: u32,
    pub tag: SpriteTag,
    pub pos: Vec2,
    pub hit_flash: bool,
    pub shield: bool,
}

/// HUD numbers plus the drawable entity list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub level: u32,
    pub theme: LevelTheme,
    pub score: u64,
    pub lives: u32,
    pub health: i32,
    pub max_health: i32,
    /// Wave progress in [0, 1]
    pub progress: f32,
    /// Boss health fraction while a boss is up
    pub boss_health: Option<f32>,
    pub boss_phase: Option<u8>,
    pub entities: Vec<EntityView>,
}

/// Capture the drawable view of the current state
pub fn capture(state: &GameState) -> RenderSnapshot {
    let now = state.elapsed_ms;
    let mut entities = Vec::with_capacity(
        1 + state.enemies.len()
            + state.bosses.len()
            + state.player_bullets.len()
            + state.enemy_bullets.len()
            + state.powerups.len(),
    );

    entities.push(EntityView {
        id: 0,
        tag: SpriteTag::Ship,
        pos: state.player.pos,
        hit_flash: now < state.player.hit_flash_until_ms,
        shield: state.player.shielded(now),
    });
    for e in state.enemies.iter().filter(|e| e.alive) {
        entities.push(EntityView {
            id: e.id,
            tag: e.kind.into(),
            pos: e.pos,
            hit_flash: now < e.hit_flash_until_ms,
            shield: false,
        });
    }
    for b in state.bosses.iter().filter(|b| b.alive) {
        entities.push(EntityView {
            id: b.id,
            tag: SpriteTag::Boss,
            pos: b.pos,
            hit_flash: now < b.hit_flash_until_ms,
            shield: false,
        });
    }
    for p in state.player_bullets.iter().chain(&state.enemy_bullets).filter(|p| p.alive) {
        entities.push(EntityView {
            id: p.id,
            tag: p.kind.into(),
            pos: p.pos,
            hit_flash: false,
            shield: false,
        });
    }
    for p in state.powerups.iter().filter(|p| p.alive) {
        entities.push(EntityView {
            id: p.id,
            tag: SpriteTag::PowerUp,
            pos: p.pos,
            hit_flash: false,
            shield: false,
        });
    }

    let boss = state.bosses.iter().find(|b| b.alive);
    RenderSnapshot {
        tick: state.time_ticks,
        phase: state.phase,
        level: state.director.level,
        theme: state.director.theme,
        score: state.score,
        lives: state.player.lives,
        health: state.player.health,
        max_health: state.player.max_health,
        progress: state.director.progress(),
        boss_health: boss.map(|b| b.health_fraction()),
        boss_phase: boss.map(|b| b.phase),
        entities,
    }
}
