//! Side effects produced by the simulation for external collaborators
//!
//! The core never touches audio devices or render surfaces; every
//! observable consequence of a tick beyond the state itself is one of these
//! events, drained by the driver after [`super::tick`].

use glam::Vec2;

/// Audio cue, addressed by symbolic name only. The sound collaborator maps
/// names to loaded (or placeholder) assets; the core never knows which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Shoot,
    Explosion,
    Hit,
    PlayerHit,
    BossHit,
    BossExplosion,
    PowerUp,
    Ultrakill,
    LevelUp,
}

impl SoundCue {
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::Explosion => "explosion",
            SoundCue::Hit => "hit",
            SoundCue::PlayerHit => "player_hit",
            SoundCue::BossHit => "boss_hit",
            SoundCue::BossExplosion => "boss_explosion",
            SoundCue::PowerUp => "powerup",
            SoundCue::Ultrakill => "ultrakill",
            SoundCue::LevelUp => "level_up",
        }
    }
}

/// Ephemeral visual effect kinds the renderer knows how to spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    Explosion { size: f32 },
    HitFlash,
    MuzzleFlash,
    PowerUpGlow,
}

/// Request to spawn a visual effect at a position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectRequest {
    pub kind: EffectKind,
    pub pos: Vec2,
}

/// One side effect of a simulation tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Points awarded (already applied to the running score)
    Score(u64),
    Sound { cue: SoundCue, volume: f32 },
    Effect(EffectRequest),
    ScreenShake { intensity: f32, duration_ms: f32 },
    /// Level finished; the driver decides when to advance
    LevelCompleted { level: u32, bonus: u64 },
}

impl GameEvent {
    pub fn sound(cue: SoundCue) -> Self {
        GameEvent::Sound { cue, volume: 1.0 }
    }

    pub fn explosion(pos: Vec2, size: f32) -> Self {
        GameEvent::Effect(EffectRequest { kind: EffectKind::Explosion { size }, pos })
    }

    pub fn hit_flash(pos: Vec2) -> Self {
        GameEvent::Effect(EffectRequest { kind: EffectKind::HitFlash, pos })
    }
}
