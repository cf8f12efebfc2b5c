//! Entity data for everything that flies: enemies, bosses, projectiles,
//! power-ups.
//!
//! Entities are plain structs tagged by a closed kind enum; behavior lives in
//! [`crate::sim::ai`] and the tick loop, never in virtual dispatch. Removal is
//! mark-and-sweep: collision resolution flips `alive` and the tick compacts
//! the groups at end of tick, so nothing is removed mid-iteration.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::Tuning;

/// Axis-aligned bounding box, center + half extents
#[derive(Debug, Clone, Copy)]
pub struct Hitbox {
    pub center: Vec2,
    pub half: Vec2,
}

impl Hitbox {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, half: size * 0.5 }
    }

    #[inline]
    pub fn intersects(&self, other: &Hitbox) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x <= reach.x && d.y <= reach.y
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }
}

/// Coarse occupancy mask stretched over an entity's bounding box.
///
/// Bit `x` of `rows[y]` is counted from the left: `(row >> (w - 1 - x)) & 1`.
/// Masks give the finer-grained collision path; entities without one fall
/// back to plain box intersection.
#[derive(Debug)]
pub struct SpriteMask {
    pub w: u32,
    pub h: u32,
    pub rows: &'static [u16],
}

impl SpriteMask {
    /// Is the mask cell containing `point` occupied? `hitbox` anchors the
    /// mask in world space.
    pub fn test_world(&self, hitbox: &Hitbox, point: Vec2) -> bool {
        let local = point - hitbox.min();
        let size = hitbox.half * 2.0;
        if local.x < 0.0 || local.y < 0.0 || local.x >= size.x || local.y >= size.y {
            return false;
        }
        let cx = ((local.x / size.x) * self.w as f32) as u32;
        let cy = ((local.y / size.y) * self.h as f32) as u32;
        let cx = cx.min(self.w - 1);
        let cy = cy.min(self.h - 1);
        (self.rows[cy as usize] >> (self.w - 1 - cx)) & 1 != 0
    }
}

/// Mask-accurate overlap: sample the box intersection at half the finer
/// mask's cell pitch and look for a point both masks occupy.
pub fn masks_overlap(a_box: &Hitbox, a_mask: &SpriteMask, b_box: &Hitbox, b_mask: &SpriteMask) -> bool {
    if !a_box.intersects(b_box) {
        return false;
    }
    let lo = a_box.min().max(b_box.min());
    let hi = a_box.max().min(b_box.max());
    let a_cell = (a_box.half * 2.0) / Vec2::new(a_mask.w as f32, a_mask.h as f32);
    let b_cell = (b_box.half * 2.0) / Vec2::new(b_mask.w as f32, b_mask.h as f32);
    let step = (a_cell.min(b_cell) * 0.5).max(Vec2::splat(0.5));

    let mut y = lo.y;
    while y <= hi.y {
        let mut x = lo.x;
        while x <= hi.x {
            let p = Vec2::new(x, y);
            if a_mask.test_world(a_box, p) && b_mask.test_world(b_box, p) {
                return true;
            }
            x += step.x;
        }
        y += step.y;
    }
    false
}

/// Player ship silhouette (nose up)
pub const SHIP_MASK: SpriteMask = SpriteMask {
    w: 8,
    h: 8,
    rows: &[
        0b0001_1000,
        0b0001_1000,
        0b0011_1100,
        0b0011_1100,
        0b0111_1110,
        0b1111_1111,
        0b1110_0111,
        0b1100_0011,
    ],
};

/// Generic enemy saucer silhouette
pub const SAUCER_MASK: SpriteMask = SpriteMask {
    w: 8,
    h: 8,
    rows: &[
        0b0001_1000,
        0b0011_1100,
        0b0111_1110,
        0b1111_1111,
        0b1111_1111,
        0b0111_1110,
        0b0011_1100,
        0b0001_1000,
    ],
};

/// Boss hull silhouette (wide, with dangling pods)
pub const BOSS_MASK: SpriteMask = SpriteMask {
    w: 16,
    h: 8,
    rows: &[
        0b0000_0111_1110_0000,
        0b0001_1111_1111_1000,
        0b0111_1111_1111_1110,
        0b1111_1111_1111_1111,
        0b1111_1111_1111_1111,
        0b0111_1111_1111_1110,
        0b0011_1100_0011_1100,
        0b0001_1000_0001_1000,
    ],
};

/// Enemy behavior archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Steady descent, periodically drifts toward the player
    Basic,
    /// Quick and erratic
    Fast,
    /// Slow, tough, fires spreads
    Heavy,
    /// Keeps a stand-off distance and fires fans
    Shooter,
    /// Dives at the player once past mid-field; never returns to formation
    Kamikaze,
}

impl EnemyKind {
    pub fn size(&self) -> Vec2 {
        match self {
            EnemyKind::Basic => Vec2::new(30.0, 30.0),
            EnemyKind::Fast => Vec2::new(25.0, 25.0),
            EnemyKind::Heavy => Vec2::new(45.0, 45.0),
            EnemyKind::Shooter => Vec2::new(35.0, 35.0),
            EnemyKind::Kamikaze => Vec2::new(28.0, 28.0),
        }
    }
}

/// An enemy ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub hp: i32,
    /// Per-kind cruise speed, already level-scaled (units/second)
    pub speed: f32,
    pub score_value: u64,
    /// Next horizontal-steering decision time (sim clock, ms)
    pub next_steer_ms: f32,
    /// Next shot time; infinity for kinds that never fire
    pub next_shot_ms: f32,
    /// Kamikaze homing latch - set once, never cleared
    pub homing: bool,
    pub hit_flash_until_ms: f32,
    pub alive: bool,
}

impl Enemy {
    /// Build a level-scaled enemy. The director applies its own difficulty
    /// multipliers on top of these per-kind baselines.
    pub fn spawn(id: u32, kind: EnemyKind, level: u32, pos: Vec2, now_ms: f32, rng: &mut impl Rng, tuning: &Tuning) -> Self {
        let l = level as i32;
        let (hp, speed, shoot_window) = match kind {
            EnemyKind::Basic => (
                ENEMY_BASE_HEALTH + l / 2,
                ENEMY_BASE_SPEED * (1.0 + level as f32 * 0.1),
                Some((3000.0, 6000.0)),
            ),
            EnemyKind::Fast => (
                (ENEMY_BASE_HEALTH / 2 + l / 3).max(1),
                ENEMY_BASE_SPEED * 1.8 * (1.0 + level as f32 * 0.1),
                Some((2000.0, 4000.0)),
            ),
            EnemyKind::Heavy => (
                ENEMY_BASE_HEALTH * 3 + l,
                ENEMY_BASE_SPEED * 0.6 * (1.0 + level as f32 * 0.05),
                Some((4000.0, 7000.0)),
            ),
            EnemyKind::Shooter => (
                ENEMY_BASE_HEALTH + l / 2,
                ENEMY_BASE_SPEED * 1.2 * (1.0 + level as f32 * 0.1),
                Some((1500.0, 3000.0)),
            ),
            EnemyKind::Kamikaze => (
                1,
                ENEMY_BASE_SPEED * 2.5 * (1.0 + level as f32 * 0.15),
                None,
            ),
        };
        // Finite "never" keeps the state JSON-serializable
        let next_shot_ms = match shoot_window {
            Some((lo, hi)) => now_ms + rng.random_range(lo..hi),
            None => f32::MAX,
        };
        Self {
            id,
            kind,
            pos,
            vel: Vec2::new(rng.random_range(-60.0..60.0), speed),
            hp,
            speed,
            score_value: tuning.score.enemy(kind),
            next_steer_ms: now_ms,
            next_shot_ms,
            homing: false,
            hit_flash_until_ms: 0.0,
            alive: true,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::new(self.pos, self.kind.size())
    }

    pub fn mask(&self) -> Option<&'static SpriteMask> {
        Some(&SAUCER_MASK)
    }

    /// Apply damage; returns true on kill. Does not remove the entity -
    /// callers flip `alive` so the sweep can handle it.
    pub fn apply_damage(&mut self, amount: i32, now_ms: f32) -> bool {
        self.hp -= amount;
        self.hit_flash_until_ms = now_ms + 100.0;
        self.hp <= 0
    }
}

/// A boss movement/attack pattern, cycled on a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPattern {
    /// Bounce side to side, spraying downward
    Sweep,
    /// Track the player horizontally, firing aimed clusters
    Track,
    /// Orbit the top of the field, radial bursts
    Orbit,
    /// Push down toward the player, rapid aimed shots
    Dive,
}

impl BossPattern {
    pub fn next(self) -> Self {
        match self {
            BossPattern::Sweep => BossPattern::Track,
            BossPattern::Track => BossPattern::Orbit,
            BossPattern::Orbit => BossPattern::Dive,
            BossPattern::Dive => BossPattern::Sweep,
        }
    }
}

/// The level boss. One per level, spawned by the director; its death is the
/// level-completion signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: u32,
    pub level: u32,
    pub pos: Vec2,
    pub hp: i32,
    pub max_hp: i32,
    /// Escalation tier 1..=3, monotone over the boss's lifetime
    pub phase: u8,
    pub pattern: BossPattern,
    pub pattern_changed_ms: f32,
    pub pattern_duration_ms: f32,
    pub fire_interval_ms: f32,
    pub last_shot_ms: f32,
    pub last_minion_ms: f32,
    /// Horizontal sweep velocity, sign flips at the edges
    pub sweep_vel: f32,
    pub hit_flash_until_ms: f32,
    pub alive: bool,
}

impl Boss {
    pub const SIZE: Vec2 = Vec2::new(100.0, 80.0);

    pub fn spawn(id: u32, level: u32, now_ms: f32, tuning: &Tuning) -> Self {
        let hp = tuning.boss_base_health * level as i32;
        Self {
            id,
            level,
            pos: Vec2::new(FIELD_WIDTH / 2.0, -Self::SIZE.y / 2.0),
            hp,
            max_hp: hp,
            phase: 1,
            pattern: BossPattern::Sweep,
            pattern_changed_ms: now_ms,
            pattern_duration_ms: BOSS_PATTERN_MS,
            fire_interval_ms: BOSS_FIRE_INTERVAL_MS,
            last_shot_ms: now_ms,
            last_minion_ms: now_ms,
            sweep_vel: 120.0,
            hit_flash_until_ms: 0.0,
            alive: true,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::new(self.pos, Self::SIZE)
    }

    pub fn mask(&self) -> Option<&'static SpriteMask> {
        Some(&BOSS_MASK)
    }

    /// Still flying in from above the field?
    pub fn entering(&self) -> bool {
        self.pos.y < BOSS_ENTRY_Y
    }

    pub fn health_fraction(&self) -> f32 {
        self.hp.max(0) as f32 / self.max_hp as f32
    }

    pub fn score_value(&self, tuning: &Tuning) -> u64 {
        tuning.score.boss * self.level as u64
    }

    /// Apply damage and advance the phase thresholds. Phases only ever go
    /// up; nothing heals a boss.
    pub fn apply_damage(&mut self, amount: i32, now_ms: f32) -> bool {
        self.hp -= amount;
        self.hit_flash_until_ms = now_ms + 150.0;
        let frac = self.health_fraction();
        if frac <= 0.5 && self.phase == 1 {
            self.phase = 2;
            self.fire_interval_ms = (self.fire_interval_ms - 200.0).max(500.0);
            self.pattern_duration_ms = (self.pattern_duration_ms - 1000.0).max(BOSS_PATTERN_FLOOR_MS);
        }
        if frac <= 0.25 && self.phase == 2 {
            self.phase = 3;
            self.fire_interval_ms = (self.fire_interval_ms - 200.0).max(BOSS_FIRE_FLOOR_MS);
            self.sweep_vel *= 1.5;
        }
        self.hp <= 0
    }
}

/// Who launched a projectile; decides which collision passes see it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Straight-line player bullet
    Bullet,
    /// Fast, thin, penetrates several targets
    Laser,
    /// Angled fan bullet
    Spread,
    /// Curves toward the nearest enemy
    Homing,
    /// Slow, explodes in a radius on impact
    Rocket,
    /// Anything hostile
    EnemyShot,
}

impl ProjectileKind {
    pub fn size(&self) -> Vec2 {
        match self {
            ProjectileKind::Bullet | ProjectileKind::Spread => Vec2::new(4.0, 12.0),
            ProjectileKind::Laser => Vec2::new(3.0, 16.0),
            ProjectileKind::Homing => Vec2::new(8.0, 14.0),
            ProjectileKind::Rocket => Vec2::new(8.0, 16.0),
            ProjectileKind::EnemyShot => Vec2::new(6.0, 6.0),
        }
    }
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub owner: Owner,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: i32,
    /// Remaining ticks. A projectile may still hit on the tick this reaches
    /// zero; the end-of-tick sweep removes it before the next collision pass.
    pub lifetime: u32,
    /// Hits survivable before the projectile is consumed
    pub penetration: u32,
    /// Homing target by entity id, re-acquired when the referent dies
    pub target: Option<u32>,
    /// Splash radius on impact; zero for ordinary projectiles
    pub blast_radius: f32,
    pub alive: bool,
}

impl Projectile {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::new(self.pos, self.kind.size())
    }

    pub fn offscreen(&self) -> bool {
        self.pos.x < -OFFSCREEN_MARGIN
            || self.pos.x > FIELD_WIDTH + OFFSCREEN_MARGIN
            || self.pos.y < -OFFSCREEN_MARGIN
            || self.pos.y > FIELD_HEIGHT + OFFSCREEN_MARGIN
    }
}

/// Spawn request for a projectile; the tick assigns the entity id and files
/// it into the right group. Keeps AI and weapon code free of registry access.
#[derive(Debug, Clone)]
pub struct ProjectileSpawn {
    pub kind: ProjectileKind,
    pub owner: Owner,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: i32,
    pub lifetime: u32,
    pub penetration: u32,
    pub blast_radius: f32,
}

impl ProjectileSpawn {
    pub fn bullet(pos: Vec2, vel: Vec2, damage: i32) -> Self {
        Self {
            kind: ProjectileKind::Bullet,
            owner: Owner::Player,
            pos,
            vel,
            damage,
            lifetime: BULLET_LIFETIME_TICKS,
            penetration: 1,
            blast_radius: 0.0,
        }
    }

    pub fn spread(pos: Vec2, angle: f32, damage: i32) -> Self {
        Self {
            kind: ProjectileKind::Spread,
            vel: Vec2::new(angle.cos(), angle.sin()) * BULLET_SPEED,
            ..Self::bullet(pos, Vec2::ZERO, damage)
        }
    }

    pub fn laser(pos: Vec2) -> Self {
        Self {
            kind: ProjectileKind::Laser,
            vel: Vec2::new(0.0, -BULLET_SPEED * 1.5),
            damage: 2,
            penetration: 3,
            ..Self::bullet(pos, Vec2::ZERO, 0)
        }
    }

    pub fn homing(pos: Vec2) -> Self {
        Self {
            kind: ProjectileKind::Homing,
            vel: Vec2::new(0.0, -BULLET_SPEED * 0.7),
            damage: 4,
            ..Self::bullet(pos, Vec2::ZERO, 0)
        }
    }

    pub fn rocket(pos: Vec2, vel: Vec2) -> Self {
        Self {
            kind: ProjectileKind::Rocket,
            vel,
            damage: 8,
            blast_radius: 40.0,
            ..Self::bullet(pos, Vec2::ZERO, 0)
        }
    }

    /// Hostile shot aimed at a world position
    pub fn enemy_shot(pos: Vec2, target: Vec2, speed: f32, damage: i32) -> Self {
        Self {
            kind: ProjectileKind::EnemyShot,
            owner: Owner::Enemy,
            pos,
            vel: crate::direction_to(pos, target) * speed,
            damage,
            lifetime: BULLET_LIFETIME_TICKS,
            penetration: 1,
            blast_radius: 0.0,
        }
    }

    pub fn into_projectile(self, id: u32) -> Projectile {
        Projectile {
            id,
            kind: self.kind,
            owner: self.owner,
            pos: self.pos,
            vel: self.vel,
            damage: self.damage,
            lifetime: self.lifetime,
            penetration: self.penetration,
            target: None,
            blast_radius: self.blast_radius,
            alive: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    GunUpgrade,
    Ultrakill,
    Health,
    Life,
    Speed,
    RapidFire,
}

/// A falling pickup; despawns uncollected after [`POWERUP_TTL_MS`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub spawned_ms: f32,
    pub alive: bool,
}

impl PowerUp {
    pub const SIZE: Vec2 = Vec2::new(24.0, 24.0);

    pub fn spawn(id: u32, kind: PowerUpKind, now_ms: f32, rng: &mut impl Rng) -> Self {
        let x = rng.random_range(PowerUp::SIZE.x..FIELD_WIDTH - PowerUp::SIZE.x);
        Self {
            id,
            kind,
            pos: Vec2::new(x, -PowerUp::SIZE.y),
            vel: Vec2::new(0.0, 120.0),
            spawned_ms: now_ms,
            alive: true,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::new(self.pos, Self::SIZE)
    }

    pub fn expired(&self, now_ms: f32) -> bool {
        now_ms - self.spawned_ms > POWERUP_TTL_MS || self.pos.y > FIELD_HEIGHT + OFFSCREEN_MARGIN
    }
}
