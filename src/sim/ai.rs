//! Enemy and boss behavior
//!
//! Each enemy kind is a small state machine over (elapsed time, player
//! position): steering decisions set velocities, movement integrates them,
//! and firing produces [`ProjectileSpawn`] requests for the tick to file.
//! Nothing here touches the entity registry - AI reads one entity plus the
//! player's position and returns spawn requests, which keeps the
//! iterate-while-mutate hazard out of the behavior code entirely.

use glam::Vec2;
use rand::Rng;

use super::entity::{Boss, BossPattern, Enemy, EnemyKind, ProjectileSpawn};
use crate::consts::*;
use crate::direction_to;

/// Everything a boss wants done this tick
#[derive(Debug, Default)]
pub struct BossActions {
    pub shots: Vec<ProjectileSpawn>,
    /// Minion kinds to spawn near the boss
    pub minions: Vec<EnemyKind>,
}

/// Advance one enemy: steering, movement, field-edge handling, firing.
/// Returns hostile shots to spawn.
pub fn update_enemy(
    enemy: &mut Enemy,
    now_ms: f32,
    dt: f32,
    player_pos: Vec2,
    shot_damage: i32,
    rng: &mut impl Rng,
) -> Vec<ProjectileSpawn> {
    steer(enemy, now_ms, player_pos, rng);
    integrate(enemy, dt, rng);
    fire(enemy, now_ms, player_pos, shot_damage, rng)
}

fn steer(enemy: &mut Enemy, now_ms: f32, player_pos: Vec2, rng: &mut impl Rng) {
    match enemy.kind {
        EnemyKind::Basic => {
            // Re-evaluate horizontal direction toward the player every 2s
            if now_ms >= enemy.next_steer_ms {
                let toward = if enemy.pos.x < player_pos.x { 1.0 } else { -1.0 };
                enemy.vel.x = enemy.vel.x.abs().max(30.0) * toward;
                enemy.next_steer_ms = now_ms + 2000.0;
            }
        }
        EnemyKind::Fast => {
            // Erratic: new random drift every second
            if now_ms >= enemy.next_steer_ms {
                enemy.vel.x = rng.random_range(-120.0..120.0);
                enemy.next_steer_ms = now_ms + 1000.0;
            }
        }
        EnemyKind::Heavy => {
            // Bounded ramp toward the player, never an instant turn
            if enemy.pos.x < player_pos.x {
                enemy.vel.x = (enemy.vel.x + 6.0).min(60.0);
            } else {
                enemy.vel.x = (enemy.vel.x - 6.0).max(-60.0);
            }
        }
        EnemyKind::Shooter => {
            // Hold a ~200 unit stand-off: retreat when close, close when far
            let dist = enemy.pos.distance(player_pos);
            let toward = if enemy.pos.x < player_pos.x { 1.0 } else { -1.0 };
            enemy.vel.x = if dist < 200.0 { -60.0 * toward } else { 30.0 * toward };
        }
        EnemyKind::Kamikaze => {
            // Latch into homing pursuit past mid-field. The latch is
            // permanent: once diving, it never resumes formation descent.
            if !enemy.homing && enemy.pos.y > FIELD_HEIGHT / 2.0 {
                enemy.homing = true;
                enemy.speed *= 1.5;
            }
            if enemy.homing {
                enemy.vel = direction_to(enemy.pos, player_pos) * enemy.speed;
            }
        }
    }
    // Formation descent for everyone not actively diving
    if !enemy.homing {
        enemy.vel.y = enemy.speed;
    }
}

fn integrate(enemy: &mut Enemy, dt: f32, rng: &mut impl Rng) {
    enemy.pos += enemy.vel * dt;

    // Bounce off the side edges
    let half = enemy.kind.size().x / 2.0;
    if enemy.pos.x < half {
        enemy.pos.x = half;
        enemy.vel.x = enemy.vel.x.abs();
    } else if enemy.pos.x > FIELD_WIDTH - half {
        enemy.pos.x = FIELD_WIDTH - half;
        enemy.vel.x = -enemy.vel.x.abs();
    }

    // Bottom exit: most kinds rejoin the formation at the top; a kamikaze
    // that missed is spent
    if enemy.pos.y - enemy.kind.size().y / 2.0 > FIELD_HEIGHT {
        if enemy.kind == EnemyKind::Kamikaze {
            enemy.alive = false;
        } else {
            enemy.pos.x = rng.random_range(half..FIELD_WIDTH - half);
            enemy.pos.y = rng.random_range(-150.0..-40.0);
            enemy.vel.y = enemy.speed;
        }
    }
}

fn fire(
    enemy: &mut Enemy,
    now_ms: f32,
    player_pos: Vec2,
    shot_damage: i32,
    rng: &mut impl Rng,
) -> Vec<ProjectileSpawn> {
    if now_ms < enemy.next_shot_ms {
        return Vec::new();
    }
    let muzzle = enemy.pos + Vec2::new(0.0, enemy.kind.size().y / 2.0);
    let shots = match enemy.kind {
        EnemyKind::Basic => vec![ProjectileSpawn::enemy_shot(muzzle, player_pos, 180.0, shot_damage)],
        EnemyKind::Fast => vec![ProjectileSpawn::enemy_shot(muzzle, player_pos, 300.0, shot_damage)],
        EnemyKind::Heavy => {
            // Three-shot spread around the player's position
            (-1..=1)
                .map(|i| {
                    let target = player_pos + Vec2::new(i as f32 * 60.0, 0.0);
                    ProjectileSpawn::enemy_shot(muzzle, target, 120.0, shot_damage)
                })
                .collect()
        }
        EnemyKind::Shooter => {
            // Five-shot fan, 15 degrees apart
            (-2..=2)
                .map(|i| {
                    let spread = (i as f32 * 15.0_f32).to_radians();
                    let target = player_pos + Vec2::new(spread.sin() * 100.0, spread.cos() * 100.0);
                    ProjectileSpawn::enemy_shot(muzzle, target, 240.0, shot_damage)
                })
                .collect()
        }
        EnemyKind::Kamikaze => Vec::new(),
    };
    // Next delay jitters around the kind's base window
    let base = match enemy.kind {
        EnemyKind::Basic => 4500.0,
        EnemyKind::Fast => 3000.0,
        EnemyKind::Heavy => 5500.0,
        EnemyKind::Shooter => 2250.0,
        EnemyKind::Kamikaze => return shots,
    };
    enemy.next_shot_ms = now_ms + rng.random_range(base * 0.8..base * 1.2);
    shots
}

/// Advance the boss one tick: entry descent, then the cyclic movement and
/// firing patterns, phase-gated spiral barrage, and minion spawning.
pub fn update_boss(
    boss: &mut Boss,
    now_ms: f32,
    dt: f32,
    player_pos: Vec2,
    shot_damage: i32,
    rng: &mut impl Rng,
) -> BossActions {
    let mut actions = BossActions::default();

    if boss.entering() {
        boss.pos.y += 60.0 * dt;
        return actions;
    }

    // Time-boxed pattern cycle, faster in later phases
    if now_ms - boss.pattern_changed_ms > boss.pattern_duration_ms {
        boss.pattern = boss.pattern.next();
        boss.pattern_changed_ms = now_ms;
    }

    let half_w = Boss::SIZE.x / 2.0;
    match boss.pattern {
        BossPattern::Sweep => {
            boss.pos.x += boss.sweep_vel * dt;
            if boss.pos.x < half_w {
                boss.pos.x = half_w;
                boss.sweep_vel = boss.sweep_vel.abs();
            } else if boss.pos.x > FIELD_WIDTH - half_w {
                boss.pos.x = FIELD_WIDTH - half_w;
                boss.sweep_vel = -boss.sweep_vel.abs();
            }
        }
        BossPattern::Track => {
            let dir = (player_pos.x - boss.pos.x).signum();
            if (player_pos.x - boss.pos.x).abs() > 4.0 {
                boss.pos.x += dir * 120.0 * dt;
            }
        }
        BossPattern::Orbit => {
            // Figure-eight-ish orbit around the top of the field
            let t = now_ms / 1000.0;
            boss.pos.x = FIELD_WIDTH / 2.0 + t.cos() * 150.0;
            boss.pos.y = 100.0 + t.sin() * 50.0;
        }
        BossPattern::Dive => {
            if boss.pos.y < FIELD_HEIGHT / 3.0 {
                boss.pos.y += 60.0 * dt;
            }
            boss.pos.x += (player_pos.x - boss.pos.x) * 1.2 * dt;
        }
    }

    if now_ms - boss.last_shot_ms > boss.fire_interval_ms {
        boss.last_shot_ms = now_ms;
        actions.shots = boss_volley(boss, now_ms, player_pos, shot_damage);
    }

    // Minions join the fight from phase 2 on
    if boss.phase >= 2 && now_ms - boss.last_minion_ms > MINION_COOLDOWN_MS {
        boss.last_minion_ms = now_ms;
        let count = rng.random_range(2..=3);
        for _ in 0..count {
            let kind = if rng.random_bool(0.5) { EnemyKind::Basic } else { EnemyKind::Fast };
            actions.minions.push(kind);
        }
    }

    actions
}

fn boss_volley(boss: &Boss, now_ms: f32, player_pos: Vec2, shot_damage: i32) -> Vec<ProjectileSpawn> {
    let mut shots = Vec::new();
    let below = boss.pos + Vec2::new(0.0, Boss::SIZE.y / 2.0);

    match boss.pattern {
        BossPattern::Sweep => {
            // Downward spray across the hull
            for i in -2..=2 {
                let origin = below + Vec2::new(i as f32 * 25.0, 0.0);
                let target = Vec2::new(origin.x, FIELD_HEIGHT);
                shots.push(ProjectileSpawn::enemy_shot(origin, target, 180.0, shot_damage));
            }
        }
        BossPattern::Track => {
            // Aimed cluster bracketing the player
            for i in -1..=1 {
                let origin = below + Vec2::new(i as f32 * 30.0, 0.0);
                let target = player_pos + Vec2::new(i as f32 * 50.0, 0.0);
                shots.push(ProjectileSpawn::enemy_shot(origin, target, 240.0, shot_damage));
            }
        }
        BossPattern::Orbit => {
            // Radial burst every 30 degrees
            for deg in (0..360).step_by(30) {
                let a = (deg as f32).to_radians();
                let target = boss.pos + Vec2::new(a.cos(), a.sin()) * 300.0;
                shots.push(ProjectileSpawn::enemy_shot(boss.pos, target, 180.0, shot_damage));
            }
        }
        BossPattern::Dive => {
            shots.push(ProjectileSpawn::enemy_shot(below, player_pos, 360.0, shot_damage));
        }
    }

    // Phase 2+: always-on rotating spiral barrage layered over the pattern
    if boss.phase >= 2 {
        for i in 0..8 {
            let a = ((now_ms / 100.0 + i as f32 * 45.0) % 360.0).to_radians();
            let target = boss.pos + Vec2::new(a.cos(), a.sin()) * 200.0;
            shots.push(ProjectileSpawn::enemy_shot(boss.pos, target, 120.0, shot_damage));
        }
    }

    shots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn enemy(kind: EnemyKind, pos: Vec2) -> Enemy {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(42);
        let mut e = Enemy::spawn(1, kind, 1, pos, 0.0, &mut rng, &tuning);
        e.next_shot_ms = f32::MAX; // isolate steering in these tests
        e
    }

    #[test]
    fn test_kamikaze_homing_latch_is_irreversible() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut e = enemy(EnemyKind::Kamikaze, Vec2::new(400.0, 100.0));
        let player = Vec2::new(450.0, 650.0);

        // Above the threshold: still descending
        update_enemy(&mut e, 0.0, SIM_DT, player, 10, &mut rng);
        assert!(!e.homing);

        // Cross mid-field
        e.pos.y = FIELD_HEIGHT / 2.0 + 1.0;
        update_enemy(&mut e, 16.0, SIM_DT, player, 10, &mut rng);
        assert!(e.homing);

        // Player teleports to the far side; the latch must hold
        let far_player = Vec2::new(20.0, 20.0);
        for i in 0..120 {
            update_enemy(&mut e, 32.0 + i as f32 * 16.0, SIM_DT, far_player, 10, &mut rng);
            assert!(e.homing, "homing latch must never revert");
        }
    }

    #[test]
    fn test_kamikaze_dies_off_bottom() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut e = enemy(EnemyKind::Kamikaze, Vec2::new(400.0, FIELD_HEIGHT + 30.0));
        update_enemy(&mut e, 0.0, SIM_DT, Vec2::new(400.0, 650.0), 10, &mut rng);
        assert!(!e.alive);
    }

    #[test]
    fn test_basic_recycles_at_top() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut e = enemy(EnemyKind::Basic, Vec2::new(400.0, FIELD_HEIGHT + 30.0));
        update_enemy(&mut e, 0.0, SIM_DT, Vec2::new(400.0, 650.0), 10, &mut rng);
        assert!(e.alive);
        assert!(e.pos.y < 0.0);
    }

    #[test]
    fn test_shooter_retreats_inside_standoff() {
        let mut rng = Pcg32::seed_from_u64(7);
        let player = Vec2::new(400.0, 300.0);
        let mut e = enemy(EnemyKind::Shooter, Vec2::new(380.0, 280.0));
        update_enemy(&mut e, 0.0, SIM_DT, player, 10, &mut rng);
        // Close to the player and left of them: backs off to the left
        assert!(e.vel.x < 0.0);

        let mut far = enemy(EnemyKind::Shooter, Vec2::new(50.0, 50.0));
        update_enemy(&mut far, 0.0, SIM_DT, player, 10, &mut rng);
        assert!(far.vel.x > 0.0);
    }

    #[test]
    fn test_heavy_ramps_not_snaps() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut e = enemy(EnemyKind::Heavy, Vec2::new(100.0, 100.0));
        e.vel.x = 0.0;
        update_enemy(&mut e, 0.0, SIM_DT, Vec2::new(800.0, 650.0), 10, &mut rng);
        assert!(e.vel.x > 0.0 && e.vel.x <= 6.0, "one ramp step, got {}", e.vel.x);
    }

    #[test]
    fn test_shooter_fires_five_shot_fan() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut e = enemy(EnemyKind::Shooter, Vec2::new(400.0, 100.0));
        e.next_shot_ms = 0.0;
        let shots = update_enemy(&mut e, 1.0, SIM_DT, Vec2::new(400.0, 650.0), 10, &mut rng);
        assert_eq!(shots.len(), 5);
        // Cooldown rearmed
        assert!(e.next_shot_ms > 1.0);
    }

    #[test]
    fn test_boss_pattern_cycles_and_minions() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut boss = Boss::spawn(1, 1, 0.0, &tuning);
        boss.pos.y = BOSS_ENTRY_Y; // skip the entry descent
        assert_eq!(boss.pattern, BossPattern::Sweep);

        update_boss(&mut boss, BOSS_PATTERN_MS + 1.0, SIM_DT, Vec2::new(450.0, 650.0), 10, &mut rng);
        assert_eq!(boss.pattern, BossPattern::Track);

        // Phase 1: no minions no matter how long we wait
        boss.last_minion_ms = -MINION_COOLDOWN_MS * 2.0;
        let a = update_boss(&mut boss, BOSS_PATTERN_MS + 2.0, SIM_DT, Vec2::new(450.0, 650.0), 10, &mut rng);
        assert!(a.minions.is_empty());

        // Phase 2: minions arrive once the cooldown allows
        boss.phase = 2;
        boss.last_minion_ms = -MINION_COOLDOWN_MS * 2.0;
        let a = update_boss(&mut boss, BOSS_PATTERN_MS + 3.0, SIM_DT, Vec2::new(450.0, 650.0), 10, &mut rng);
        assert!((2..=3).contains(&a.minions.len()));
    }

    #[test]
    fn test_boss_spiral_only_in_later_phases() {
        let tuning = Tuning::default();
        let mut boss = Boss::spawn(1, 1, 0.0, &tuning);
        boss.pos.y = BOSS_ENTRY_Y;
        let player = Vec2::new(450.0, 650.0);

        let v1 = boss_volley(&boss, 0.0, player, 10);
        boss.phase = 2;
        let v2 = boss_volley(&boss, 0.0, player, 10);
        assert_eq!(v2.len(), v1.len() + 8);
    }
}
