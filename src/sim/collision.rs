//! Collision resolution with type-specific outcomes
//!
//! Passes run in a fixed order each tick so score and damage attribution
//! never depend on entity insertion order:
//!
//! 1. player bullets x enemies
//! 2. player bullets x bosses
//! 3. enemy bullets x player
//! 4. enemies x player (ramming)
//! 5. power-ups x player
//!
//! Hits prefer mask overlap when both entities carry an occupancy mask and
//! fall back to box intersection otherwise. A uniform grid prunes candidate
//! pairs for large groups; it is an optimization only - outcomes are
//! identical to brute force, which the tests assert.
//!
//! Nothing is removed here. Dead entities get `alive = false` and the tick's
//! end-of-tick sweep compacts the groups.

use glam::Vec2;
use rand::Rng;

use super::entity::{Hitbox, SpriteMask, masks_overlap};
use super::events::{GameEvent, SoundCue};
use super::powerup;
use super::spatial::{GRID_THRESHOLD, UniformGrid};
use super::state::{DamageOutcome, GameState, Particle};
use crate::consts::MAX_PARTICLES;

/// What one resolution pass over all groups produced
#[derive(Debug, Default, Clone, Copy)]
pub struct CollisionReport {
    pub score_delta: u64,
    pub enemies_killed: u32,
    pub bosses_killed: u32,
    pub powerups_collected: u32,
    /// Damage that actually landed on the player this tick
    pub player_damage: u32,
    /// Player shots that hit something (accuracy tracking)
    pub shots_landed: u32,
}

/// Mask overlap when both sides have one, box intersection otherwise
fn hit_test(a: &Hitbox, a_mask: Option<&SpriteMask>, b: &Hitbox, b_mask: Option<&SpriteMask>) -> bool {
    match (a_mask, b_mask) {
        (Some(am), Some(bm)) => masks_overlap(a, am, b, bm),
        _ => a.intersects(b),
    }
}

fn spawn_burst(particles: &mut Vec<Particle>, rng: &mut impl Rng, pos: Vec2, color: u32, count: usize) {
    for _ in 0..count {
        if particles.len() >= MAX_PARTICLES {
            particles.remove(0);
        }
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random_range(60.0..300.0);
        particles.push(Particle {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            color,
            life: 1.0,
            size: rng.random_range(2.0..6.0),
        });
    }
}

/// Run every collision pass for this tick
pub fn resolve(state: &mut GameState) -> CollisionReport {
    resolve_inner(state, true)
}

fn resolve_inner(state: &mut GameState, allow_grid: bool) -> CollisionReport {
    let mut report = CollisionReport::default();
    let now = state.elapsed_ms;

    // Split the state into disjoint borrows; each pass touches different
    // groups plus the shared event/particle sinks.
    let GameState {
        player,
        enemies,
        bosses,
        player_bullets,
        enemy_bullets,
        powerups,
        events,
        particles,
        rng,
        tuning,
        ..
    } = state;

    // --- Pass 1: player bullets x enemies ---
    let grid = if allow_grid && enemies.len() * player_bullets.len() > GRID_THRESHOLD * GRID_THRESHOLD {
        Some(UniformGrid::build(
            enemies.iter().enumerate().filter(|(_, e)| e.alive).map(|(i, e)| (i, e.hitbox())),
        ))
    } else {
        None
    };

    for bullet in player_bullets.iter_mut().filter(|b| b.alive) {
        let bullet_box = bullet.hitbox();
        let candidates: Vec<usize> = match &grid {
            Some(g) => g.candidates(&bullet_box),
            None => (0..enemies.len()).collect(),
        };

        for ei in candidates {
            if !bullet.alive {
                break;
            }
            if !enemies[ei].alive {
                continue;
            }
            let enemy_box = enemies[ei].hitbox();
            if !hit_test(&bullet_box, None, &enemy_box, enemies[ei].mask()) {
                continue;
            }

            report.shots_landed += 1;
            let pos = enemies[ei].pos;
            if enemies[ei].apply_damage(bullet.damage, now) {
                enemies[ei].alive = false;
                report.enemies_killed += 1;
                report.score_delta += enemies[ei].score_value;
                events.push(GameEvent::Score(enemies[ei].score_value));
                events.push(GameEvent::explosion(pos, 40.0));
                events.push(GameEvent::sound(SoundCue::Explosion));
                events.push(GameEvent::ScreenShake { intensity: 3.0, duration_ms: 200.0 });
                spawn_burst(particles, rng, pos, 1, 20);
            } else {
                events.push(GameEvent::hit_flash(pos));
                events.push(GameEvent::Sound { cue: SoundCue::Hit, volume: 0.3 });
            }

            if bullet.blast_radius > 0.0 {
                // Splash damage to everything nearby; the rocket is spent
                let blast_pos = bullet.pos;
                let radius_sq = bullet.blast_radius * bullet.blast_radius;
                for other in enemies.iter_mut().filter(|e| e.alive) {
                    if other.pos.distance_squared(blast_pos) <= radius_sq
                        && other.apply_damage(bullet.damage, now)
                    {
                        other.alive = false;
                        report.enemies_killed += 1;
                        report.score_delta += other.score_value;
                        events.push(GameEvent::Score(other.score_value));
                        events.push(GameEvent::explosion(other.pos, 40.0));
                    }
                }
                events.push(GameEvent::explosion(blast_pos, bullet.blast_radius));
                bullet.alive = false;
            } else {
                bullet.penetration = bullet.penetration.saturating_sub(1);
                if bullet.penetration == 0 {
                    bullet.alive = false;
                }
            }
        }
    }

    // --- Pass 2: player bullets x bosses ---
    for bullet in player_bullets.iter_mut().filter(|b| b.alive) {
        let bullet_box = bullet.hitbox();
        for boss in bosses.iter_mut().filter(|b| b.alive) {
            if !bullet.alive {
                break;
            }
            if !hit_test(&bullet_box, None, &boss.hitbox(), boss.mask()) {
                continue;
            }

            report.shots_landed += 1;
            if boss.apply_damage(bullet.damage, now) {
                boss.alive = false;
                report.bosses_killed += 1;
                let value = boss.score_value(tuning);
                report.score_delta += value;
                events.push(GameEvent::Score(value));
                // Boss death gets a whole fireworks burst
                for i in -2i32..=2 {
                    let offset = Vec2::new(i as f32 * 20.0, i as f32 * 15.0);
                    events.push(GameEvent::explosion(boss.pos + offset, 60.0));
                }
                events.push(GameEvent::sound(SoundCue::BossExplosion));
                events.push(GameEvent::ScreenShake { intensity: 8.0, duration_ms: 500.0 });
                spawn_burst(particles, rng, boss.pos, 2, 60);
            } else {
                events.push(GameEvent::hit_flash(boss.pos));
                events.push(GameEvent::Sound { cue: SoundCue::BossHit, volume: 0.5 });
                events.push(GameEvent::ScreenShake { intensity: 2.0, duration_ms: 150.0 });
            }

            bullet.penetration = bullet.penetration.saturating_sub(1);
            if bullet.penetration == 0 {
                bullet.alive = false;
            }
        }
    }

    // --- Pass 3: enemy bullets x player ---
    let player_box = player.hitbox();
    for bullet in enemy_bullets.iter_mut().filter(|b| b.alive) {
        if !hit_test(&bullet.hitbox(), None, &player_box, player.mask()) {
            continue;
        }
        // The shot is always spent, even against a shield
        bullet.alive = false;
        match player.apply_damage(bullet.damage, now) {
            DamageOutcome::Blocked => {}
            _ => {
                report.player_damage += bullet.damage as u32;
                events.push(GameEvent::hit_flash(player.pos));
                events.push(GameEvent::sound(SoundCue::PlayerHit));
                events.push(GameEvent::ScreenShake { intensity: 5.0, duration_ms: 300.0 });
            }
        }
    }

    // --- Pass 4: enemies x player (ramming) ---
    for enemy in enemies.iter_mut().filter(|e| e.alive) {
        if !hit_test(&enemy.hitbox(), enemy.mask(), &player_box, player.mask()) {
            continue;
        }
        // The rammer dies no matter what the player's shield says
        enemy.alive = false;
        events.push(GameEvent::explosion(enemy.pos, 35.0));
        events.push(GameEvent::sound(SoundCue::Explosion));
        events.push(GameEvent::ScreenShake { intensity: 4.0, duration_ms: 250.0 });
        spawn_burst(particles, rng, enemy.pos, 1, 15);

        match player.apply_damage(tuning.collision_damage, now) {
            DamageOutcome::Blocked => {}
            _ => report.player_damage += tuning.collision_damage as u32,
        }
    }

    // --- Pass 5: power-ups x player ---
    for pickup in powerups.iter_mut().filter(|p| p.alive) {
        if !pickup.hitbox().intersects(&player_box) {
            continue;
        }
        pickup.alive = false;
        report.powerups_collected += 1;
        report.score_delta += tuning.score.powerup;
        events.push(GameEvent::Score(tuning.score.powerup));
        events.push(GameEvent::sound(SoundCue::PowerUp));

        let applied = powerup::apply(pickup.kind, player, enemies, events, tuning, now);
        report.score_delta += applied.score;
        report.enemies_killed += applied.enemies_killed;
    }

    report
}
