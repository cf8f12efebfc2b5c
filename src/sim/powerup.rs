//! Power-up effect application and timed-effect expiry
//!
//! Every timed effect records its expiry on the sim clock at activation and
//! the per-tick sweep reverts it exactly once. Reverts restore by inverse
//! operation (divide a speed multiplier back out) or by saved value (rapid
//! fire, whose floor clamp makes division inexact), so effects compose.

use rand::Rng;

use super::entity::{Enemy, PowerUpKind};
use super::events::{GameEvent, SoundCue};
use super::state::{Player, RapidFire, SpeedBoost};
use crate::consts::FIRE_INTERVAL_FLOOR_MS;
use crate::tuning::Tuning;

/// Side totals from applying one pickup
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyResult {
    /// Extra score beyond the pickup's own value (Ultrakill kills)
    pub score: u64,
    pub enemies_killed: u32,
}

/// Weighted drop table, tilted toward the bread-and-butter pickups
pub fn roll_kind(rng: &mut impl Rng) -> PowerUpKind {
    use PowerUpKind::*;
    *crate::weighted_choice(
        rng,
        &[
            (Health, 0.3),
            (GunUpgrade, 0.25),
            (Shield, 0.2),
            (Speed, 0.1),
            (RapidFire, 0.1),
            (Life, 0.03),
            (Ultrakill, 0.02),
        ],
    )
}

/// Dispatch one collected pickup onto the player (or, for Ultrakill, onto
/// every live enemy - bosses are explicitly exempt).
pub fn apply(
    kind: PowerUpKind,
    player: &mut Player,
    enemies: &mut [Enemy],
    events: &mut Vec<GameEvent>,
    tuning: &Tuning,
    now_ms: f32,
) -> ApplyResult {
    let mut result = ApplyResult::default();
    match kind {
        PowerUpKind::Shield => {
            // Reapplication refreshes the window; it never stacks
            player.effects.shield_until_ms = Some(now_ms + tuning.durations.shield_ms);
        }
        PowerUpKind::GunUpgrade => {
            player.weapon = player.weapon.upgraded();
            player.effects.weapon_until_ms = Some(now_ms + tuning.durations.gun_upgrade_ms);
        }
        PowerUpKind::Health => {
            player.heal(tuning.heal_amount);
        }
        PowerUpKind::Life => {
            player.lives += 1;
        }
        PowerUpKind::Speed => {
            player.max_speed *= tuning.speed_boost_factor;
            player.effects.speed_boosts.push(SpeedBoost {
                factor: tuning.speed_boost_factor,
                until_ms: now_ms + tuning.durations.speed_boost_ms,
            });
        }
        PowerUpKind::RapidFire => {
            match &mut player.effects.rapid_fire {
                Some(active) => {
                    // Already firing fast - just refresh the timer
                    active.until_ms = now_ms + tuning.durations.rapid_fire_ms;
                }
                None => {
                    let saved = player.fire_interval_ms;
                    player.fire_interval_ms = (saved / 2.0).max(FIRE_INTERVAL_FLOOR_MS);
                    player.effects.rapid_fire = Some(RapidFire {
                        saved_interval_ms: saved,
                        until_ms: now_ms + tuning.durations.rapid_fire_ms,
                    });
                }
            }
        }
        PowerUpKind::Ultrakill => {
            // Wipe the trash; bosses shrug it off. Empty field is a no-op.
            for enemy in enemies.iter_mut().filter(|e| e.alive) {
                enemy.alive = false;
                result.enemies_killed += 1;
                result.score += enemy.score_value;
                events.push(GameEvent::Score(enemy.score_value));
                events.push(GameEvent::explosion(enemy.pos, 40.0));
            }
            events.push(GameEvent::sound(SoundCue::Ultrakill));
            events.push(GameEvent::ScreenShake { intensity: 10.0, duration_ms: 800.0 });
        }
    }
    result
}

/// Revert every expired timed effect, exactly once each
pub fn expire_effects(player: &mut Player, now_ms: f32) {
    let effects = &mut player.effects;

    if effects.shield_until_ms.is_some_and(|t| now_ms >= t) {
        effects.shield_until_ms = None;
    }
    if effects.protection_until_ms.is_some_and(|t| now_ms >= t) {
        effects.protection_until_ms = None;
    }
    if effects.weapon_until_ms.is_some_and(|t| now_ms >= t) {
        effects.weapon_until_ms = None;
        player.weapon = super::state::WeaponKind::Basic;
    }

    // Unwind expired speed boosts by dividing their factor back out, so
    // overlapping boosts compose and the baseline survives intact
    let mut i = 0;
    while i < effects.speed_boosts.len() {
        if now_ms >= effects.speed_boosts[i].until_ms {
            let boost = effects.speed_boosts.remove(i);
            player.max_speed /= boost.factor;
        } else {
            i += 1;
        }
    }

    if let Some(rapid) = effects.rapid_fire
        && now_ms >= rapid.until_ms
    {
        player.fire_interval_ms = rapid.saved_interval_ms;
        effects.rapid_fire = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ShipKind;
    use proptest::prelude::*;

    fn player() -> Player {
        Player::new(ShipKind::Fighter)
    }

    fn apply_simple(kind: PowerUpKind, p: &mut Player, now: f32) -> ApplyResult {
        let tuning = Tuning::default();
        let mut events = Vec::new();
        apply(kind, p, &mut [], &mut events, &tuning, now)
    }

    #[test]
    fn test_shield_refreshes_not_stacks() {
        let mut p = player();
        let tuning = Tuning::default();

        apply_simple(PowerUpKind::Shield, &mut p, 1000.0);
        assert_eq!(p.effects.shield_until_ms, Some(1000.0 + tuning.durations.shield_ms));

        // Second pickup 2s later: one window starting at the second pickup,
        // not 2x duration
        apply_simple(PowerUpKind::Shield, &mut p, 3000.0);
        assert_eq!(p.effects.shield_until_ms, Some(3000.0 + tuning.durations.shield_ms));
    }

    #[test]
    fn test_gun_upgrade_chain_and_expiry() {
        let mut p = player();
        apply_simple(PowerUpKind::GunUpgrade, &mut p, 0.0);
        assert_eq!(p.weapon, crate::sim::state::WeaponKind::Double);
        apply_simple(PowerUpKind::GunUpgrade, &mut p, 0.0);
        apply_simple(PowerUpKind::GunUpgrade, &mut p, 0.0);
        apply_simple(PowerUpKind::GunUpgrade, &mut p, 0.0);
        assert_eq!(p.weapon, crate::sim::state::WeaponKind::Spread);

        expire_effects(&mut p, 100_000.0);
        assert_eq!(p.weapon, crate::sim::state::WeaponKind::Basic);
        assert!(p.effects.weapon_until_ms.is_none());
    }

    #[test]
    fn test_speed_boost_exact_round_trip() {
        let mut p = player();
        let base = p.max_speed;
        apply_simple(PowerUpKind::Speed, &mut p, 0.0);
        assert!(p.max_speed > base);
        expire_effects(&mut p, 100_000.0);
        assert_eq!(p.max_speed, base);
    }

    #[test]
    fn test_rapid_fire_floor_and_restore() {
        let mut p = player();
        p.fire_interval_ms = 150.0;
        apply_simple(PowerUpKind::RapidFire, &mut p, 0.0);
        // Half of 150 clamps to the floor
        assert_eq!(p.fire_interval_ms, FIRE_INTERVAL_FLOOR_MS);
        expire_effects(&mut p, 100_000.0);
        // Restored to the saved value, not floor * 2
        assert_eq!(p.fire_interval_ms, 150.0);
    }

    #[test]
    fn test_rapid_fire_reapply_refreshes() {
        let mut p = player();
        let base = p.fire_interval_ms;
        apply_simple(PowerUpKind::RapidFire, &mut p, 0.0);
        let halved = p.fire_interval_ms;
        apply_simple(PowerUpKind::RapidFire, &mut p, 1000.0);
        // Not halved twice
        assert_eq!(p.fire_interval_ms, halved);
        expire_effects(&mut p, 100_000.0);
        assert_eq!(p.fire_interval_ms, base);
    }

    #[test]
    fn test_life_uncapped() {
        let mut p = player();
        for _ in 0..10 {
            apply_simple(PowerUpKind::Life, &mut p, 0.0);
        }
        assert_eq!(p.lives, crate::consts::PLAYER_LIVES + 10);
    }

    #[test]
    fn test_ultrakill_empty_field_is_noop() {
        let mut p = player();
        let result = apply_simple(PowerUpKind::Ultrakill, &mut p, 0.0);
        assert_eq!(result.enemies_killed, 0);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_drop_table_covers_common_kinds() {
        use rand::SeedableRng;
        let mut rng = rand_pcg::Pcg32::seed_from_u64(123);
        let mut saw_health = false;
        let mut saw_gun = false;
        for _ in 0..200 {
            match roll_kind(&mut rng) {
                PowerUpKind::Health => saw_health = true,
                PowerUpKind::GunUpgrade => saw_gun = true,
                _ => {}
            }
        }
        assert!(saw_health && saw_gun);
    }

    proptest! {
        /// N stacked speed boosts expiring in any interleaving always return
        /// max_speed to its exact pre-boost value.
        #[test]
        fn prop_stacked_speed_boosts_unwind(count in 1usize..6, gap_ms in 100.0f32..5000.0) {
            let mut p = player();
            let base = p.max_speed;
            for i in 0..count {
                apply_simple(PowerUpKind::Speed, &mut p, i as f32 * gap_ms);
            }
            // Let them all expire, sweeping a few times along the way
            for step in 0..=count {
                expire_effects(&mut p, 50_000.0 + step as f32 * gap_ms);
            }
            expire_effects(&mut p, 1_000_000.0);
            prop_assert!(p.effects.speed_boosts.is_empty());
            prop_assert!((p.max_speed - base).abs() < 1e-3);
        }
    }
}
