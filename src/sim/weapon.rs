//! Player weapon fire patterns
//!
//! Each tier maps to a volley shape. Firing itself is gated by the player's
//! cooldown in the tick; this module only describes what leaves the muzzle.

use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

use super::entity::ProjectileSpawn;
use super::state::WeaponKind;
use crate::consts::BULLET_SPEED;

/// Angle between fan bullets (radians)
const SPREAD_ANGLE: f32 = 0.2;

/// Build the volley for one trigger pull from the ship's nose position
pub fn fire(weapon: WeaponKind, nose: Vec2, damage: i32) -> Vec<ProjectileSpawn> {
    let up = Vec2::new(0.0, -BULLET_SPEED);
    match weapon {
        WeaponKind::Basic => vec![ProjectileSpawn::bullet(nose, up, damage)],
        WeaponKind::Double => vec![
            ProjectileSpawn::bullet(nose + Vec2::new(-10.0, 0.0), up, damage),
            ProjectileSpawn::bullet(nose + Vec2::new(10.0, 0.0), up, damage),
        ],
        WeaponKind::Triple => vec![
            ProjectileSpawn::bullet(nose, up, damage),
            ProjectileSpawn::spread(nose, -FRAC_PI_2 - SPREAD_ANGLE, damage),
            ProjectileSpawn::spread(nose, -FRAC_PI_2 + SPREAD_ANGLE, damage),
        ],
        WeaponKind::Spread => {
            // Five-bullet fan centered straight up
            (0..5)
                .map(|i| {
                    let angle = -FRAC_PI_2 - SPREAD_ANGLE * 2.0 + i as f32 * SPREAD_ANGLE;
                    ProjectileSpawn::spread(nose, angle, damage)
                })
                .collect()
        }
        WeaponKind::Laser => vec![ProjectileSpawn::laser(nose)],
        WeaponKind::Homing => vec![ProjectileSpawn::homing(nose)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::ProjectileKind;

    const NOSE: Vec2 = Vec2::new(450.0, 630.0);

    #[test]
    fn test_volley_sizes() {
        assert_eq!(fire(WeaponKind::Basic, NOSE, 1).len(), 1);
        assert_eq!(fire(WeaponKind::Double, NOSE, 1).len(), 2);
        assert_eq!(fire(WeaponKind::Triple, NOSE, 1).len(), 3);
        assert_eq!(fire(WeaponKind::Spread, NOSE, 1).len(), 5);
        assert_eq!(fire(WeaponKind::Laser, NOSE, 1).len(), 1);
        assert_eq!(fire(WeaponKind::Homing, NOSE, 1).len(), 1);
    }

    #[test]
    fn test_every_volley_travels_upward() {
        for weapon in [
            WeaponKind::Basic,
            WeaponKind::Double,
            WeaponKind::Triple,
            WeaponKind::Spread,
            WeaponKind::Laser,
            WeaponKind::Homing,
        ] {
            for shot in fire(weapon, NOSE, 1) {
                assert!(shot.vel.y < 0.0, "{weapon:?} shot heads down");
            }
        }
    }

    #[test]
    fn test_spread_fan_is_symmetric() {
        let volley = fire(WeaponKind::Spread, NOSE, 1);
        let center = &volley[2];
        assert!(center.vel.x.abs() < 1e-3);
        assert!((volley[0].vel.x + volley[4].vel.x).abs() < 1e-3);
        assert!((volley[1].vel.x + volley[3].vel.x).abs() < 1e-3);
    }

    #[test]
    fn test_laser_penetrates() {
        let volley = fire(WeaponKind::Laser, NOSE, 1);
        assert_eq!(volley[0].kind, ProjectileKind::Laser);
        assert_eq!(volley[0].penetration, 3);
        assert!(volley[0].vel.length() > BULLET_SPEED);
    }
}
