use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub lifetime: f32,
    pub damage: f32,
    /// Splash radius around the impact point; zero hits a single target.
    pub area_of_effect: f32,
    pub homing: f32,
    /// Distance in front of the eye the projectile is launched from.
    pub muzzle_offset: f32,
    pub eye_height: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 900.0,
            lifetime: 3.0,
            damage: 1.0,
            area_of_effect: 0.0,
            homing: 0.0,
            muzzle_offset: 0.8,
            eye_height: 0.6,
        }
    }
}

impl ProjectileConfig {
    pub fn rocket() -> Self {
        Self {
            speed: 60.0,
            area_of_effect: 4.0,
            ..Self::default()
        }
    }
}
