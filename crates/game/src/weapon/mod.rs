mod config;
mod damage;
mod projectile;

pub use config::ProjectileConfig;
pub use damage::{DamageEvent, DamageLedger};
pub use projectile::{
    Impact, ImpactKind, Projectile, ProjectileId, ProjectileState, ProjectileTick,
};
