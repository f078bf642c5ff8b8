mod layers;
mod query;
mod world;

pub use layers::CollisionLayers;
pub use query::{CharacterMotor, ColliderId, GeometryQuery, MotorMove, RayHit};
pub use world::{ActorShape, PhysicsWorld};
