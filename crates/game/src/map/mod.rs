mod arena;
mod objects;

pub use arena::Arena;
pub use objects::{MapObject, MapObjectKind};
