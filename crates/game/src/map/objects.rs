use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapObjectKind {
    Ground,
    StaticBox,
}

#[derive(Debug, Clone)]
pub struct MapObject {
    pub kind: MapObjectKind,
    pub position: Vec3,
    pub half_extents: Vec3,
}

impl MapObject {
    pub fn ground(y: f32, half_size: f32) -> Self {
        Self {
            kind: MapObjectKind::Ground,
            position: Vec3::new(0.0, y, 0.0),
            half_extents: Vec3::new(half_size, 0.1, half_size),
        }
    }

    pub fn static_box(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            kind: MapObjectKind::StaticBox,
            position,
            half_extents,
        }
    }

    /// Height of the top face.
    pub fn top(&self) -> f32 {
        match self.kind {
            MapObjectKind::Ground => self.position.y,
            MapObjectKind::StaticBox => self.position.y + self.half_extents.y,
        }
    }
}
