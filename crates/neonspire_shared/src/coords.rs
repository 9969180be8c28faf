use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn world_origin(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.z as f32 * chunk_size)
    }

    pub fn world_center(self, chunk_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * chunk_size,
            (self.z as f32 + 0.5) * chunk_size,
        )
    }

    pub fn world_bounds(self, chunk_size: f32) -> (Vec2, Vec2) {
        let min = self.world_origin(chunk_size);
        (min, min + Vec2::splat(chunk_size))
    }

    pub fn offset(self, dx: i32, dz: i32) -> Option<ChunkCoord> {
        Some(ChunkCoord {
            x: self.x.checked_add(dx)?,
            z: self.z.checked_add(dz)?,
        })
    }

    pub fn contains(self, chunk_size: f32, point: Vec2) -> bool {
        let (min, max) = self.world_bounds(chunk_size);
        point.x >= min.x && point.x < max.x && point.y >= min.y && point.y < max.y
    }
}

pub fn world_to_chunk(world_pos: Vec3, chunk_size: f32) -> ChunkCoord {
    ChunkCoord {
        x: (world_pos.x / chunk_size).floor() as i32,
        z: (world_pos.z / chunk_size).floor() as i32,
    }
}
