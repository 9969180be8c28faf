pub mod building;
pub mod chunk;
pub mod city;
pub mod config;
pub mod coords;
pub mod neon;
pub mod rng;
pub mod volumes;

pub use building::{Attachment, Building, BuildingPart, PartId};
pub use chunk::{ChunkContent, ChunkRecord};
pub use city::CityGenerator;
pub use config::{AmbientConfig, CityConfig};
pub use coords::{world_to_chunk, ChunkCoord};
pub use neon::{Face, NeonLight};
pub use volumes::{LightVolume, VolumeShape};
