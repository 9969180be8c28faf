use std::ops::Range;

use glam::Vec2;
use rand::Rng;

use crate::building::{generate_building, Building};
use crate::config::CityConfig;
use crate::coords::ChunkCoord;
use crate::neon::{add_facade_lights, NeonLight};
use crate::rng::{chunk_rng, unit};
use crate::volumes::{add_beam_volumes, add_ground_volumes, LightVolume};

const SITE_JITTER: f32 = 0.3;

#[derive(Clone, Debug, PartialEq)]
pub struct ChunkContent {
    pub coord: ChunkCoord,
    pub buildings: Vec<Building>,
    pub neon_lights: Vec<NeonLight>,
    pub light_volumes: Vec<LightVolume>,
}

impl ChunkContent {
    pub fn generate(coord: ChunkCoord, world_seed: u64, config: &CityConfig) -> Self {
        let mut rng = chunk_rng(world_seed, coord);
        let mut content = Self {
            coord,
            buildings: Vec::new(),
            neon_lights: Vec::new(),
            light_volumes: Vec::new(),
        };

        let cells = config.grid_cells_per_chunk.max(1);
        let cell_size = config.chunk_size / cells as f32;
        let center = cells / 2;
        let origin = coord.world_origin(config.chunk_size);

        for x in 0..cells {
            for z in 0..cells {
                // The center site is always built so no chunk comes out empty.
                let is_center = x == center && z == center;
                if !is_center && unit(&mut rng) > config.building_density {
                    continue;
                }

                let mut local = Vec2::new(
                    (x as f32 + 0.5) * cell_size,
                    (z as f32 + 0.5) * cell_size,
                );
                if !is_center {
                    local.x += (unit(&mut rng) - 0.5) * cell_size * SITE_JITTER;
                    local.y += (unit(&mut rng) - 0.5) * cell_size * SITE_JITTER;
                }

                push_building(
                    &mut rng,
                    origin + local,
                    config,
                    &mut content.buildings,
                    &mut content.neon_lights,
                    &mut content.light_volumes,
                );
            }
        }

        add_ground_volumes(
            &mut rng,
            &content.buildings,
            &config.ambient,
            &mut content.light_volumes,
        );
        content
    }
}

pub(crate) fn push_building<R: Rng + ?Sized>(
    rng: &mut R,
    ground: Vec2,
    config: &CityConfig,
    buildings: &mut Vec<Building>,
    neon_lights: &mut Vec<NeonLight>,
    light_volumes: &mut Vec<LightVolume>,
) {
    let building = generate_building(rng, ground, config);
    add_facade_lights(rng, &building, neon_lights);
    add_beam_volumes(rng, &building, &config.ambient, light_volumes);
    buildings.push(building);
}

/// Where a loaded chunk's entries sit in the city's flat arrays. A chunk's
/// entries are always contiguous because a chunk is committed in one step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkRecord {
    pub buildings: Range<usize>,
    pub neon_lights: Range<usize>,
    pub light_volumes: Range<usize>,
}

impl ChunkRecord {
    pub fn building_indices(&self) -> Range<usize> {
        self.buildings.clone()
    }

    pub fn neon_indices(&self) -> Range<usize> {
        self.neon_lights.clone()
    }

    pub fn light_volume_indices(&self) -> Range<usize> {
        self.light_volumes.clone()
    }

    /// Moves this record down past the entries of `removed`, which have just
    /// been drained from the arrays. Records stored before `removed` stay put.
    pub(crate) fn shift_past(&mut self, removed: &ChunkRecord) {
        shift_range(&mut self.buildings, &removed.buildings);
        shift_range(&mut self.neon_lights, &removed.neon_lights);
        shift_range(&mut self.light_volumes, &removed.light_volumes);
    }
}

fn shift_range(range: &mut Range<usize>, removed: &Range<usize>) {
    if range.start >= removed.end {
        let len = removed.len();
        range.start -= len;
        range.end -= len;
    }
}
