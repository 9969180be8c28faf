use std::ops::Range;

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace, warn};

use crate::building::Building;
use crate::chunk::{push_building, ChunkContent, ChunkRecord};
use crate::config::{CityConfig, MAX_CITY_EXTENT, MIN_GRID_SPACING};
use crate::coords::{world_to_chunk, ChunkCoord};
use crate::neon::NeonLight;
use crate::rng::{unit, CityRng};
use crate::volumes::{add_ground_volumes, LightVolume};

#[derive(Debug, Default)]
pub struct CityGenerator {
    config: CityConfig,
    buildings: Vec<Building>,
    neon_lights: Vec<NeonLight>,
    light_volumes: Vec<LightVolume>,
    chunks: FxHashMap<ChunkCoord, ChunkRecord>,
}

impl CityGenerator {
    pub fn new(config: CityConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CityConfig {
        &self.config
    }

    pub fn set_city_size(&mut self, width: f32, depth: f32) {
        self.config.city_width = width;
        self.config.city_depth = depth;
    }

    pub fn set_building_density(&mut self, density: f32) {
        self.config.building_density = density;
    }

    pub fn set_min_height(&mut self, height: f32) {
        self.config.min_height = height;
    }

    pub fn set_max_height(&mut self, height: f32) {
        self.config.max_height = height;
    }

    pub fn set_height_distribution_lambda(&mut self, lambda: f32) {
        self.config.height_distribution_lambda = lambda;
    }

    pub fn set_grid_spacing(&mut self, spacing: f32) {
        self.config.grid_spacing = spacing;
    }

    pub fn set_chunk_size(&mut self, size: f32) {
        self.config.chunk_size = size;
    }

    pub fn chunk_size(&self) -> f32 {
        self.config.chunk_size
    }

    pub fn world_to_chunk(&self, world_pos: Vec3) -> ChunkCoord {
        world_to_chunk(world_pos, self.config.chunk_size)
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn neon_lights(&self) -> &[NeonLight] {
        &self.neon_lights
    }

    pub fn light_volumes(&self) -> &[LightVolume] {
        &self.light_volumes
    }

    pub fn chunk_record(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
        self.chunks.get(&coord)
    }

    pub fn is_chunk_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn chunk_buildings(&self, coord: ChunkCoord) -> &[Building] {
        self.chunk_slice(coord, &self.buildings, |record| record.building_indices())
    }

    pub fn chunk_neon_lights(&self, coord: ChunkCoord) -> &[NeonLight] {
        self.chunk_slice(coord, &self.neon_lights, |record| record.neon_indices())
    }

    pub fn chunk_light_volumes(&self, coord: ChunkCoord) -> &[LightVolume] {
        self.chunk_slice(coord, &self.light_volumes, |record| {
            record.light_volume_indices()
        })
    }

    fn chunk_slice<'a, T>(
        &self,
        coord: ChunkCoord,
        items: &'a [T],
        range: impl FnOnce(&ChunkRecord) -> Range<usize>,
    ) -> &'a [T] {
        match self.chunks.get(&coord) {
            Some(record) => &items[range(record)],
            None => &[],
        }
    }

    pub fn generate_chunk(&mut self, coord: ChunkCoord, world_seed: u64) -> bool {
        if self.is_chunk_loaded(coord) {
            trace!("chunk {:?} already loaded", coord);
            return false;
        }
        let content = ChunkContent::generate(coord, world_seed, &self.config);
        self.commit_chunk(content)
    }

    /// Appends content generated elsewhere (for example on a worker thread)
    /// and records its ranges. `content` must come from
    /// [`ChunkContent::generate`] with this generator's config. Returns
    /// `false` and drops the content when its chunk is already loaded.
    pub fn commit_chunk(&mut self, content: ChunkContent) -> bool {
        let coord = content.coord;
        if self.is_chunk_loaded(coord) {
            trace!("dropping duplicate content for chunk {:?}", coord);
            return false;
        }

        let record = ChunkRecord {
            buildings: append(&mut self.buildings, content.buildings),
            neon_lights: append(&mut self.neon_lights, content.neon_lights),
            light_volumes: append(&mut self.light_volumes, content.light_volumes),
        };
        debug!(
            "chunk ({}, {}): {} buildings, {} neon lights, {} light volumes",
            coord.x,
            coord.z,
            record.buildings.len(),
            record.neon_lights.len(),
            record.light_volumes.len()
        );
        self.chunks.insert(coord, record);
        true
    }

    /// Removes chunk `coord` and its entries. Returns `false` when it was not
    /// loaded. Invalidates indices and references into the arrays.
    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> bool {
        let Some(removed) = self.chunks.remove(&coord) else {
            trace!("chunk {:?} not loaded, nothing to remove", coord);
            return false;
        };

        self.buildings.drain(removed.building_indices());
        self.neon_lights.drain(removed.neon_indices());
        self.light_volumes.drain(removed.light_volume_indices());
        for record in self.chunks.values_mut() {
            record.shift_past(&removed);
        }

        debug!(
            "removed chunk ({}, {}): {} buildings, {} neon lights, {} light volumes",
            coord.x,
            coord.z,
            removed.buildings.len(),
            removed.neon_lights.len(),
            removed.light_volumes.len()
        );
        true
    }

    pub fn clear_all_chunks(&mut self) {
        self.buildings.clear();
        self.neon_lights.clear();
        self.light_volumes.clear();
        self.chunks.clear();
    }

    pub fn generate_city(&mut self, seed: u64) {
        self.clear_all_chunks();
        let mut rng = CityRng::seed_from_u64(seed);

        let spacing = self.config.grid_spacing;
        let columns = sites_along(self.config.city_width, spacing);
        let rows = sites_along(self.config.city_depth, spacing);
        if columns == 0 || rows == 0 {
            warn!(
                "city of {} x {} with spacing {} has no building sites",
                self.config.city_width, self.config.city_depth, spacing
            );
        }
        for x in 0..columns {
            for z in 0..rows {
                if unit(&mut rng) > self.config.building_density {
                    continue;
                }
                push_building(
                    &mut rng,
                    Vec2::new(x as f32 * spacing, z as f32 * spacing),
                    &self.config,
                    &mut self.buildings,
                    &mut self.neon_lights,
                    &mut self.light_volumes,
                );
            }
        }
        add_ground_volumes(
            &mut rng,
            &self.buildings,
            &self.config.ambient,
            &mut self.light_volumes,
        );

        info!(
            "generated city with {} buildings, {} neon lights and {} light volumes",
            self.buildings.len(),
            self.neon_lights.len(),
            self.light_volumes.len()
        );
    }
}

fn sites_along(extent: f32, spacing: f32) -> u32 {
    if !(spacing > 0.0) || !(extent > 0.0) {
        return 0;
    }
    let max_sites = (MAX_CITY_EXTENT / MIN_GRID_SPACING) as u32;
    ((extent / spacing).floor() as u32).min(max_sites)
}

fn append<T>(items: &mut Vec<T>, new_items: Vec<T>) -> Range<usize> {
    let start = items.len();
    items.extend(new_items);
    start..items.len()
}
