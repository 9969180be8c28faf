use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

const MIN_CHUNK_SIZE: f32 = 5.0;
const MAX_CHUNK_SIZE: f32 = 1_000.0;
const MIN_GRID_CELLS: u32 = 1;
const MAX_GRID_CELLS: u32 = 16;
pub(crate) const MIN_GRID_SPACING: f32 = 1.0;
const MAX_GRID_SPACING: f32 = 100.0;
pub(crate) const MAX_CITY_EXTENT: f32 = 5_000.0;
const MIN_BUILDING_HEIGHT: f32 = 0.5;
const MAX_BUILDING_HEIGHT: f32 = 2_000.0;
const MAX_HEIGHT_LAMBDA: f32 = 10.0;
const MAX_GROUND_ATTEMPTS: u32 = 10_000;
const MAX_GROUND_LIGHTS: u32 = 1_000;
const MAX_CLEARANCE: f32 = 100.0;
const MIN_VOLUME_EXTENT: f32 = 0.1;
const MAX_VOLUME_EXTENT: f32 = 1_000.0;
const MAX_VOLUME_INTENSITY: f32 = 1_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: f32,
    #[serde(default = "default_grid_cells_per_chunk")]
    pub grid_cells_per_chunk: u32,
    #[serde(default = "default_building_density")]
    pub building_density: f32,
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f32,
    #[serde(default = "default_city_extent")]
    pub city_width: f32,
    #[serde(default = "default_city_extent")]
    pub city_depth: f32,
    #[serde(default = "default_min_height")]
    pub min_height: f32,
    #[serde(default = "default_max_height")]
    pub max_height: f32,
    #[serde(default = "default_height_distribution_lambda")]
    pub height_distribution_lambda: f32,
    #[serde(default)]
    pub ambient: AmbientConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientConfig {
    #[serde(default = "default_ground_light_attempts")]
    pub ground_light_attempts: u32,
    #[serde(default = "default_ground_light_max_count")]
    pub ground_light_max_count: u32,
    #[serde(default = "default_ground_light_min_clearance")]
    pub ground_light_min_clearance: f32,
    #[serde(default = "default_ground_light_min_height")]
    pub ground_light_min_height: f32,
    #[serde(default = "default_ground_light_max_height")]
    pub ground_light_max_height: f32,
    #[serde(default = "default_ground_light_min_size")]
    pub ground_light_min_size: f32,
    #[serde(default = "default_ground_light_max_size")]
    pub ground_light_max_size: f32,
    #[serde(default = "default_volume_min_intensity")]
    pub ground_light_min_intensity: f32,
    #[serde(default = "default_volume_max_intensity")]
    pub ground_light_max_intensity: f32,
    #[serde(default)]
    pub enable_light_beams: bool,
    #[serde(default = "default_beam_min_height")]
    pub beam_min_height: f32,
    #[serde(default = "default_beam_max_height")]
    pub beam_max_height: f32,
    #[serde(default = "default_beam_min_radius")]
    pub beam_min_radius: f32,
    #[serde(default = "default_beam_max_radius")]
    pub beam_max_radius: f32,
    #[serde(default = "default_volume_min_intensity")]
    pub beam_min_intensity: f32,
    #[serde(default = "default_volume_max_intensity")]
    pub beam_max_intensity: f32,
    #[serde(default = "default_beam_spawn_chance")]
    pub beam_spawn_chance: f32,
    #[serde(default = "default_beam_min_building_height")]
    pub beam_min_building_height: f32,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            grid_cells_per_chunk: default_grid_cells_per_chunk(),
            building_density: default_building_density(),
            grid_spacing: default_grid_spacing(),
            city_width: default_city_extent(),
            city_depth: default_city_extent(),
            min_height: default_min_height(),
            max_height: default_max_height(),
            height_distribution_lambda: default_height_distribution_lambda(),
            ambient: AmbientConfig::default(),
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            ground_light_attempts: default_ground_light_attempts(),
            ground_light_max_count: default_ground_light_max_count(),
            ground_light_min_clearance: default_ground_light_min_clearance(),
            ground_light_min_height: default_ground_light_min_height(),
            ground_light_max_height: default_ground_light_max_height(),
            ground_light_min_size: default_ground_light_min_size(),
            ground_light_max_size: default_ground_light_max_size(),
            ground_light_min_intensity: default_volume_min_intensity(),
            ground_light_max_intensity: default_volume_max_intensity(),
            enable_light_beams: false,
            beam_min_height: default_beam_min_height(),
            beam_max_height: default_beam_max_height(),
            beam_min_radius: default_beam_min_radius(),
            beam_max_radius: default_beam_max_radius(),
            beam_min_intensity: default_volume_min_intensity(),
            beam_max_intensity: default_volume_max_intensity(),
            beam_spawn_chance: default_beam_spawn_chance(),
            beam_min_building_height: default_beam_min_building_height(),
        }
    }
}

impl CityConfig {
    pub fn sanitize(mut self) -> Self {
        self.chunk_size = self.chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        self.grid_cells_per_chunk = self
            .grid_cells_per_chunk
            .clamp(MIN_GRID_CELLS, MAX_GRID_CELLS);
        self.building_density = self.building_density.clamp(0.0, 1.0);
        self.grid_spacing = self.grid_spacing.clamp(MIN_GRID_SPACING, MAX_GRID_SPACING);
        self.city_width = self.city_width.clamp(self.grid_spacing, MAX_CITY_EXTENT);
        self.city_depth = self.city_depth.clamp(self.grid_spacing, MAX_CITY_EXTENT);
        (self.min_height, self.max_height) = ordered(
            self.min_height,
            self.max_height,
            MIN_BUILDING_HEIGHT,
            MAX_BUILDING_HEIGHT,
        );
        self.height_distribution_lambda = self
            .height_distribution_lambda
            .clamp(0.0, MAX_HEIGHT_LAMBDA);
        self.ambient = self.ambient.sanitize();
        self
    }

    pub fn from_toml_str(contents: &str) -> io::Result<Self> {
        let parsed = toml::from_str::<Self>(contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize city config: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let config = self.clone().sanitize();
        let serialized = toml::to_string_pretty(&config).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize city config: {e}"),
            )
        })?;
        fs::write(path, serialized)
    }
}

impl AmbientConfig {
    fn sanitize(mut self) -> Self {
        self.ground_light_attempts = self.ground_light_attempts.min(MAX_GROUND_ATTEMPTS);
        self.ground_light_max_count = self.ground_light_max_count.min(MAX_GROUND_LIGHTS);
        self.ground_light_min_clearance = self.ground_light_min_clearance.clamp(0.0, MAX_CLEARANCE);
        (self.ground_light_min_height, self.ground_light_max_height) = ordered(
            self.ground_light_min_height,
            self.ground_light_max_height,
            MIN_VOLUME_EXTENT,
            MAX_VOLUME_EXTENT,
        );
        (self.ground_light_min_size, self.ground_light_max_size) = ordered(
            self.ground_light_min_size,
            self.ground_light_max_size,
            MIN_VOLUME_EXTENT,
            MAX_VOLUME_EXTENT,
        );
        (self.ground_light_min_intensity, self.ground_light_max_intensity) = ordered(
            self.ground_light_min_intensity,
            self.ground_light_max_intensity,
            0.0,
            MAX_VOLUME_INTENSITY,
        );
        (self.beam_min_height, self.beam_max_height) = ordered(
            self.beam_min_height,
            self.beam_max_height,
            MIN_VOLUME_EXTENT,
            MAX_VOLUME_EXTENT,
        );
        (self.beam_min_radius, self.beam_max_radius) = ordered(
            self.beam_min_radius,
            self.beam_max_radius,
            MIN_VOLUME_EXTENT,
            MAX_VOLUME_EXTENT,
        );
        (self.beam_min_intensity, self.beam_max_intensity) = ordered(
            self.beam_min_intensity,
            self.beam_max_intensity,
            0.0,
            MAX_VOLUME_INTENSITY,
        );
        self.beam_spawn_chance = self.beam_spawn_chance.clamp(0.0, 1.0);
        self.beam_min_building_height = self
            .beam_min_building_height
            .clamp(0.0, MAX_BUILDING_HEIGHT);
        self
    }
}

fn ordered(min: f32, max: f32, lower: f32, upper: f32) -> (f32, f32) {
    let min = min.clamp(lower, upper);
    let max = max.clamp(lower, upper);
    if max < min {
        (max, min)
    } else {
        (min, max)
    }
}

fn default_chunk_size() -> f32 {
    50.0
}

fn default_grid_cells_per_chunk() -> u32 {
    5
}

fn default_building_density() -> f32 {
    0.7
}

fn default_grid_spacing() -> f32 {
    4.0
}

fn default_city_extent() -> f32 {
    200.0
}

fn default_min_height() -> f32 {
    10.0
}

fn default_max_height() -> f32 {
    50.0
}

fn default_height_distribution_lambda() -> f32 {
    2.0
}

fn default_ground_light_attempts() -> u32 {
    100
}

fn default_ground_light_max_count() -> u32 {
    20
}

fn default_ground_light_min_clearance() -> f32 {
    3.0
}

fn default_ground_light_min_height() -> f32 {
    3.0
}

fn default_ground_light_max_height() -> f32 {
    8.0
}

fn default_ground_light_min_size() -> f32 {
    3.0
}

fn default_ground_light_max_size() -> f32 {
    7.0
}

fn default_volume_min_intensity() -> f32 {
    8.0
}

fn default_volume_max_intensity() -> f32 {
    20.0
}

fn default_beam_min_height() -> f32 {
    180.0
}

fn default_beam_max_height() -> f32 {
    400.0
}

fn default_beam_min_radius() -> f32 {
    3.0
}

fn default_beam_max_radius() -> f32 {
    7.0
}

fn default_beam_spawn_chance() -> f32 {
    0.45
}

fn default_beam_min_building_height() -> f32 {
    40.0
}

#[cfg(test)]
mod tests {
    use super::CityConfig;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CityConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config, CityConfig::default());
        assert!(!config.ambient.enable_light_beams);
        assert_eq!(config.grid_cells_per_chunk, 5);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = CityConfig::from_toml_str(
            "building_density = 0.25\n\n[ambient]\nenable_light_beams = true\nground_light_max_count = 4\n",
        )
        .expect("parse partial config");
        assert_eq!(config.building_density, 0.25);
        assert!(config.ambient.enable_light_beams);
        assert_eq!(config.ambient.ground_light_max_count, 4);
        assert_eq!(config.chunk_size, 50.0);
        assert_eq!(config.ambient.ground_light_attempts, 100);
    }

    #[test]
    fn sanitize_clamps_and_orders_ranges() {
        let mut config = CityConfig::default();
        config.chunk_size = -3.0;
        config.grid_cells_per_chunk = 0;
        config.building_density = 4.0;
        config.min_height = 80.0;
        config.max_height = 20.0;
        config.ambient.beam_spawn_chance = -1.0;
        config.ambient.ground_light_min_size = 9.0;
        config.ambient.ground_light_max_size = 2.0;

        let config = config.sanitize();
        assert_eq!(config.chunk_size, 5.0);
        assert_eq!(config.grid_cells_per_chunk, 1);
        assert_eq!(config.building_density, 1.0);
        assert_eq!((config.min_height, config.max_height), (20.0, 80.0));
        assert_eq!(config.ambient.beam_spawn_chance, 0.0);
        assert_eq!(
            (config.ambient.ground_light_min_size, config.ambient.ground_light_max_size),
            (2.0, 9.0)
        );
    }

    #[test]
    fn malformed_document_is_invalid_data() {
        let err = CityConfig::from_toml_str("chunk_size = \"wide\"").expect_err("type mismatch");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = std::env::temp_dir().join(format!("neonspire-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("city.toml");

        let mut config = CityConfig::default();
        config.max_height = 120.0;
        config.ambient.enable_light_beams = true;
        config.save(&path).expect("save config");

        let loaded = CityConfig::load(&path).expect("load config");
        assert_eq!(loaded, config);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
