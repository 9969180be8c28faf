use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::building::Building;
use crate::config::AmbientConfig;
use crate::rng::{between, unit};

pub const GROUND_PALETTE: [Vec3; 5] = [
    Vec3::new(0.2, 1.0, 1.2),
    Vec3::new(1.0, 0.3, 1.0),
    Vec3::new(1.2, 0.6, 0.2),
    Vec3::new(0.3, 0.5, 1.3),
    Vec3::new(1.0, 0.4, 0.8),
];

pub const BEAM_PALETTE: [Vec3; 3] = [
    Vec3::new(0.3, 1.2, 1.5),
    Vec3::new(0.5, 0.9, 1.4),
    Vec3::new(0.8, 1.0, 1.5),
];

const BEAM_ROOF_SPREAD: f32 = 0.3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeShape {
    Cube,
    Beam,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightVolume {
    pub base_position: Vec3,
    pub height: f32,
    pub base_radius: f32,
    pub color: Vec3,
    pub intensity: f32,
    pub shape: VolumeShape,
}

impl LightVolume {
    pub fn is_beam(&self) -> bool {
        self.shape == VolumeShape::Beam
    }
}

pub fn add_ground_volumes<R: Rng + ?Sized>(
    rng: &mut R,
    buildings: &[Building],
    config: &AmbientConfig,
    out: &mut Vec<LightVolume>,
) -> usize {
    let Some((min, max)) = footprint_bounds(buildings) else {
        return 0;
    };

    let max_count = config.ground_light_max_count as usize;
    let mut placed = 0;
    for _ in 0..config.ground_light_attempts {
        if placed >= max_count {
            break;
        }

        let point = Vec3::new(
            min.x + unit(rng) * (max.x - min.x),
            0.0,
            min.y + unit(rng) * (max.y - min.y),
        );
        if !is_clear(point, buildings, config.ground_light_min_clearance) {
            continue;
        }

        let height = between(rng, config.ground_light_min_height, config.ground_light_max_height);
        let base_radius = between(rng, config.ground_light_min_size, config.ground_light_max_size);
        let color = ground_color(rng);
        let intensity = between(
            rng,
            config.ground_light_min_intensity,
            config.ground_light_max_intensity,
        );
        out.push(LightVolume {
            base_position: point,
            height,
            base_radius,
            color,
            intensity,
            shape: VolumeShape::Cube,
        });
        placed += 1;
    }
    placed
}

pub fn add_beam_volumes<R: Rng + ?Sized>(
    rng: &mut R,
    building: &Building,
    config: &AmbientConfig,
    out: &mut Vec<LightVolume>,
) -> usize {
    if !config.enable_light_beams || building.size.y < config.beam_min_building_height {
        return 0;
    }
    if unit(rng) > config.beam_spawn_chance {
        return 0;
    }

    let mut count = 1;
    if building.size.y > config.beam_min_building_height * 2.0 && unit(rng) < 0.5 {
        count = 2;
    }

    for _ in 0..count {
        let base_radius = between(rng, config.beam_min_radius, config.beam_max_radius);
        let height = between(rng, config.beam_min_height, config.beam_max_height);
        let offset = Vec3::new(
            (unit(rng) - 0.5) * building.size.x * BEAM_ROOF_SPREAD,
            building.size.y,
            (unit(rng) - 0.5) * building.size.z * BEAM_ROOF_SPREAD,
        );
        let color = beam_color(rng);
        let intensity = between(rng, config.beam_min_intensity, config.beam_max_intensity);
        out.push(LightVolume {
            base_position: building.position + offset,
            height,
            base_radius,
            color,
            intensity,
            shape: VolumeShape::Beam,
        });
    }
    count
}

fn footprint_bounds(buildings: &[Building]) -> Option<(Vec2, Vec2)> {
    let first = buildings.first()?;
    let mut min = Vec2::new(first.position.x, first.position.z);
    let mut max = min;
    for building in buildings {
        let center = Vec2::new(building.position.x, building.position.z);
        let reach = Vec2::new(building.size.x, building.size.z);
        min = min.min(center - reach);
        max = max.max(center + reach);
    }
    Some((min, max))
}

fn is_clear(point: Vec3, buildings: &[Building], clearance: f32) -> bool {
    buildings.iter().all(|building| {
        let gap_x = (point.x - building.position.x).abs() - building.size.x * 0.5;
        let gap_z = (point.z - building.position.z).abs() - building.size.z * 0.5;
        !(gap_x < clearance && gap_z < clearance && point.y < building.size.y)
    })
}

fn ground_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let roll = unit(rng);
    let bucket = ((roll * GROUND_PALETTE.len() as f32) as usize).min(GROUND_PALETTE.len() - 1);
    GROUND_PALETTE[bucket]
}

fn beam_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let roll = unit(rng);
    if roll < 0.5 {
        BEAM_PALETTE[0]
    } else if roll < 0.8 {
        BEAM_PALETTE[1]
    } else {
        BEAM_PALETTE[2]
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rand::{Rng, SeedableRng};

    use super::{
        add_beam_volumes, add_ground_volumes, is_clear, VolumeShape, BEAM_PALETTE, GROUND_PALETTE,
    };
    use crate::building::{Attachment, Building, BuildingPart};
    use crate::config::AmbientConfig;
    use crate::rng::CityRng;

    fn tower(x: f32, z: f32, size: Vec3) -> Building {
        Building {
            position: Vec3::new(x, 0.0, z),
            size,
            color: Vec3::splat(0.2),
            height_variation: 0.0,
            has_antenna: false,
            parts: vec![BuildingPart {
                position: Vec3::ZERO,
                size,
                color: Vec3::splat(0.2),
                detail_level: 0,
                attachment: Attachment::Trunk,
                parent: None,
                mirror_of: None,
            }],
        }
    }

    #[test]
    fn empty_block_places_nothing() {
        let mut rng = CityRng::seed_from_u64(1);
        let mut out = Vec::new();
        assert_eq!(add_ground_volumes(&mut rng, &[], &AmbientConfig::default(), &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn accepted_cubes_keep_their_clearance() {
        let config = AmbientConfig::default();
        let buildings = vec![
            tower(0.0, 0.0, Vec3::new(4.0, 30.0, 6.0)),
            tower(25.0, 10.0, Vec3::new(8.0, 12.0, 3.0)),
            tower(-20.0, 30.0, Vec3::new(5.0, 20.0, 5.0)),
        ];
        let mut rng = CityRng::seed_from_u64(3);
        let mut out = Vec::new();
        let placed = add_ground_volumes(&mut rng, &buildings, &config, &mut out);
        assert_eq!(placed, out.len());
        assert!(placed > 0);
        assert!(placed <= config.ground_light_max_count as usize);
        for cube in &out {
            assert_eq!(cube.shape, VolumeShape::Cube);
            assert_eq!(cube.base_position.y, 0.0);
            assert!(is_clear(cube.base_position, &buildings, config.ground_light_min_clearance));
            assert!(GROUND_PALETTE.contains(&cube.color));
            assert!((3.0..=8.0).contains(&cube.height));
            assert!((3.0..=7.0).contains(&cube.base_radius));
            assert!((8.0..=20.0).contains(&cube.intensity));
        }
    }

    #[test]
    fn crowded_block_gives_up_after_the_attempt_budget() {
        let config = AmbientConfig {
            ground_light_min_clearance: 1_000.0,
            ..AmbientConfig::default()
        };
        let buildings = vec![tower(0.0, 0.0, Vec3::new(10.0, 50.0, 10.0))];
        let mut rng = CityRng::seed_from_u64(9);
        let mut out = Vec::new();
        assert_eq!(add_ground_volumes(&mut rng, &buildings, &config, &mut out), 0);
    }

    #[test]
    fn open_block_stops_at_max_count() {
        let config = AmbientConfig {
            ground_light_min_clearance: 0.0,
            ground_light_max_count: 5,
            ..AmbientConfig::default()
        };
        let buildings = vec![tower(0.0, 0.0, Vec3::new(10.0, 50.0, 10.0))];
        let mut rng = CityRng::seed_from_u64(11);
        let mut out = Vec::new();
        assert_eq!(add_ground_volumes(&mut rng, &buildings, &config, &mut out), 5);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn points_above_the_roof_are_never_blocked() {
        let buildings = vec![tower(0.0, 0.0, Vec3::new(10.0, 5.0, 10.0))];
        assert!(!is_clear(Vec3::ZERO, &buildings, 2.0));
        assert!(is_clear(Vec3::new(0.0, 6.0, 0.0), &buildings, 2.0));
        assert!(is_clear(Vec3::new(7.5, 0.0, 0.0), &buildings, 2.0));
        assert!(!is_clear(Vec3::new(6.5, 0.0, 0.0), &buildings, 2.0));
    }

    #[test]
    fn disabled_beams_consume_no_randomness() {
        let config = AmbientConfig::default();
        assert!(!config.enable_light_beams);
        let building = tower(0.0, 0.0, Vec3::new(10.0, 300.0, 10.0));

        let mut rng = CityRng::seed_from_u64(21);
        let mut reference = rng.clone();
        let mut out = Vec::new();
        assert_eq!(add_beam_volumes(&mut rng, &building, &config, &mut out), 0);
        assert!(out.is_empty());
        assert_eq!(rng.gen::<u64>(), reference.gen::<u64>());
    }

    #[test]
    fn enabled_beams_rise_from_tall_roofs() {
        let config = AmbientConfig {
            enable_light_beams: true,
            beam_spawn_chance: 1.0,
            ..AmbientConfig::default()
        };
        let building = tower(40.0, -10.0, Vec3::new(10.0, 90.0, 6.0));
        let mut out = Vec::new();
        for seed in 0..32 {
            let mut rng = CityRng::seed_from_u64(seed);
            let placed = add_beam_volumes(&mut rng, &building, &config, &mut out);
            assert!((1..=2).contains(&placed));
        }
        for beam in &out {
            assert!(beam.is_beam());
            assert_eq!(beam.base_position.y, 90.0);
            assert!((beam.base_position.x - 40.0).abs() <= 10.0 * 0.15 + 1e-4);
            assert!((beam.base_position.z + 10.0).abs() <= 6.0 * 0.15 + 1e-4);
            assert!(BEAM_PALETTE.contains(&beam.color));
            assert!((180.0..=400.0).contains(&beam.height));
        }

        let short = tower(0.0, 0.0, Vec3::new(10.0, 20.0, 10.0));
        let mut rng = CityRng::seed_from_u64(0);
        assert_eq!(add_beam_volumes(&mut rng, &short, &config, &mut out), 0);
    }
}
