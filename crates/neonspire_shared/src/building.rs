use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CityConfig;
use crate::rng::{between, unit};

pub const MAX_BRANCH_DEPTH: u8 = 2;

const MIN_FOOTPRINT: f32 = 2.0;
const FOOTPRINT_JITTER: f32 = 4.0;
const ELONGATION_MIN: f32 = 1.5;
const ELONGATION_MAX: f32 = 3.5;
const CENTER_BIAS: f32 = 0.3;
const ANTENNA_CHANCE: f32 = 0.3;
const MAX_HEIGHT_VARIATION: f32 = 0.3;
const TOP_OFFSET: f32 = 0.15;
const LATERAL_SPREAD: f32 = 0.6;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartId(pub u32);

impl PartId {
    pub const TRUNK: PartId = PartId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attachment {
    Trunk,
    FrontBack,
    LeftRight,
    Top,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingPart {
    pub position: Vec3,
    pub size: Vec3,
    pub color: Vec3,
    pub detail_level: u8,
    pub attachment: Attachment,
    pub parent: Option<PartId>,
    pub mirror_of: Option<PartId>,
}

impl BuildingPart {
    fn trunk(size: Vec3, color: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            size,
            color,
            detail_level: 0,
            attachment: Attachment::Trunk,
            parent: None,
            mirror_of: None,
        }
    }

    pub fn top(&self) -> f32 {
        self.position.y + self.size.y
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub position: Vec3,
    pub size: Vec3,
    pub color: Vec3,
    pub height_variation: f32,
    pub has_antenna: bool,
    pub parts: Vec<BuildingPart>,
}

impl Building {
    pub fn part(&self, id: PartId) -> Option<&BuildingPart> {
        self.parts.get(id.index())
    }

    pub fn part_world_position(&self, part: &BuildingPart) -> Vec3 {
        self.position + part.position
    }

    pub fn top(&self) -> f32 {
        self.parts.iter().map(BuildingPart::top).fold(0.0, f32::max)
    }

    pub fn branch_pairs(&self) -> impl Iterator<Item = (&BuildingPart, &BuildingPart)> + '_ {
        self.parts.iter().filter_map(move |part| {
            let first = self.part(part.mirror_of?)?;
            Some((first, part))
        })
    }
}

pub fn generate_building<R: Rng + ?Sized>(rng: &mut R, ground: Vec2, config: &CityConfig) -> Building {
    let mut width = MIN_FOOTPRINT + unit(rng) * FOOTPRINT_JITTER;
    let mut depth = MIN_FOOTPRINT + unit(rng) * FOOTPRINT_JITTER;
    if unit(rng) > 0.5 {
        width *= between(rng, ELONGATION_MIN, ELONGATION_MAX);
    } else {
        depth *= between(rng, ELONGATION_MIN, ELONGATION_MAX);
    }

    let size = Vec3::new(width, generate_height(rng, config), depth);
    debug_assert!(size.min_element() > 0.0, "trunk size must stay positive: {size}");
    let color = generate_building_color(rng);
    let height_variation = unit(rng) * MAX_HEIGHT_VARIATION;
    let has_antenna = unit(rng) > 1.0 - ANTENNA_CHANCE;

    let mut parts = vec![BuildingPart::trunk(size, color)];
    grow_branches(rng, &mut parts, color, PartId::TRUNK);

    Building {
        position: Vec3::new(ground.x, 0.0, ground.y),
        size,
        color,
        height_variation,
        has_antenna,
        parts,
    }
}

fn generate_height<R: Rng + ?Sized>(rng: &mut R, config: &CityConfig) -> f32 {
    let mut factor = (-config.height_distribution_lambda * unit(rng)).exp();

    let dx = unit(rng) - 0.5;
    let dz = unit(rng) - 0.5;
    let distance_from_center = (dx * dx + dz * dz).sqrt();
    factor *= 1.0 - distance_from_center * CENTER_BIAS;
    factor = factor.min(1.0);

    config.min_height + factor * (config.max_height - config.min_height)
}

fn generate_building_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let gray = 0.1 + unit(rng) * 0.2;
    let tint = unit(rng);
    if tint < 0.3 {
        Vec3::new(gray, gray * 0.8, gray * 0.6)
    } else if tint < 0.6 {
        Vec3::new(gray * 0.7, gray, gray * 0.8)
    } else {
        Vec3::new(gray * 0.8, gray * 0.8, gray)
    }
}

fn branch_pair_count<R: Rng + ?Sized>(rng: &mut R, depth: u8) -> u32 {
    let roll = unit(rng);
    if depth == 0 {
        if roll < 0.3 {
            0
        } else if roll < 0.6 {
            1
        } else if roll < 0.85 {
            2
        } else {
            3
        }
    } else if roll < 0.6 {
        0
    } else if roll < 0.9 {
        1
    } else {
        2
    }
}

fn grow_branches<R: Rng + ?Sized>(
    rng: &mut R,
    parts: &mut Vec<BuildingPart>,
    building_color: Vec3,
    parent: PartId,
) {
    let depth = parts[parent.index()].detail_level;
    if depth >= MAX_BRANCH_DEPTH {
        return;
    }

    for _ in 0..branch_pair_count(rng, depth) {
        let (first, second) = add_symmetric_pair(rng, parts, building_color, parent);
        grow_branches(rng, parts, building_color, first);
        grow_branches(rng, parts, building_color, second);
    }
}

fn add_symmetric_pair<R: Rng + ?Sized>(
    rng: &mut R,
    parts: &mut Vec<BuildingPart>,
    building_color: Vec3,
    parent: PartId,
) -> (PartId, PartId) {
    let host = parts[parent.index()];
    let p = host.size;

    let mode = unit(rng);
    let scale = between(rng, 0.3, 0.7);
    let attach_height = between(rng, 0.3, 0.8);
    let extend = between(rng, 0.4, 1.0);

    let (attachment, size, offset) = if mode < 1.0 / 3.0 {
        let size = Vec3::new(p.x * scale, p.y * scale, p.z * extend);
        let lateral = (unit(rng) - 0.5) * p.x * LATERAL_SPREAD;
        let rise = side_branch_rise(&host, attach_height, size.y);
        let reach = (p.z + size.z) * 0.5;
        (Attachment::FrontBack, size, Vec3::new(lateral, rise, reach))
    } else if mode < 2.0 / 3.0 {
        let size = Vec3::new(p.x * extend, p.y * scale, p.z * scale);
        let lateral = (unit(rng) - 0.5) * p.z * LATERAL_SPREAD;
        let rise = side_branch_rise(&host, attach_height, size.y);
        let reach = (p.x + size.x) * 0.5;
        (Attachment::LeftRight, size, Vec3::new(reach, rise, lateral))
    } else {
        let size = Vec3::new(
            p.x * between(rng, 0.7, 1.0),
            p.y * scale,
            p.z * between(rng, 0.7, 1.0),
        );
        let offset = Vec3::new(-p.x * TOP_OFFSET, p.y, p.z * TOP_OFFSET);
        (Attachment::Top, size, offset)
    };
    debug_assert!(size.min_element() > 0.0, "branch size must stay positive: {size}");

    let color = building_color * between(rng, 0.9, 1.1);
    let mirrored = Vec3::new(-offset.x, offset.y, -offset.z);

    let first = PartId(parts.len() as u32);
    let detail_level = host.detail_level + 1;
    parts.push(BuildingPart {
        position: host.position + offset,
        size,
        color,
        detail_level,
        attachment,
        parent: Some(parent),
        mirror_of: None,
    });
    let second = PartId(parts.len() as u32);
    parts.push(BuildingPart {
        position: host.position + mirrored,
        size,
        color,
        detail_level,
        attachment,
        parent: Some(parent),
        mirror_of: Some(first),
    });
    (first, second)
}

fn side_branch_rise(host: &BuildingPart, attach_height: f32, branch_height: f32) -> f32 {
    let center = host.position.y + host.size.y * attach_height;
    (center - branch_height * 0.5).max(0.0) - host.position.y
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};
    use rand::SeedableRng;

    use super::{generate_building, Attachment, Building, PartId, MAX_BRANCH_DEPTH};
    use crate::config::CityConfig;
    use crate::rng::CityRng;

    fn sample_buildings(count: u64) -> Vec<Building> {
        let config = CityConfig::default();
        (0..count)
            .map(|seed| {
                let mut rng = CityRng::seed_from_u64(seed);
                generate_building(&mut rng, Vec2::new(12.0, -7.5), &config)
            })
            .collect()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn trunk_is_first_and_matches_building_massing() {
        for building in sample_buildings(64) {
            let trunk = &building.parts[PartId::TRUNK.index()];
            assert_eq!(trunk.position, Vec3::ZERO);
            assert_eq!(trunk.size, building.size);
            assert_eq!(trunk.color, building.color);
            assert_eq!(trunk.detail_level, 0);
            assert_eq!(trunk.attachment, Attachment::Trunk);
            assert_eq!(building.position, Vec3::new(12.0, 0.0, -7.5));
        }
    }

    #[test]
    fn massing_stays_in_documented_ranges() {
        let config = CityConfig::default();
        for building in sample_buildings(256) {
            let size = building.size;
            assert!(size.x >= 2.0 && size.x <= 6.0 * 3.5, "width {}", size.x);
            assert!(size.z >= 2.0 && size.z <= 6.0 * 3.5, "depth {}", size.z);
            assert!(size.y >= config.min_height && size.y <= config.max_height);
            assert!(building.height_variation >= 0.0 && building.height_variation < 0.3);
        }
    }

    #[test]
    fn heights_cluster_toward_the_minimum() {
        let config = CityConfig::default();
        let midpoint = (config.min_height + config.max_height) * 0.5;
        let buildings = sample_buildings(2_000);
        let low = buildings.iter().filter(|b| b.size.y < midpoint).count();
        assert!(low as f32 / buildings.len() as f32 > 0.6, "{low} low buildings");
    }

    #[test]
    fn parts_are_positive_and_detail_levels_follow_the_tree() {
        for building in sample_buildings(256) {
            for (index, part) in building.parts.iter().enumerate() {
                assert!(part.size.min_element() > 0.0);
                assert!(part.detail_level <= MAX_BRANCH_DEPTH);
                match part.parent {
                    None => assert_eq!(index, 0),
                    Some(parent) => {
                        assert!(parent.index() < index);
                        let parent = building.part(parent).expect("parent exists");
                        assert_eq!(part.detail_level, parent.detail_level + 1);
                    }
                }
            }
        }
    }

    #[test]
    fn branch_fan_out_tapers_with_depth() {
        for building in sample_buildings(256) {
            for (index, part) in building.parts.iter().enumerate() {
                let children = building
                    .parts
                    .iter()
                    .filter(|child| child.parent == Some(PartId(index as u32)))
                    .count();
                assert_eq!(children % 2, 0);
                match part.detail_level {
                    0 => assert!(children <= 6),
                    1 => assert!(children <= 4),
                    _ => assert_eq!(children, 0),
                }
            }
        }
    }

    #[test]
    fn sibling_pairs_are_mirror_images() {
        let mut pairs_seen = 0;
        for building in sample_buildings(256) {
            for (first, second) in building.branch_pairs() {
                pairs_seen += 1;
                assert_eq!(first.size, second.size);
                assert_eq!(first.color, second.color);
                assert_eq!(first.parent, second.parent);
                assert_eq!(first.attachment, second.attachment);

                let host = building.part(first.parent.expect("branch has parent")).expect("host");
                let a = first.position - host.position;
                let b = second.position - host.position;
                assert!(close(a.x, -b.x), "{a} vs {b}");
                assert!(close(a.z, -b.z), "{a} vs {b}");
                assert!(close(a.y, b.y), "{a} vs {b}");
            }
        }
        assert!(pairs_seen > 0);
    }

    #[test]
    fn every_branch_belongs_to_exactly_one_pair() {
        for building in sample_buildings(128) {
            let branches = building.parts.len() - 1;
            assert_eq!(branches % 2, 0);
            assert_eq!(building.branch_pairs().count() * 2, branches);
        }
    }

    #[test]
    fn side_branches_sit_flush_against_the_host() {
        for building in sample_buildings(256) {
            for (first, _) in building.branch_pairs() {
                let host = building.part(first.parent.expect("parent")).expect("host");
                let offset = first.position - host.position;
                match first.attachment {
                    Attachment::FrontBack => {
                        assert!(close(offset.z, (host.size.z + first.size.z) * 0.5));
                    }
                    Attachment::LeftRight => {
                        assert!(close(offset.x, (host.size.x + first.size.x) * 0.5));
                    }
                    Attachment::Top => {
                        assert!(close(first.position.y, host.top()));
                        assert!(first.size.x <= host.size.x && first.size.z <= host.size.z);
                    }
                    Attachment::Trunk => panic!("trunk cannot be paired"),
                }
                assert!(first.position.y >= 0.0);
            }
        }
    }

    #[test]
    fn same_stream_builds_the_same_building() {
        let config = CityConfig::default();
        let mut a = CityRng::seed_from_u64(99);
        let mut b = CityRng::seed_from_u64(99);
        assert_eq!(
            generate_building(&mut a, Vec2::ZERO, &config),
            generate_building(&mut b, Vec2::ZERO, &config)
        );
    }
}
