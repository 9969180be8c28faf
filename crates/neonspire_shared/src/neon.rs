use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::building::{Building, BuildingPart};
use crate::rng::{between, unit};

pub const WALL_FILL: f32 = 0.8;
pub const WALL_OFFSET: f32 = 0.05;

const MIN_LIGHTS_PER_BUILDING: u32 = 2;
const LIGHT_COUNT_SPREAD: f32 = 8.0;

const RED: Vec3 = Vec3::new(1.0, 0.3, 0.1);
const AMBER: Vec3 = Vec3::new(1.0, 0.8, 0.2);
const CYAN: Vec3 = Vec3::new(0.2, 0.8, 1.0);
const PURPLE: Vec3 = Vec3::new(0.8, 0.2, 1.0);

pub const NEON_SWATCHES: [Vec3; 4] = [RED, AMBER, CYAN, PURPLE];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Front,
    Back,
    Left,
    Right,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::Front, Face::Back, Face::Left, Face::Right];

    pub fn normal(self) -> Vec3 {
        match self {
            Face::Front => Vec3::Z,
            Face::Back => Vec3::NEG_Z,
            Face::Left => Vec3::NEG_X,
            Face::Right => Vec3::X,
        }
    }

    pub fn wall_size(self, size: Vec3) -> Vec2 {
        match self {
            Face::Front | Face::Back => Vec2::new(size.x, size.y),
            Face::Left | Face::Right => Vec2::new(size.z, size.y),
        }
    }

    fn from_roll(roll: f32) -> Face {
        if roll < 0.25 {
            Face::Front
        } else if roll < 0.5 {
            Face::Back
        } else if roll < 0.75 {
            Face::Left
        } else {
            Face::Right
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeonLight {
    pub position: Vec3,
    pub face: Face,
    pub width: f32,
    pub height: f32,
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
}

pub fn add_facade_lights<R: Rng + ?Sized>(rng: &mut R, building: &Building, out: &mut Vec<NeonLight>) {
    if building.parts.is_empty() {
        return;
    }

    let count = MIN_LIGHTS_PER_BUILDING + (unit(rng) * LIGHT_COUNT_SPREAD) as u32;
    out.reserve(count as usize);
    for _ in 0..count {
        let pick = (unit(rng) * building.parts.len() as f32) as usize;
        let part = &building.parts[pick.min(building.parts.len() - 1)];
        out.push(place_light(rng, building, part));
    }
}

pub(crate) fn place_light<R: Rng + ?Sized>(rng: &mut R, building: &Building, part: &BuildingPart) -> NeonLight {
    let face = Face::from_roll(unit(rng));
    let wall = face.wall_size(part.size);

    let base = glyph_size(rng);
    let aspect = between(rng, 0.5, 2.0);
    let (width, height) = clamp_to_wall(base * aspect, base, wall);

    let lateral = (unit(rng) - 0.5) * (wall.x - width);
    let rise = unit(rng) * (wall.y - height) + height * 0.5;
    let half = part.size * 0.5;
    let (along, depth) = match face {
        Face::Front | Face::Back => (Vec3::X, half.z),
        Face::Left | Face::Right => (Vec3::Z, half.x),
    };
    let offset = along * lateral + Vec3::Y * rise + face.normal() * (depth + WALL_OFFSET);

    NeonLight {
        position: building.part_world_position(part) + offset,
        face,
        width,
        height,
        color: neon_color(rng),
        intensity: between(rng, 0.5, 2.0),
        radius: between(rng, 8.0, 20.0),
    }
}

fn glyph_size<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let tier = unit(rng);
    if tier < 0.6 {
        between(rng, 0.3, 0.8)
    } else if tier < 0.85 {
        between(rng, 0.8, 2.0)
    } else if tier < 0.95 {
        between(rng, 2.0, 4.0)
    } else {
        between(rng, 4.0, 8.0)
    }
}

fn clamp_to_wall(mut width: f32, mut height: f32, wall: Vec2) -> (f32, f32) {
    let max_width = wall.x * WALL_FILL;
    let max_height = wall.y * WALL_FILL;
    if width > max_width {
        height *= max_width / width;
        width = max_width;
    }
    if height > max_height {
        width *= max_height / height;
        height = max_height;
    }
    debug_assert!(width <= max_width && height <= max_height);
    (width, height)
}

fn neon_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let roll = unit(rng);
    if roll < 0.3 {
        RED
    } else if roll < 0.6 {
        AMBER
    } else if roll < 0.8 {
        CYAN
    } else {
        PURPLE
    }
}
