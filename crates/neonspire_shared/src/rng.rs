use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::coords::ChunkCoord;

pub type CityRng = ChaCha8Rng;

const WORLD_SEED_PRIME: u64 = 73_856_093;
const CHUNK_X_PRIME: u64 = 19_349_663;
const CHUNK_Z_PRIME: u64 = 83_492_791;

pub fn seed_for(world_seed: u64, chunk_x: i32, chunk_z: i32) -> u64 {
    world_seed.wrapping_mul(WORLD_SEED_PRIME)
        ^ (i64::from(chunk_x) as u64).wrapping_mul(CHUNK_X_PRIME)
        ^ (i64::from(chunk_z) as u64).wrapping_mul(CHUNK_Z_PRIME)
}

pub fn chunk_rng(world_seed: u64, coord: ChunkCoord) -> CityRng {
    CityRng::seed_from_u64(seed_for(world_seed, coord.x, coord.z))
}

#[inline]
pub(crate) fn unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen::<f32>()
}

#[inline]
pub(crate) fn between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + unit(rng) * (max - min)
}
