use rayon::prelude::*;

use crate::io::prng::Random32;

use super::pattern::{write_compression_info, write_generator_state, PatternKind};

/// Writes one little-endian draw per 4-byte word. `dest.len()` must be a multiple of 4.
pub fn fill_words(dest: &mut [u8], rng: &mut Random32) {
    for word in dest.chunks_exact_mut(4) {
        word.copy_from_slice(&rng.next_u32().to_le_bytes());
    }
}

/// Fills whole sectors from `rng`. In pattern mode each sector also carries the
/// generator state it was produced from, so a simulator can replay it.
pub fn fill_sectors(dest: &mut [u8], bytes_per_sector: usize, rng: &mut Random32, pattern_mode: bool) {
    if !pattern_mode {
        fill_words(dest, rng);
        return;
    }
    for sector in dest.chunks_exact_mut(bytes_per_sector) {
        let snapshot = rng.state_bytes();
        fill_words(sector, rng);
        write_generator_state(sector, &snapshot);
    }
    write_compression_info(dest, bytes_per_sector, PatternKind::Random, 0);
}

/// Sector `i` of `dest` is generated from a fresh generator seeded with `seed + i`.
pub fn fill_sectors_seeded_by_sector(
    dest: &mut [u8],
    bytes_per_sector: usize,
    seed: u32,
    pattern_mode: bool,
    parallel: bool,
) {
    if parallel {
        dest.par_chunks_mut(bytes_per_sector)
            .enumerate()
            .for_each(|(i, sector)| fill_seeded_sector(sector, seed, i, pattern_mode));
    } else {
        dest.chunks_mut(bytes_per_sector)
            .enumerate()
            .for_each(|(i, sector)| fill_seeded_sector(sector, seed, i, pattern_mode));
    }
}

fn fill_seeded_sector(sector: &mut [u8], seed: u32, index: usize, pattern_mode: bool) {
    let mut rng = Random32::with_seed(seed.wrapping_add(index as u32));
    let len = sector.len();
    fill_sectors(sector, len, &mut rng, pattern_mode);
}
