//! Sector fills. Every fill takes `start_sector` and `count`; a zero count runs to the
//! last sector.

use rayon::prelude::*;
use tracing::trace;

use crate::error::{Error, Result};
use crate::io::pass::pattern::{amplify, write_compression_info, PatternKind};
use crate::io::pass::random::{fill_sectors, fill_sectors_seeded_by_sector};
use crate::io::pass::run_in_parallel;

use super::Buffer;

impl Buffer {
    pub fn fill(&mut self, value: u8, start_sector: usize, count: usize) -> Result<&mut Self> {
        let range = self.sector_range(start_sector, count)?;
        let bps = self.bytes_per_sector;
        let pattern_mode = self.use_pattern_mode;
        let dest = &mut self.as_mut_slice()[range];
        dest.fill(value);
        if pattern_mode {
            write_compression_info(dest, bps, PatternKind::Fixed, 1);
        }
        Ok(self)
    }

    pub fn fill_zeros(&mut self, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.fill(0, start_sector, count)
    }

    pub fn fill_ones(&mut self, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.fill(0xFF, start_sector, count)
    }

    /// First sector of the range counts up from `start_value` (wrapping), the rest of
    /// the range repeats it.
    pub fn fill_incrementing(&mut self, start_value: u8, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.fill_counting(start_value, start_sector, count, PatternKind::Incrementing)
    }

    /// Like [`Buffer::fill_incrementing`] but counting down; 255 is the usual start.
    pub fn fill_decrementing(&mut self, start_value: u8, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.fill_counting(start_value, start_sector, count, PatternKind::Decrementing)
    }

    fn fill_counting(&mut self, start_value: u8, start_sector: usize, count: usize, kind: PatternKind) -> Result<&mut Self> {
        let range = self.sector_range(start_sector, count)?;
        let bps = self.bytes_per_sector;
        let pattern_mode = self.use_pattern_mode;
        let dest = &mut self.as_mut_slice()[range];

        let mut value = start_value;
        for b in dest[..bps].iter_mut() {
            *b = value;
            value = match kind {
                PatternKind::Decrementing => value.wrapping_sub(1),
                _ => value.wrapping_add(1),
            };
        }
        let len = dest.len();
        amplify(dest, 0, bps, bps, len);

        if pattern_mode {
            write_compression_info(dest, bps, kind, 1);
        }
        Ok(self)
    }

    /// Repeats `pattern` across the range. An empty pattern leaves the buffer untouched.
    pub fn fill_bytes(&mut self, pattern: &[u8], start_sector: usize, count: usize) -> Result<&mut Self> {
        if pattern.is_empty() {
            return Ok(self);
        }
        let range = self.sector_range(start_sector, count)?;
        let bps = self.bytes_per_sector;
        let pattern_mode = self.use_pattern_mode;
        let dest = &mut self.as_mut_slice()[range];

        let seeded = pattern.len().min(dest.len());
        dest[..seeded].copy_from_slice(&pattern[..seeded]);
        let len = dest.len();
        amplify(dest, 0, pattern.len(), seeded, len);

        if pattern_mode {
            write_compression_info(dest, bps, PatternKind::Fixed, pattern.len());
        }
        Ok(self)
    }

    /// Stamps `start_value + n` as a little-endian qword into the first and last eight
    /// bytes of the n-th sector of the range.
    pub fn fill_address_overlay(&mut self, start_value: u64, start_sector: usize, count: usize) -> Result<&mut Self> {
        let bps = self.bytes_per_sector;
        if bps % 8 != 0 {
            return Err(Error::invalid_argument(format!(
                "Address overlay needs a sector size that is a multiple of 8, not {}.",
                bps
            )));
        }
        let range = self.sector_range(start_sector, count)?;
        let sectors = range.len() / bps;
        Self::validate_counter_max(range.end / 8)?;

        let stamp = |(n, sector): (usize, &mut [u8])| {
            let value = start_value.wrapping_add(n as u64).to_le_bytes();
            sector[..8].copy_from_slice(&value);
            sector[bps - 8..].copy_from_slice(&value);
        };
        let dest = &mut self.as_mut_slice()[range];
        if run_in_parallel(start_sector, sectors) {
            trace!(sectors, "address overlay in parallel");
            dest.par_chunks_mut(bps).enumerate().for_each(stamp);
        } else {
            dest.chunks_mut(bps).enumerate().for_each(stamp);
        }
        Ok(self)
    }

    /// Fills from the buffer's own generator. A generator the caller seeded before
    /// restarts from seed 0, a clock-seeded one simply continues.
    pub fn fill_random(&mut self, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.fill_random_impl(None, start_sector, count)
    }

    pub fn fill_random_seeded(&mut self, seed: u32, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.fill_random_impl(Some(seed), start_sector, count)
    }

    /// Sector `start_sector + n` holds the stream of a generator seeded with `seed + n`,
    /// so any sector can be regenerated on its own.
    pub fn fill_random_seeded_by_sector(&mut self, seed: u32, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.check_random_geometry()?;
        let range = self.sector_range(start_sector, count)?;
        let bps = self.bytes_per_sector;
        let sectors = range.len() / bps;
        Self::validate_counter_max(start_sector + sectors)?;

        self.random_for_fill(Some(seed));
        let pattern_mode = self.use_pattern_mode;
        let parallel = run_in_parallel(start_sector, sectors);
        fill_sectors_seeded_by_sector(&mut self.as_mut_slice()[range], bps, seed, pattern_mode, parallel);
        Ok(self)
    }

    fn fill_random_impl(&mut self, seed: Option<u32>, start_sector: usize, count: usize) -> Result<&mut Self> {
        self.check_random_geometry()?;
        let range = self.sector_range(start_sector, count)?;
        let bps = self.bytes_per_sector;
        let pattern_mode = self.use_pattern_mode;

        // the generator is moved out so it can write into the payload it lives beside
        let mut rng = self.random_for_fill(seed).clone();
        fill_sectors(&mut self.as_mut_slice()[range], bps, &mut rng, pattern_mode);
        self.random = Some(rng);
        Ok(self)
    }

    fn check_random_geometry(&self) -> Result<()> {
        if self.bytes_per_sector % 4 != 0 {
            return Err(Error::runtime(
                "Filling random data is not supported for sector sizes that are not a multiple of 4.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::conf::get_test_config;
    use crate::io::prng::Random32;
    use crate::{Buffer, ErrorKind};

    fn buf(sectors: usize, bps: usize) -> Buffer {
        Buffer::from_conf(&get_test_config().with_geometry(sectors, bps)).unwrap()
    }

    fn pattern_buf(sectors: usize, bps: usize) -> Buffer {
        let mut conf = get_test_config().with_geometry(sectors, bps);
        conf.pattern_mode = true;
        Buffer::from_conf(&conf).unwrap()
    }

    #[test]
    fn constant_fills() {
        let mut b = buf(4, 512);
        b.fill(0xAA, 0, 0).unwrap();
        assert!(b.as_slice().iter().all(|&x| x == 0xAA));
        b.fill_zeros(1, 2).unwrap();
        assert!(b.as_slice()[..512].iter().all(|&x| x == 0xAA));
        assert!(b.as_slice()[512..1536].iter().all(|&x| x == 0));
        assert!(b.as_slice()[1536..].iter().all(|&x| x == 0xAA));
        b.fill_ones(0, 0).unwrap();
        assert_eq!(b.get_bit_count(0, 0, 1).unwrap(), 4 * 512 * 8);
        b.fill_zeros(0, 0).unwrap();
        assert!(b.is_all_zeros());
    }

    #[test]
    fn out_of_range_fill_does_not_mutate() {
        let mut b = buf(4, 512);
        assert_eq!(b.fill(1, 4, 0).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(b.fill(1, 2, 3).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert!(b.is_all_zeros());
    }

    #[test]
    fn incrementing_and_decrementing() {
        let mut b = buf(3, 512);
        b.fill_incrementing(0, 0, 0).unwrap();
        for i in 0..b.total_bytes() {
            assert_eq!(b.get_byte(i).unwrap() as usize, i % 512 % 256);
        }

        b.fill_decrementing(255, 0, 0).unwrap();
        for i in 0..512 {
            assert_eq!(b.get_byte(i).unwrap() as usize, 255 - (i % 256));
        }

        b.fill_incrementing(0xFE, 1, 1).unwrap();
        assert_eq!(b.get_bytes(512, 4).unwrap(), vec![0xFE, 0xFF, 0x00, 0x01]);
        assert_eq!(b.get_byte(1024).unwrap(), 255);
    }

    #[test]
    fn incrementing_with_odd_sector_size() {
        let mut b = buf(3, 300);
        b.fill_incrementing(10, 0, 0).unwrap();
        for i in 0..b.total_bytes() {
            assert_eq!(b.get_byte(i).unwrap(), ((i % 300) + 10) as u8);
        }
    }

    #[test]
    fn fill_bytes_repeats() {
        let mut b = buf(2, 512);
        b.fill_bytes(&[0xDE, 0xAD, 0xBE], 0, 0).unwrap();
        for i in 0..b.total_bytes() {
            assert_eq!(b.get_byte(i).unwrap(), [0xDE, 0xAD, 0xBE][i % 3]);
        }

        b.fill_bytes(&[], 0, 0).unwrap();
        assert_eq!(b.get_byte(0).unwrap(), 0xDE);

        let long: Vec<u8> = (0..700u32).map(|i| (i % 256) as u8).collect();
        b.fill_bytes(&long, 1, 1).unwrap();
        assert_eq!(b.get_bytes(512, 0).unwrap(), long[..512].to_vec());
    }

    #[test]
    fn address_overlay() {
        let mut b = buf(3, 512);
        b.fill_address_overlay(42, 0, 3).unwrap();
        assert_eq!(b.get_qword(0).unwrap(), 42);
        assert_eq!(b.get_qword(504).unwrap(), 42);
        assert_eq!(b.get_qword(512).unwrap(), 43);
        assert_eq!(b.get_qword(1024 + 504).unwrap(), 44);
        assert_eq!(b.get_byte(8).unwrap(), 0);

        let mut odd = buf(2, 516);
        assert_eq!(odd.fill_address_overlay(0, 0, 0).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn address_overlay_parallel_path() {
        let mut b = buf(1200, 512);
        b.fill_address_overlay(u64::MAX - 1, 0, 0).unwrap();
        assert_eq!(b.get_qword(0).unwrap(), u64::MAX - 1);
        assert_eq!(b.get_qword(512 + 504).unwrap(), u64::MAX);
        assert_eq!(b.get_qword(1024).unwrap(), 0);
        assert_eq!(b.get_qword(1199 * 512).unwrap(), 1197);
    }

    #[test]
    fn random_fill_geometry() {
        let mut b = buf(2, 513);
        assert_eq!(b.fill_random(0, 0).unwrap_err().kind(), ErrorKind::Runtime);
        assert_eq!(b.fill_random_seeded(1, 0, 0).unwrap_err().kind(), ErrorKind::Runtime);
        assert_eq!(b.fill_random_seeded_by_sector(1, 0, 0).unwrap_err().kind(), ErrorKind::Runtime);
        assert!(!b.has_random());
    }

    #[test]
    fn seeded_random_fill_matches_generator() {
        let mut b = buf(2, 512);
        b.fill_random_seeded(12345, 0, 0).unwrap();
        assert_eq!(b.get_dword(0).unwrap(), 0x6360_8376);
        assert_eq!(b.get_dword(4).unwrap(), 0x3850_5A63);

        let mut rng = Random32::with_seed(12345);
        for i in 0..b.total_bytes() / 4 {
            assert_eq!(b.get_dword(i * 4).unwrap(), rng.next_u32());
        }
    }

    #[test]
    fn fill_random_restarts_caller_seeded_generator() {
        let mut a = buf(2, 512);
        a.fill_random_seeded(777, 0, 0).unwrap();
        a.fill_random(0, 0).unwrap();

        let mut b = buf(2, 512);
        b.fill_random_seeded(0, 0, 0).unwrap();
        assert!(a.compare_to(&b, 0, 0, 0).unwrap().are_equal());
    }

    #[test]
    fn fill_random_continues_clock_seeded_generator() {
        let mut a = buf(1, 512);
        a.fill_random(0, 0).unwrap();
        let first = a.get_bytes(0, 0).unwrap();
        a.fill_random(0, 0).unwrap();
        assert_ne!(a.get_bytes(0, 0).unwrap(), first);
    }

    #[test]
    fn seeded_by_sector() {
        let mut b = buf(4, 512);
        b.fill_random_seeded_by_sector(50, 1, 2).unwrap();
        assert!(b.as_slice()[..512].iter().all(|&x| x == 0));
        assert!(b.as_slice()[1536..].iter().all(|&x| x == 0));

        let mut single = buf(1, 512);
        single.fill_random_seeded(51, 0, 0).unwrap();
        assert!(b.compare_to(&single, 2, 0, 1).unwrap().are_equal());
        assert!(b.has_random());
    }

    #[test]
    fn pattern_mode_trailers() {
        let mut b = pattern_buf(2, 512);
        assert!(b.is_all_zeros());

        b.fill_incrementing(0, 0, 0).unwrap();
        for s in 0..2 {
            let base = s * 512;
            assert_eq!(b.get_byte(base + 511).unwrap(), 0x11);
            assert_eq!(b.get_byte(base + 499).unwrap(), b.get_byte(base + 491).unwrap());
        }

        b.fill_decrementing(255, 0, 0).unwrap();
        assert_eq!(b.get_byte(511).unwrap(), 0x21);

        b.fill_ones(0, 0).unwrap();
        assert_eq!(b.get_byte(511).unwrap(), 0x01);
        assert_eq!(b.get_byte(1023).unwrap(), 0x01);

        b.fill_bytes(&[1, 2, 3, 4], 0, 0).unwrap();
        assert_eq!(b.get_byte(511).unwrap(), 0x04);
        assert_eq!(b.get_bytes(499, 4).unwrap(), b.get_bytes(491, 4).unwrap());

        // more than eight pattern bytes are not described
        let long = [9u8; 9];
        b.fill_bytes(&long, 0, 0).unwrap();
        assert_eq!(b.get_byte(511).unwrap(), 9);
    }

    #[test]
    fn pattern_mode_zero_page() {
        let mut b = pattern_buf(2, 512);
        b.fill_ones(0, 0).unwrap();
        b.fill_zeros(0, 0).unwrap();
        assert!(b.is_all_zeros());

        b.fill_bytes(&[0, 7], 0, 0).unwrap();
        assert_eq!(b.get_byte(511).unwrap(), 7);
    }

    #[test]
    fn pattern_mode_random_replay() {
        let mut b = pattern_buf(2, 512);
        b.fill_random_seeded(99, 0, 0).unwrap();
        assert_eq!(b.get_byte(511).unwrap(), 0x30);
        assert_eq!(b.get_byte(1023).unwrap(), 0x30);

        let mut rng = Random32::with_seed(99);
        assert_eq!(b.get_bytes(499, 12).unwrap(), rng.state_bytes().to_vec());
        assert_eq!(b.get_dword(0).unwrap(), rng.next_u32());

        let mut state = [0u8; 12];
        state.copy_from_slice(&b.get_bytes(512 + 499, 12).unwrap());
        let mut replay = Random32::from_state_bytes(state);
        assert_eq!(b.get_dword(512).unwrap(), replay.next_u32());
    }

    #[test]
    fn pattern_mode_skips_address_overlay() {
        let mut b = pattern_buf(1, 512);
        b.fill_address_overlay(5, 0, 0).unwrap();
        assert_eq!(b.get_qword(504).unwrap(), 5);
    }
}
