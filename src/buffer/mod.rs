//! Sector-organized, page-aligned byte buffer.
//!
//! A [`Buffer`] is `sector_count * bytes_per_sector` payload bytes. The payload starts on
//! a 4096 byte boundary and is preceded by a 4096 byte guard region that callers may use
//! for command or DMA structures placed ahead of the data.

use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use size_format::SizeFormatterBinary;
use tracing::debug;

use crate::conf::{Conf, DEFAULT_BYTES_PER_SECTOR};
use crate::error::{Error, Result};
use crate::io::pass::{create_buf, PAGE_SIZE};
use crate::io::prng::Random32;

mod access;
mod compare;
mod dump;
mod fill;

pub use dump::ByteGrouping;

pub struct Buffer {
    name: String,
    /// whole allocation, guard region included
    data: Vec<u8>,
    /// offset of payload byte 0 inside `data`
    data_start: usize,
    data_buffer_size: usize,
    bytes_per_sector: usize,
    sector_count: usize,
    random: Option<Random32>,
    use_pattern_mode: bool,
}

struct Allocation {
    data: Vec<u8>,
    data_start: usize,
    data_buffer_size: usize,
}

impl Allocation {
    fn new(total: usize) -> Result<Self> {
        let low_bits = total & (PAGE_SIZE - 1);
        let alignment_offset = if low_bits == 0 { 0 } else { PAGE_SIZE - low_bits };
        let data_buffer_size = total
            .checked_add(alignment_offset)
            .ok_or_else(|| Error::runtime("Buffer allocation error: size overflow"))?;
        let allocated = data_buffer_size
            .checked_add(PAGE_SIZE - 1 + PAGE_SIZE)
            .ok_or_else(|| Error::runtime("Buffer allocation error: size overflow"))?;

        let data = create_buf(allocated);
        let base = data.as_ptr() as usize;
        let data_start = (PAGE_SIZE - base % PAGE_SIZE) % PAGE_SIZE + PAGE_SIZE;
        if data_start + total > allocated {
            return Err(Error::runtime("Buffer allocation error"));
        }

        debug!(
            "allocated {}B for a {}B payload",
            SizeFormatterBinary::new(allocated as u64),
            SizeFormatterBinary::new(total as u64)
        );
        Ok(Self { data, data_start, data_buffer_size })
    }
}

fn total_bytes_for(sector_count: usize, bytes_per_sector: usize) -> Result<usize> {
    Conf::default().with_geometry(sector_count, bytes_per_sector).validate()?;
    sector_count
        .checked_mul(bytes_per_sector)
        .ok_or_else(|| Error::invalid_argument("sectorCount * bytesPerSector overflows the address space."))
}

fn bit_count_table() -> &'static [u8; 256] {
    static TABLE: OnceLock<[u8; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u8; 256];
        for (i, count) in table.iter_mut().enumerate() {
            *count = (0..8).map(|bit| ((i >> bit) & 1) as u8).sum();
        }
        table
    })
}

impl Buffer {
    /// 0x10000 sectors of 512 bytes, pattern mode from the environment
    pub fn new() -> Result<Self> {
        Self::from_conf(&Conf::from_env())
    }

    pub fn with_sector_count(sector_count: usize) -> Result<Self> {
        Self::with_geometry(sector_count, DEFAULT_BYTES_PER_SECTOR)
    }

    pub fn with_geometry(sector_count: usize, bytes_per_sector: usize) -> Result<Self> {
        Self::from_conf(&Conf::from_env().with_geometry(sector_count, bytes_per_sector))
    }

    /// Builds a buffer without consulting the environment.
    pub fn from_conf(conf: &Conf) -> Result<Self> {
        let total = total_bytes_for(conf.sector_count, conf.bytes_per_sector)?;
        let alloc = Allocation::new(total)?;
        let mut buffer = Self {
            name: String::new(),
            data: alloc.data,
            data_start: alloc.data_start,
            data_buffer_size: alloc.data_buffer_size,
            bytes_per_sector: conf.bytes_per_sector,
            sector_count: conf.sector_count,
            random: None,
            use_pattern_mode: conf.pattern_mode,
        };
        buffer.fill(0, 0, 0)?;
        Ok(buffer)
    }

    /// Deep copy of the payload, the generator and the name. The guard region of the
    /// copy starts out zeroed.
    pub fn try_clone(&self) -> Result<Self> {
        let total = self.total_bytes();
        let alloc = Allocation::new(total)?;
        let mut copy = Self {
            name: self.name.clone(),
            data: alloc.data,
            data_start: alloc.data_start,
            data_buffer_size: alloc.data_buffer_size,
            bytes_per_sector: self.bytes_per_sector,
            sector_count: self.sector_count,
            random: self.random.clone(),
            use_pattern_mode: self.use_pattern_mode,
        };
        copy.as_mut_slice().copy_from_slice(self.as_slice());
        Ok(copy)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn bytes_per_sector(&self) -> usize {
        self.bytes_per_sector
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    pub fn total_bytes(&self) -> usize {
        self.sector_count * self.bytes_per_sector
    }

    /// payload size rounded up to whole pages
    pub fn data_buffer_size(&self) -> usize {
        self.data_buffer_size
    }

    pub fn allocated_byte_count(&self) -> usize {
        self.data.len()
    }

    pub fn pattern_mode(&self) -> bool {
        self.use_pattern_mode
    }

    pub fn has_random(&self) -> bool {
        self.random.is_some()
    }

    /// address of payload byte 0, page aligned
    pub fn data_start(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    pub fn data_start_mut(&mut self) -> *mut u8 {
        self.as_mut_slice().as_mut_ptr()
    }

    /// address of the raw allocation, at least one page before [`Buffer::data_start`]
    pub fn allocation_start(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        let end = self.data_start + self.total_bytes();
        &self.data[self.data_start..end]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let end = self.data_start + self.total_bytes();
        &mut self.data[self.data_start..end]
    }

    /// The page directly in front of the payload.
    pub fn guard_region_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.data_start - PAGE_SIZE..self.data_start]
    }

    pub(crate) fn validate_index(&self, index: usize) -> Result<()> {
        if index >= self.total_bytes() {
            return Err(Error::out_of_range(format!(
                "Index (0x{:X}) is greater than or equal to TotalBytes (0x{:X}).",
                index,
                self.total_bytes()
            )));
        }
        Ok(())
    }

    /// Checks the last byte of a `width` byte access starting at `index`.
    pub(crate) fn validate_span(&self, index: usize, width: usize) -> Result<Range<usize>> {
        let last = index
            .checked_add(width - 1)
            .ok_or_else(|| Error::out_of_range(format!("Index (0x{:X}) overflows.", index)))?;
        self.validate_index(last)?;
        Ok(index..last + 1)
    }

    /// Normalizes `(offset, length)`; a zero length runs to the end of the payload.
    pub(crate) fn byte_range(&self, offset: usize, length: usize) -> Result<Range<usize>> {
        let total = self.total_bytes();
        if offset >= total {
            return Err(Error::out_of_range(format!(
                "startingOffset ({}) must be less than the total number of bytes in the buffer ({}).",
                offset, total
            )));
        }
        let length = if length == 0 { total - offset } else { length };
        match offset.checked_add(length) {
            Some(end) if end <= total => Ok(offset..end),
            _ => Err(Error::out_of_range(
                "startingOffset plus length must be less than or equal to the number of bytes in the buffer.",
            )),
        }
    }

    /// Normalizes `(start_sector, count)` into a byte range; a zero count runs to the
    /// last sector.
    pub(crate) fn sector_range(&self, start_sector: usize, count: usize) -> Result<Range<usize>> {
        if start_sector >= self.sector_count {
            return Err(Error::out_of_range("startSector must be less than SectorCount of buffer."));
        }
        let count = if count == 0 { self.sector_count - start_sector } else { count };
        match start_sector.checked_add(count) {
            Some(end) if end <= self.sector_count => {
                Ok(start_sector * self.bytes_per_sector..end * self.bytes_per_sector)
            }
            _ => Err(Error::out_of_range(
                "startSector plus sectorCount must be less than or equal to the SectorCount of buffer.",
            )),
        }
    }

    /// Loop bound check for code that iterates with signed counters.
    pub fn validate_counter_max(max_value: usize) -> Result<()> {
        if max_value as u128 > i64::MAX as u128 {
            return Err(Error::out_of_range(
                "Cannot handle 8 Exabytes of data because the loop counter must be signed",
            ));
        }
        Ok(())
    }

    /// Reallocates for `sector_count` sectors of the current size.
    pub fn resize(&mut self, sector_count: usize) -> Result<&mut Self> {
        self.resize_with_sector_size(sector_count, self.bytes_per_sector)
    }

    /// Reallocates the payload. Leading bytes common to both sizes are kept, the rest is
    /// zero; the generator is dropped.
    pub fn resize_with_sector_size(&mut self, sector_count: usize, bytes_per_sector: usize) -> Result<&mut Self> {
        let new_total = total_bytes_for(sector_count, bytes_per_sector)?;
        let alloc = Allocation::new(new_total)?;
        let keep = self.total_bytes().min(new_total);
        debug!(
            from = self.total_bytes(),
            to = new_total,
            "resizing buffer {:?}",
            self.name
        );

        let old_data = std::mem::replace(&mut self.data, alloc.data);
        let old_start = std::mem::replace(&mut self.data_start, alloc.data_start);
        self.data_buffer_size = alloc.data_buffer_size;
        self.sector_count = sector_count;
        self.bytes_per_sector = bytes_per_sector;
        self.random = None;

        self.fill(0, 0, 0)?;
        self.as_mut_slice()[..keep].copy_from_slice(&old_data[old_start..old_start + keep]);
        Ok(self)
    }

    pub fn get_bytes(&self, offset: usize, length: usize) -> Result<Vec<u8>> {
        let range = self.byte_range(offset, length)?;
        Ok(self.as_slice()[range].to_vec())
    }

    pub fn set_bytes(&mut self, offset: usize, value: &[u8]) -> Result<&mut Self> {
        let range = self.byte_range(offset, value.len())?;
        let start = range.start;
        self.as_mut_slice()[start..start + value.len()].copy_from_slice(value);
        Ok(self)
    }

    /// Bytes of the range as text, one char per byte.
    pub fn get_string(&self, offset: usize, length: usize) -> Result<String> {
        let range = self.byte_range(offset, length)?;
        Ok(self.as_slice()[range].iter().map(|&b| b as char).collect())
    }

    pub fn set_string(&mut self, offset: usize, value: &str) -> Result<&mut Self> {
        self.set_bytes(offset, value.as_bytes())
    }

    /// Two's complement of the byte sum, so that sum + checksum == 0 (mod 256).
    ///
    /// Typical use is sealing a sector: `buf.set_byte(511, buf.calculate_checksum_byte(0, 511)?)`
    pub fn calculate_checksum_byte(&self, start_byte: usize, byte_count: usize) -> Result<u8> {
        if byte_count == 0 {
            return Err(Error::invalid_argument("byteCount must be greater than 0."));
        }
        match start_byte.checked_add(byte_count) {
            Some(end) if end <= self.total_bytes() => {
                let sum = self.as_slice()[start_byte..end]
                    .iter()
                    .fold(0u8, |acc, &b| acc.wrapping_add(b));
                Ok(sum.wrapping_neg())
            }
            _ => Err(Error::out_of_range("startByte + byteCount is greater than TotalBytes.")),
        }
    }

    /// Number of bits equal to `value` (0 counts zeros, anything else counts ones).
    pub fn get_bit_count(&self, offset: usize, length: usize, value: u8) -> Result<u64> {
        let range = self.byte_range(offset, length)?;
        let invert = if value == 0 { 0xFF } else { 0x00 };
        let table = bit_count_table();
        Ok(self.as_slice()[range]
            .iter()
            .map(|&b| table[(b ^ invert) as usize] as u64)
            .sum())
    }

    pub fn is_all_zeros(&self) -> bool {
        self.as_slice().iter().all(|&b| b == 0)
    }

    /// The buffer's generator, created or reseeded for the next random fill.
    ///
    /// With a seed the generator restarts from it. Without one, a generator that the
    /// caller seeded earlier restarts from 0 and a clock-seeded one keeps running.
    pub(crate) fn random_for_fill(&mut self, seed: Option<u32>) -> &mut Random32 {
        match self.random.as_mut() {
            Some(random) => match seed {
                Some(seed) => random.seed(seed),
                None if random.is_seeded() => random.seed(0),
                None => {}
            },
            None => {
                debug!(?seed, "creating buffer generator");
                self.random = Some(match seed {
                    Some(seed) => Random32::with_seed(seed),
                    None => Random32::new(),
                });
            }
        }
        self.random.get_or_insert_with(Random32::new)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("sector_count", &self.sector_count)
            .field("bytes_per_sector", &self.bytes_per_sector)
            .field("pattern_mode", &self.use_pattern_mode)
            .field("has_random", &self.random.is_some())
            .finish()
    }
}
