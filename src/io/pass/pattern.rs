//! Pattern amplification and the compression-simulator sector trailer.
//!
//! In pattern mode every pattern-filled sector ends with a 21 byte trailer that lets a
//! device simulator store the rule instead of the data:
//!
//! ```text
//! [0 .. S-21]  [S-21 .. S-13]  [S-13 .. S-1]  [S-1]
//!  payload      LBA (8)         pattern (12)   type << 4 | pattern length
//! ```

/// Bytes reserved at the end of each sector.
pub const COMPRESSION_SIZE_PER_SECTOR: usize = 21;
pub const COMPRESSION_LBA_SIZE: usize = 8;
pub const COMPRESSION_PATTERN_SIZE: usize = 12;
/// Longer patterns are not described; their sectors are left untouched.
pub const COMPRESSION_MAX_PATTERN_LEN: usize = 8;

/// Copies stop doubling once they reach this length; larger memcpys are not faster.
const AMPLIFY_CAP: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PatternKind {
    Fixed = 0,
    Incrementing = 1,
    Decrementing = 2,
    Random = 3,
}

impl PatternKind {
    pub fn type_byte(self, pattern_len: u8) -> u8 {
        ((self as u8) << 4) | (pattern_len & 0x0F)
    }
}

/// Repeats `data[pattern_start..pattern_start + pattern_len]` over `data[start..end]`.
///
/// `start` must directly follow the pattern. Each copy reads from the pattern start
/// and doubles in length, so the range fills with a logarithmic number of copies.
pub fn amplify(data: &mut [u8], pattern_start: usize, mut pattern_len: usize, mut start: usize, end: usize) {
    if pattern_len == 0 {
        return;
    }
    while start < end {
        let copy_len = pattern_len.min(end - start);
        data.copy_within(pattern_start..pattern_start + copy_len, start);
        start += copy_len;
        if pattern_len < AMPLIFY_CAP {
            pattern_len *= 2;
        }
    }
}

/// Stamps the trailer into every sector of `sectors`, which must hold whole sectors.
pub fn write_compression_info(sectors: &mut [u8], bytes_per_sector: usize, kind: PatternKind, pattern_len: usize) {
    if pattern_len > COMPRESSION_MAX_PATTERN_LEN
        || bytes_per_sector < COMPRESSION_SIZE_PER_SECTOR
        || sectors.is_empty()
    {
        return;
    }

    // zero-filled sectors are used to verify empty pages, they must stay all zero
    let zero_page = sectors[0] == 0 && kind == PatternKind::Fixed;
    let type_at = bytes_per_sector - 1;
    let lba_at = bytes_per_sector - COMPRESSION_SIZE_PER_SECTOR;
    let pattern_at = lba_at + COMPRESSION_LBA_SIZE;

    for sector in sectors.chunks_exact_mut(bytes_per_sector) {
        if !zero_page {
            sector[type_at] = kind.type_byte(pattern_len as u8);
        }
        if kind != PatternKind::Random {
            sector.copy_within(lba_at..lba_at + pattern_len, pattern_at);
        }
    }
}

/// Writes a generator snapshot over the pattern field of one sector.
pub fn write_generator_state(sector: &mut [u8], state: &[u8; COMPRESSION_PATTERN_SIZE]) {
    let len = sector.len();
    if len < COMPRESSION_SIZE_PER_SECTOR {
        return;
    }
    let at = len - 1 - COMPRESSION_PATTERN_SIZE;
    sector[at..at + COMPRESSION_PATTERN_SIZE].copy_from_slice(state);
}
