use maligned::{A4096, align_first};

pub mod pattern;
pub mod random;

/// Payload alignment and size of the leading guard region.
pub const PAGE_SIZE: usize = 4096;

/// create page-aligned, zeroed buffer
pub fn create_buf(len: usize) -> Vec<u8> {
    let mut buf = align_first::<_,A4096>(len);
    debug_assert_eq!(buf.capacity(),len);
    buf.resize(len, 0);
    debug_assert_eq!(buf.len(),len);
    buf
}

/// Sector loops are only worth spreading over threads when they are long enough.
pub fn run_in_parallel(start_sector: usize, sector_count: usize) -> bool {
    (start_sector < 100 && sector_count >= 1000) || (start_sector >= 100 && sector_count >= 500)
}
