use crate::compare::CompareResult;
use crate::error::{Error, Result};

use super::Buffer;

impl Buffer {
    /// Compares `count` sectors of this buffer starting at `start_sector` with `other`
    /// starting at `other_start_sector`.
    ///
    /// With `count == 0` both sides run to their last sector and the shorter span is
    /// compared. The reported offset is the absolute byte offset in this buffer.
    pub fn compare_to(
        &self,
        other: &Buffer,
        start_sector: usize,
        other_start_sector: usize,
        count: usize,
    ) -> Result<CompareResult> {
        let ours = self.sector_range(start_sector, count)?;
        let theirs = other.sector_range(other_start_sector, count)?;

        let len = if count == 0 {
            ours.len().min(theirs.len())
        } else if ours.len() != theirs.len() {
            return Err(Error::invalid_argument(
                "Calculated byte counts to compare for the two buffers do not match.",
            ));
        } else {
            ours.len()
        };

        let left = &self.as_slice()[ours.start..ours.start + len];
        let right = &other.as_slice()[theirs.start..theirs.start + len];
        if left == right {
            return Ok(CompareResult::equal());
        }
        let result = left
            .iter()
            .zip(right.iter())
            .position(|(a, b)| a != b)
            .map(|i| CompareResult::with_difference(ours.start + i, left[i], right[i]))
            .unwrap_or_default();
        Ok(result)
    }

    /// Copies sectors of this buffer into `dest`. `count == 0` copies up to the last
    /// source sector. `dest_start_sector` is counted in this buffer's sector size, so
    /// the bytes land at `dest_start_sector * self.bytes_per_sector()` in `dest`.
    pub fn copy_to<'a>(
        &self,
        dest: &'a mut Buffer,
        start_sector: usize,
        dest_start_sector: usize,
        count: usize,
    ) -> Result<&'a mut Buffer> {
        let src = self.sector_range(start_sector, count)?;
        let at = dest.copy_destination(dest_start_sector, self.bytes_per_sector, src.len())?;
        dest.as_mut_slice()[at..at + src.len()].copy_from_slice(&self.as_slice()[src]);
        Ok(dest)
    }

    /// Copies sectors of `src` into this buffer at `start_sector`, counted in this
    /// buffer's sector size.
    pub fn copy_from(
        &mut self,
        src: &Buffer,
        start_sector: usize,
        src_start_sector: usize,
        count: usize,
    ) -> Result<&mut Self> {
        let from = src.sector_range(src_start_sector, count)?;
        let at = self.copy_destination(start_sector, self.bytes_per_sector, from.len())?;
        self.as_mut_slice()[at..at + from.len()].copy_from_slice(&src.as_slice()[from]);
        Ok(self)
    }

    fn copy_destination(&self, start_sector: usize, bytes_per_sector: usize, len: usize) -> Result<usize> {
        let at = start_sector.checked_mul(bytes_per_sector);
        match at.and_then(|at| at.checked_add(len)) {
            Some(end) if end <= self.total_bytes() => Ok(end - len),
            _ => Err(Error::out_of_range(format!(
                "Copying {} bytes to sector {} runs past the end of the destination buffer.",
                len, start_sector
            ))),
        }
    }
}
