//! Hex and ASCII listing of buffer contents.

use std::fmt::{self, Write};

use serde_derive::*;

use crate::error::{Error, Result};

use super::Buffer;

/// Width of a hex column group, in hex characters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteGrouping {
    #[default]
    Byte = 2,
    Word = 4,
    DWord = 8,
}

/// Renders `bytes[start..end]`. Every sector opens with `Block N`, every row holds 16
/// bytes behind a six digit offset, followed by the printable ASCII of the row.
fn write_bytes<W: Write>(
    out: &mut W,
    bytes: &[u8],
    start: usize,
    end: usize,
    sector_size: usize,
    grouping: ByteGrouping,
) -> fmt::Result {
    let group = grouping as usize;

    for i in start..end {
        if sector_size > 0 && i % sector_size == 0 {
            if i > 0 {
                out.write_char('\n')?;
            }
            write!(out, "Block {:X}", i / sector_size)?;
        }

        let sector_offset = if sector_size > 0 { i % sector_size } else { i };
        if sector_offset % 16 == 0 {
            write!(out, "\n{:06X}    ", i)?;
        }

        write!(out, "{:02X}", bytes[i])?;
        if ((sector_offset + 1) * 2) % group == 0 {
            out.write_char(' ')?;
        }

        if (sector_offset + 1) % 16 == 0 || sector_offset + 1 == sector_size {
            // pad a short row so the ASCII column lines up
            let mut filler = 0;
            while (sector_offset + 1 + filler) % 16 != 0 {
                out.write_str("  ")?;
                if ((sector_offset + 1 + filler) * 2) % group == 0 {
                    out.write_char(' ')?;
                }
                filler += 1;
            }
            out.write_str("   ")?;

            let in_row = match (sector_offset + 1) % 16 {
                0 => 16,
                n => n,
            };
            for &b in &bytes[i + 1 - in_row..=i] {
                out.write_char(if (32..=126).contains(&b) { b as char } else { '.' })?;
            }
        }
    }

    out.write_char('\n')
}

impl Buffer {
    /// Listing of `count` sectors from `start_sector`; `count == 0` runs to the end.
    pub fn format_sectors(&self, start_sector: usize, count: usize, grouping: ByteGrouping) -> Result<String> {
        let range = self.sector_range(start_sector, count)?;
        let mut out = String::new();
        write_bytes(&mut out, self.as_slice(), range.start, range.end, self.bytes_per_sector, grouping)
            .map_err(|e| Error::runtime(format!("formatting buffer contents failed: {}", e)))?;
        Ok(out)
    }
}

/// Up to two sectors, with a vertical ellipsis when the buffer holds more.
impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.sector_count.min(2);
        let range = self.sector_range(0, shown).map_err(|_| fmt::Error)?;
        write_bytes(f, self.as_slice(), range.start, range.end, self.bytes_per_sector, ByteGrouping::Byte)?;
        if self.sector_count > 2 {
            f.write_str(".\n.\n.")?;
        }
        Ok(())
    }
}
