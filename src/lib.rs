//! Sector-oriented byte buffers for staging storage-device transfers.
//!
//! A [`Buffer`] is a page-aligned run of equal-sized sectors with a free page in front
//! of it. It can be filled with deterministic patterns (constant, counting, repeated
//! bytes, address overlay, seeded taus88 streams), read and written at byte, word,
//! dword and qword width in either byte order, compared, copied and listed.
//!
//! When `DMX_SIMULATOR_ENABLED` is set to a non-zero value at construction, pattern
//! fills also stamp a small trailer into each sector describing how the sector was
//! generated, see [`io::pass::pattern`].

pub mod buffer;
pub mod compare;
pub mod conf;
pub mod error;
pub mod io;

pub use buffer::{Buffer, ByteGrouping};
pub use compare::CompareResult;
pub use conf::Conf;
pub use error::{Error, ErrorKind, Result};
pub use io::prng::Random32;
