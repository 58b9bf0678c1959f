use serde_derive::*;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default sector count is the max value for the count of sectors of a 48-bit ATA command
/// (zero on the wire means 0x10000).
pub const DEFAULT_SECTOR_COUNT: usize = 0x10000;
pub const DEFAULT_BYTES_PER_SECTOR: usize = 512;

/// Prefix of the environment switch that turns on simulator pattern mode.
pub const SIMULATOR_ENV_PREFIX: &str = "DMX_SIMULATOR_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Conf {
    /// embed compression-recovery trailers in every pattern-filled sector
    pub pattern_mode: bool,
    pub sector_count: usize,
    /// sector size in bytes, e.g. 512 or 4K
    pub bytes_per_sector: usize,
}

/// Raw view of the `DMX_SIMULATOR_*` variables.
#[derive(Deserialize, Debug, Default)]
struct SimulatorEnv {
    enabled: Option<String>,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            pattern_mode: false,
            sector_count: DEFAULT_SECTOR_COUNT,
            bytes_per_sector: DEFAULT_BYTES_PER_SECTOR,
        }
    }
}

impl Conf {
    /// Default geometry with pattern mode taken from `DMX_SIMULATOR_ENABLED`.
    pub fn from_env() -> Self {
        Self {
            pattern_mode: pattern_mode_from_env(),
            ..Self::default()
        }
    }

    pub fn with_geometry(mut self, sector_count: usize, bytes_per_sector: usize) -> Self {
        self.sector_count = sector_count;
        self.bytes_per_sector = bytes_per_sector;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sector_count < 1 {
            return Err(Error::invalid_argument("sectorCount must be greater than zero."));
        }
        if self.bytes_per_sector < 1 {
            return Err(Error::invalid_argument("bytesPerSector must be greater than zero."));
        }
        Ok(())
    }
}

/// Process environment with non-UTF-8 entries skipped; `std::env::vars` would panic on them.
fn utf8_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

/// Reads the simulator switch. Absent, unreadable or non-UTF-8 means off.
pub fn pattern_mode_from_env() -> bool {
    pattern_mode_from_vars(utf8_vars())
}

fn pattern_mode_from_vars(vars: impl IntoIterator<Item = (String, String)>) -> bool {
    let env: SimulatorEnv = match envy::prefixed(SIMULATOR_ENV_PREFIX).from_iter(vars) {
        Ok(env) => env,
        Err(e) => {
            warn!("ignoring {}ENABLED: {}", SIMULATOR_ENV_PREFIX, e);
            SimulatorEnv::default()
        }
    };
    let enabled = env.enabled.as_deref().map(pattern_mode_from_value).unwrap_or(false);
    if enabled {
        debug!("simulator pattern mode enabled");
    }
    enabled
}

/// Any non-zero decimal value turns pattern mode on. Parsing is lenient the way C `atoi`
/// is: leading blanks and a sign are accepted, trailing garbage is ignored, and text with
/// no leading digits counts as zero.
pub fn pattern_mode_from_value(value: &str) -> bool {
    let s = value.trim_start();
    let s = s.strip_prefix('+').or_else(|| s.strip_prefix('-')).unwrap_or(s);
    s.chars()
        .take_while(|c| c.is_ascii_digit())
        .any(|c| c != '0')
}

pub fn get_test_config() -> Conf {
    Conf {
        pattern_mode: false,
        sector_count: 8,
        bytes_per_sector: 512,
    }
}
