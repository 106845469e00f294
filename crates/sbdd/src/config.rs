//! The configuration of a disk.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::prelude::*;
use crate::stack::DISK_NAME_LEN;
use crate::{DEFAULT_CAPACITY_MIB, DEFAULT_NAME};

/// The configuration of a disk, read once when the disk is created.
///
/// In JSON, both fields are optional:
/// ```json
/// { "name": "sbdd", "capacity_mib": 100 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SbddConfig {
    /// The name the disk is registered under.
    #[serde(default = "default_name")]
    pub name: String,
    /// The capacity in MiB.
    #[serde(default = "default_capacity_mib")]
    pub capacity_mib: u64,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_capacity_mib() -> u64 {
    DEFAULT_CAPACITY_MIB
}

impl Default for SbddConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            capacity_mib: default_capacity_mib(),
        }
    }
}

impl SbddConfig {
    pub fn new(name: &str, capacity_mib: u64) -> Self {
        Self {
            name: name.to_string(),
            capacity_mib,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > DISK_NAME_LEN {
            return_errno!(EINVAL, "the disk name must have 1 to 32 bytes");
        }
        self.capacity_sectors()?;
        Ok(())
    }

    /// Returns the capacity in sectors.
    pub fn capacity_sectors(&self) -> Result<Sector> {
        if self.capacity_mib == 0 {
            return_errno!(EINVAL, "the capacity must be positive");
        }
        crate::sector::capacity_from_mib(self.capacity_mib)
            .ok_or_else(|| errno!(EINVAL, "the capacity is too large"))
    }
}
