//! Loader configuration.

use serde::{Deserialize, Serialize};

/// Largest ELF the loader accepts (0x0FFFFFFF bytes)
pub const DEFAULT_MAX_ELF_SIZE: u64 = 0x0FFF_FFFF;

/// Settings applied while loading an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Upper bound for a declared ELF size; larger sizes fail with `TooLarge`.
    pub max_elf_size: u64,
    /// Dump every program and section header as diagnostics after loading.
    pub dump_headers_on_load: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_elf_size: DEFAULT_MAX_ELF_SIZE,
            dump_headers_on_load: false,
        }
    }
}

impl LoaderConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
