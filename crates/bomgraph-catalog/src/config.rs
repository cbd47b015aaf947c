//! Catalog configuration (`config.toml` at the catalog root).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::atomic::atomic_write;
use crate::error::CatalogError;

pub const CONFIG_FILE: &str = "config.toml";

/// Default permission bits for object blobs.
pub const DEFAULT_OBJECT_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub catalog: StoreSection,
    pub build: BuildSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub object_mode: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            object_mode: DEFAULT_OBJECT_MODE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub ranker: RankerPolicy,
}

/// Recipe selection policy used when several recipes produce one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankerPolicy {
    /// First-declared recipe wins.
    #[default]
    First,
    /// Shortest cycle time wins; declaration order breaks ties.
    CycleTime,
}

impl CatalogConfig {
    /// Load `config.toml` from a catalog root. A missing file yields defaults.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = root.as_ref().join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        Self::parse(&raw).map_err(|e| match e {
            CatalogError::Config(message) => {
                CatalogError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        toml::from_str(raw).map_err(|e| CatalogError::Config(e.to_string()))
    }

    pub fn save(&self, root: impl AsRef<Path>) -> Result<(), CatalogError> {
        let rendered =
            toml::to_string_pretty(self).map_err(|e| CatalogError::Config(e.to_string()))?;
        atomic_write(
            &root.as_ref().join(CONFIG_FILE),
            rendered.as_bytes(),
            DEFAULT_OBJECT_MODE,
        )
    }
}
