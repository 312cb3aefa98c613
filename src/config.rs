//! Decoder configuration
//!
//! Every field has a default matching the deployed account layout, so an
//! empty TOML document is a valid configuration.
//!
//! ```toml
//! settlement_header_slots = 2
//! max_chain_len = 1024
//! check_leaf_count = true
//! ```

use crate::error::{Error, Result};
use crate::slab::MAX_COLLECTION_PAGES;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "ORDERSLAB_CONFIG";

fn default_settlement_header_slots() -> usize {
    2
}

fn default_max_chain_len() -> usize {
    1024
}

fn default_check_leaf_count() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderConfig {
    /// Collection header slots reserved in a settlement log account
    ///
    /// Only the first two (tree, vector) are decoded; pages start after the
    /// last slot.
    #[serde(default = "default_settlement_header_slots")]
    pub settlement_header_slots: usize,

    /// Most settlement log accounts a chain walk will fetch
    #[serde(default = "default_max_chain_len")]
    pub max_chain_len: usize,

    /// Warn when a tree's stored leaf count disagrees with its leaves
    #[serde(default = "default_check_leaf_count")]
    pub check_leaf_count: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            settlement_header_slots: default_settlement_header_slots(),
            max_chain_len: default_max_chain_len(),
            check_leaf_count: default_check_leaf_count(),
        }
    }
}

impl DecoderConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        info!(path = ?path, "Loaded decoder configuration");
        Ok(config)
    }

    /// Load from an explicit path, else from `ORDERSLAB_CONFIG`, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(2..=MAX_COLLECTION_PAGES).contains(&self.settlement_header_slots) {
            return Err(Error::Config(format!(
                "settlement_header_slots must be between 2 and {}, got {}",
                MAX_COLLECTION_PAGES, self.settlement_header_slots
            )));
        }
        if self.max_chain_len == 0 {
            return Err(Error::Config("max_chain_len must be at least 1".to_string()));
        }
        Ok(())
    }
}
