//! Configuration loading and representation.
//!
//! Settings come from environment variables. Every setting has a default, so an
//! empty environment yields [`InventoryConfig::default`].

use thiserror::Error;
use tracing::debug;

use crate::engine::{EngineOptions, InventoryEngine, ProductDeletionPolicy};
use crate::store::InMemoryInventoryStore;

pub const ATOMIC_TRANSFERS: &str = "INVENTORY_ATOMIC_TRANSFERS";
pub const STRICT_ZONES: &str = "INVENTORY_STRICT_ZONES";
pub const PRODUCT_DELETION: &str = "INVENTORY_PRODUCT_DELETION";
pub const SEED: &str = "INVENTORY_SEED";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryConfig {
    pub engine: EngineOptions,
    /// Populate the in-memory store with the reference warehouses and zones.
    pub seed_reference_data: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            seed_reference_data: true,
        }
    }
}

impl InventoryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (tests, layered sources).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let atomic_transfers = match lookup(ATOMIC_TRANSFERS) {
            Some(raw) => parse_bool(ATOMIC_TRANSFERS, &raw)?,
            None => defaults.engine.atomic_transfers,
        };
        let strict_zones = match lookup(STRICT_ZONES) {
            Some(raw) => parse_bool(STRICT_ZONES, &raw)?,
            None => defaults.engine.strict_zones,
        };
        let product_deletion = match lookup(PRODUCT_DELETION) {
            Some(raw) => raw
                .parse::<ProductDeletionPolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    key: PRODUCT_DELETION,
                    value: raw.clone(),
                    reason,
                })?,
            None => defaults.engine.product_deletion,
        };
        let seed_reference_data = match lookup(SEED) {
            Some(raw) => parse_bool(SEED, &raw)?,
            None => defaults.seed_reference_data,
        };

        let config = Self {
            engine: EngineOptions {
                atomic_transfers,
                strict_zones,
                product_deletion,
            },
            seed_reference_data,
        };
        debug!(?config, "inventory configuration loaded");
        Ok(config)
    }

    pub fn open_store(&self) -> InMemoryInventoryStore {
        if self.seed_reference_data {
            InMemoryInventoryStore::seeded()
        } else {
            InMemoryInventoryStore::new()
        }
    }

    /// Engine over a fresh in-memory store, configured by `self`.
    pub fn build_engine(&self) -> InventoryEngine<InMemoryInventoryStore> {
        InventoryEngine::with_options(self.open_store(), self.engine)
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
