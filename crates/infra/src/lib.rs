//! Infrastructure layer: inventory store, the inventory engine, configuration.

pub mod config;
pub mod engine;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, InventoryConfig};
pub use engine::{
    EngineError, EngineOptions, EngineResult, EntryOutcome, InventoryEngine,
    ProductDeletionPolicy, ReconcileEntry, ReconcileReport, Transfer,
};
pub use store::{InMemoryInventoryStore, InventoryStore, StoreError, StoreResult, StoreTransaction};
