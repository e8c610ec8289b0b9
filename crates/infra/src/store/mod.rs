//! Inventory store boundary.
//!
//! This module defines the persistence contract the inventory engine consumes,
//! without making any storage assumptions, plus an in-memory reference
//! implementation seeded with the fixed warehouse/zone reference data.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryInventoryStore, InMemoryTransaction};
pub use r#trait::{InventoryStore, StoreError, StoreResult, StoreTransaction};
