//! Inventory model: products, warehouses, storage zones and inventory records.
//!
//! This crate contains the entity definitions and their field-level
//! invariants, implemented purely as deterministic domain logic (no IO, no
//! storage). Stores and the operations that mutate stock live in
//! `warehouse-infra`.

pub mod product;
pub mod record;
pub mod validation;
pub mod warehouse;

pub use product::{NewProduct, Price, Product, ProductPatch, Sku};
pub use record::{InventoryKey, InventoryLine, InventoryRecord, Location};
pub use warehouse::{Capacity, NewZone, StorageZone, Warehouse, ZoneStock};
