//! `warehouse-core` — shared building blocks for the warehouse domain.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{InventoryId, ProductId, WarehouseId, ZoneId};
pub use value_object::ValueObject;
