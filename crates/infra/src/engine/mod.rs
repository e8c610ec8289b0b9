//! Inventory engine: stock-in, transfer and reconciliation over an `InventoryStore`.
//!
//! The engine is stateless. Every operation validates its arguments before
//! touching the store, reads the current state, computes the new state with the
//! model's checked arithmetic and writes it back. Store failures are converted
//! to [`EngineError`] kinds here.
//!
//! ## Transfer atomicity
//!
//! A transfer is two writes (decrement source, credit destination). With
//! `EngineOptions::atomic_transfers` (the default) both writes run inside one
//! store transaction, so a failure on the destination side rolls the source
//! decrement back. With it off, the writes are independent and a failure
//! between them loses the moved quantity.

mod error;
mod report;

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use warehouse_core::{Entity, InventoryId, ProductId, WarehouseId, ZoneId};
use warehouse_inventory::validation::positive_quantity;
use warehouse_inventory::{
    InventoryKey, InventoryLine, Location, NewProduct, NewZone, Product, ProductPatch, ZoneStock,
};

use crate::store::{InventoryStore, StoreTransaction};

pub use error::{EngineError, EngineResult};
pub use report::{EntryOutcome, ReconcileEntry, ReconcileReport};

/// What to do when asked to delete a product that still has stock.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductDeletionPolicy {
    /// Delete anyway; inventory records keep pointing at the missing product.
    Orphan,
    /// Refuse with `Conflict` while any record of the product holds stock.
    #[default]
    Block,
}

impl FromStr for ProductDeletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orphan" => Ok(Self::Orphan),
            "block" => Ok(Self::Block),
            other => Err(format!("expected 'orphan' or 'block', got '{other}'")),
        }
    }
}

/// Behavior switches of the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Run both sides of a transfer inside one store transaction.
    pub atomic_transfers: bool,
    /// Reject locations whose warehouse is unknown or whose zone is unknown or
    /// belongs to another warehouse.
    pub strict_zones: bool,
    pub product_deletion: ProductDeletionPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            atomic_transfers: true,
            strict_zones: false,
            product_deletion: ProductDeletionPolicy::Block,
        }
    }
}

/// Request to move `quantity` units of a product between two locations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub product_id: ProductId,
    pub from: Location,
    pub to: Location,
    pub quantity: u64,
}

impl Transfer {
    pub fn new(product_id: ProductId, from: Location, to: Location, quantity: u64) -> Self {
        Self {
            product_id,
            from,
            to,
            quantity,
        }
    }

    pub fn source_key(&self) -> InventoryKey {
        InventoryKey::new(self.product_id, self.from)
    }

    pub fn destination_key(&self) -> InventoryKey {
        InventoryKey::new(self.product_id, self.to)
    }
}

/// Stateless inventory operations over a store.
#[derive(Debug, Clone)]
pub struct InventoryEngine<S> {
    store: S,
    options: EngineOptions,
}

impl<S> InventoryEngine<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    pub fn with_options(store: S, options: EngineOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    #[instrument(skip(self), err)]
    pub fn add_product(&self, name: &str, sku: &str, price: Decimal) -> EngineResult<ProductId> {
        let product = NewProduct::new(name, sku, price)?;
        let id = self.store.create_product(product)?;
        info!(product_id = %id, "product created");
        Ok(id)
    }

    pub fn get_product(&self, id: ProductId) -> EngineResult<Product> {
        Ok(self.store.get_product(id)?)
    }

    #[instrument(skip(self), err)]
    pub fn update_product(&self, id: ProductId, patch: ProductPatch) -> EngineResult<Product> {
        if patch.is_empty() {
            return Err(EngineError::Validation("update has no fields".to_string()));
        }
        let product = self.store.update_product(id, &patch)?;
        info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Delete a product according to the configured [`ProductDeletionPolicy`].
    #[instrument(skip(self), err)]
    pub fn delete_product(&self, id: ProductId) -> EngineResult<()> {
        if self.options.product_deletion == ProductDeletionPolicy::Block {
            let stocked = self
                .store
                .list_inventory_for_product(id)?
                .iter()
                .fold(0u64, |total, r| total.saturating_add(r.quantity()));
            if stocked > 0 {
                warn!(product_id = %id, stocked, "refusing to delete stocked product");
                return Err(EngineError::Conflict(format!(
                    "product {id} still has {stocked} units in stock"
                )));
            }
        }
        self.store.delete_product(id)?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub fn add_zone(
        &self,
        name: &str,
        capacity: u32,
        warehouse_id: WarehouseId,
    ) -> EngineResult<ZoneId> {
        let zone = NewZone::new(name, capacity, warehouse_id)?;
        let id = self.store.create_zone(zone)?;
        info!(zone_id = %id, warehouse_id = %warehouse_id, "zone created");
        Ok(id)
    }

    /// Receive `quantity` units of a product at `location`.
    ///
    /// Adds to the existing record for the location or creates one. The read
    /// and the write run in one store transaction.
    #[instrument(skip(self, location), fields(location = %location), err)]
    pub fn stock_in(
        &self,
        product_id: ProductId,
        location: Location,
        quantity: u64,
    ) -> EngineResult<InventoryId> {
        positive_quantity("quantity", quantity)?;
        self.store.get_product(product_id)?;
        self.check_location(location)?;

        let key = InventoryKey::new(product_id, location);
        let tx = self.store.begin()?;
        let id = match self.store.find_inventory(key)? {
            Some(record) => {
                let total = record.after_deposit(quantity)?;
                self.store.set_inventory_quantity(record.id(), total)?;
                record.id()
            }
            None => self.store.upsert_inventory(key, quantity)?,
        };
        tx.commit()?;
        info!(inventory_id = %id, quantity, "stock received");
        Ok(id)
    }

    /// Move stock between two locations.
    ///
    /// Fails with `InsufficientStock` without touching the store if the source
    /// record is missing or holds less than requested. Source and destination
    /// may be the same location; the decrement and increment then cancel out.
    #[instrument(
        skip(self, request),
        fields(
            product_id = %request.product_id,
            from = %request.from,
            to = %request.to,
            quantity = request.quantity
        ),
        err
    )]
    pub fn transfer(&self, request: &Transfer) -> EngineResult<()> {
        positive_quantity("transfer quantity", request.quantity)?;
        self.check_location(request.from)?;
        self.check_location(request.to)?;

        if self.options.atomic_transfers {
            let tx = self.store.begin()?;
            self.move_stock(request)?;
            tx.commit()?;
        } else {
            self.move_stock(request)?;
        }

        info!("transfer completed");
        Ok(())
    }

    fn move_stock(&self, request: &Transfer) -> EngineResult<()> {
        let source = self
            .store
            .find_inventory(request.source_key())?
            .ok_or(EngineError::InsufficientStock {
                requested: request.quantity,
                available: 0,
            })?;
        let remaining = source.after_withdrawal(request.quantity).inspect_err(|_| {
            warn!(available = source.quantity(), "insufficient stock at source");
        })?;
        self.store.set_inventory_quantity(source.id(), remaining)?;
        debug!(inventory_id = %source.id(), remaining, "source decremented");

        // Re-read after the decrement so a same-location transfer sees it.
        match self.store.find_inventory(request.destination_key())? {
            Some(destination) => {
                let total = destination.after_deposit(request.quantity)?;
                self.store.set_inventory_quantity(destination.id(), total)?;
                debug!(inventory_id = %destination.id(), total, "destination credited");
            }
            None => {
                let id = self
                    .store
                    .upsert_inventory(request.destination_key(), request.quantity)?;
                debug!(inventory_id = %id, "destination record created");
            }
        }
        Ok(())
    }

    /// Overwrite zone-less quantities of a warehouse with physically counted ones.
    ///
    /// Best-effort: each entry is applied independently and a failing entry does
    /// not stop the others. The call succeeds once every entry was attempted;
    /// per-entry results are in the returned report.
    #[instrument(skip(self, counted), fields(entries = counted.len()), err)]
    pub fn reconcile(
        &self,
        warehouse_id: WarehouseId,
        counted: &BTreeMap<ProductId, u64>,
    ) -> EngineResult<ReconcileReport> {
        if counted.is_empty() {
            return Err(EngineError::Validation("no counted quantities supplied".to_string()));
        }
        self.check_location(Location::warehouse(warehouse_id))?;

        let entries: Vec<ReconcileEntry> = counted
            .iter()
            .map(|(&product_id, &quantity)| {
                let key = InventoryKey::new(product_id, Location::warehouse(warehouse_id));
                let outcome = self.reconcile_entry(key, quantity).unwrap_or_else(|err| {
                    warn!(product_id = %product_id, error = %err, "reconciliation entry failed");
                    EntryOutcome::Failed {
                        reason: err.to_string(),
                    }
                });
                ReconcileEntry {
                    product_id,
                    counted: quantity,
                    outcome,
                }
            })
            .collect();

        let report = ReconcileReport {
            warehouse_id,
            reconciled_at: Utc::now(),
            entries,
        };
        info!(
            changed = report.changed(),
            failed = report.failures().count(),
            "reconciliation completed"
        );
        Ok(report)
    }

    fn reconcile_entry(&self, key: InventoryKey, counted: u64) -> EngineResult<EntryOutcome> {
        match self.store.find_inventory(key)? {
            Some(record) if record.quantity() == counted => {
                Ok(EntryOutcome::Unchanged { quantity: counted })
            }
            Some(record) => {
                self.store.set_inventory_quantity(record.id(), counted)?;
                Ok(EntryOutcome::Adjusted {
                    from: record.quantity(),
                    to: counted,
                })
            }
            None => {
                self.store.upsert_inventory(key, counted)?;
                Ok(EntryOutcome::Created { quantity: counted })
            }
        }
    }

    /// Inventory of a warehouse joined with products, warehouse and zones.
    pub fn stock_report(&self, warehouse_id: WarehouseId) -> EngineResult<Vec<InventoryLine>> {
        Ok(self.store.list_inventory(warehouse_id)?)
    }

    /// Zones of a warehouse with their records; see [`ZoneStock::occupancy`].
    pub fn zone_report(&self, warehouse_id: WarehouseId) -> EngineResult<Vec<ZoneStock>> {
        Ok(self.store.list_zones(warehouse_id)?)
    }

    fn check_location(&self, location: Location) -> EngineResult<()> {
        if !self.options.strict_zones {
            return Ok(());
        }
        let warehouse_id = location.warehouse_id;
        if self.store.get_warehouse(warehouse_id).is_err() {
            return Err(EngineError::Validation(format!("unknown warehouse {warehouse_id}")));
        }
        if let Some(zone_id) = location.zone_id {
            let zone = self
                .store
                .get_zone(zone_id)
                .map_err(|_| EngineError::Validation(format!("unknown zone {zone_id}")))?;
            if !zone.belongs_to(warehouse_id) {
                return Err(EngineError::Validation(format!(
                    "zone {zone_id} belongs to warehouse {}, not {warehouse_id}",
                    zone.warehouse_id()
                )));
            }
        }
        Ok(())
    }
}
