use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use warehouse_core::{DomainError, DomainResult, Entity, ProductId, ValueObject};

use crate::validation::non_empty;

/// Stock keeping unit. Globally unique across products (enforced by the store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn parse(value: &str) -> DomainResult<Self> {
        non_empty("sku", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for Sku {}

/// Unit price. Always strictly positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "price must be positive, got {amount}"
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl ValueObject for Price {}

/// Validated input for creating a product. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: Sku,
    pub price: Price,
}

impl NewProduct {
    pub fn new(name: &str, sku: &str, price: Decimal) -> DomainResult<Self> {
        Ok(Self {
            name: non_empty("name", name)?,
            sku: Sku::parse(sku)?,
            price: Price::new(price)?,
        })
    }
}

/// Partial update of a product. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<Sku>,
    pub price: Option<Price>,
}

impl ProductPatch {
    /// Build a patch, validating every field that is present.
    pub fn new(
        name: Option<&str>,
        sku: Option<&str>,
        price: Option<Decimal>,
    ) -> DomainResult<Self> {
        Ok(Self {
            name: name.map(|n| non_empty("name", n)).transpose()?,
            sku: sku.map(Sku::parse).transpose()?,
            price: price.map(Price::new).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.sku.is_none() && self.price.is_none()
    }
}

/// Catalog entry for a physical good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    sku: Sku,
    price: Price,
}

impl Product {
    pub fn from_new(id: ProductId, new: NewProduct) -> Self {
        Self {
            id,
            name: new.name,
            sku: new.sku,
            price: new.price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Apply a validated patch in place.
    pub fn apply(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(sku) = &patch.sku {
            self.sku = sku.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
