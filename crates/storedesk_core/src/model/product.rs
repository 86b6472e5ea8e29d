//! Product record.

use super::validation::{Price, RecordId};
use serde::{Deserialize, Serialize};

/// A stored product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

/// Create draft; the key is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Price, quantity: u32) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
        }
    }

    pub fn into_product(self, id: RecordId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// Only the price of a product can change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductPatch {
    pub price: Price,
}
