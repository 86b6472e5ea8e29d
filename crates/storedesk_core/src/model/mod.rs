//! Record model for users, products and addresses.
//!
//! # Responsibility
//! - Define the canonical record, draft and patch shapes per entity type.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Users are keyed by a caller-supplied `NationalId` that never changes.
//! - Products and addresses are keyed by a store-assigned `RecordId`.
//! - Patches only carry the attributes an entity allows to change.

use std::fmt::{Display, Formatter};

pub mod address;
pub mod product;
pub mod user;
pub mod validation;

/// The three managed entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Product,
    Address,
}

impl EntityKind {
    /// Singular lowercase name used in log events and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Product => "product",
            Self::Address => "address",
        }
    }

    /// Collection name in the document backend, also its sequence name.
    pub fn collection(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Product => "products",
            Self::Address => "addresses",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
