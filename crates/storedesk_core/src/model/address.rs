//! Address record.

use super::validation::RecordId;
use serde::{Deserialize, Serialize};

/// A stored address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: RecordId,
    pub street: String,
    pub number: u32,
    pub neighborhood: String,
    pub city: String,
    pub postal_code: String,
    pub complement: String,
}

/// Create draft; the key is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub street: String,
    pub number: u32,
    pub neighborhood: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default)]
    pub complement: String,
}

impl NewAddress {
    pub fn into_address(self, id: RecordId) -> Address {
        Address {
            id,
            street: self.street,
            number: self.number,
            neighborhood: self.neighborhood,
            city: self.city,
            postal_code: self.postal_code,
            complement: self.complement,
        }
    }
}

/// Street and number always change together; `complement` is optional and
/// only honored by stores that report `address_complement_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPatch {
    pub street: String,
    pub number: u32,
    pub complement: Option<String>,
}
