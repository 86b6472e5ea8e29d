//! User record.

use super::validation::{require_text, NationalId, ValidationError};
use serde::{Deserialize, Serialize};

/// A user identified by a natural key.
///
/// The same shape is used as the create draft, since the caller supplies
/// the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub national_id: NationalId,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(national_id: NationalId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            national_id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Checks attribute invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;
        Ok(())
    }
}

/// Partial update for a user. `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    /// Rejects present-but-blank values; absent values are fine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(email) = &self.email {
            require_text("email", email)?;
        }
        Ok(())
    }
}
