//! Field-level value types and input validation.
//!
//! # Responsibility
//! - Define the validated scalar types shared by all records.
//! - Convert raw caller input into typed values or a `ValidationError`.
//!
//! # Invariants
//! - A `Price` is non-negative and always carries exactly two decimal places.
//! - A `NationalId` is trimmed and non-empty.
//! - A `RecordId` parsed from input is strictly positive.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Synthetic integer key for products and addresses.
pub type RecordId = i64;

const PRICE_SCALE: u32 = 2;

/// Input rejected before any store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty {
        field: &'static str,
    },
    NotANumber {
        field: &'static str,
        value: String,
    },
    Negative {
        field: &'static str,
    },
    TooManyDecimals {
        field: &'static str,
        scale: u32,
    },
    InvalidKey(String),
    Unsupported {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "`{field}` must not be empty"),
            Self::NotANumber { field, value } => {
                write!(f, "`{field}` expects a number, got `{value}`")
            }
            Self::Negative { field } => write!(f, "`{field}` must not be negative"),
            Self::TooManyDecimals { field, scale } => write!(
                f,
                "`{field}` allows at most {PRICE_SCALE} decimal places, got {scale}"
            ),
            Self::InvalidKey(value) => {
                write!(f, "record id must be a positive integer, got `{value}`")
            }
            Self::Unsupported { field, reason } => {
                write!(f, "`{field}` cannot be changed: {reason}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Non-negative currency amount with two-decimal semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Validates and normalizes `amount` to scale 2.
    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::Negative { field: "price" });
        }

        let normalized = amount.normalize();
        if normalized.scale() > PRICE_SCALE {
            return Err(ValidationError::TooManyDecimals {
                field: "price",
                scale: normalized.scale(),
            });
        }

        let mut value = normalized.abs();
        value.rescale(PRICE_SCALE);
        Ok(Self(value))
    }

    /// Builds a price from an integer number of cents.
    pub fn from_cents(cents: u64) -> Self {
        Self(Decimal::from_i128_with_scale(i128::from(cents), PRICE_SCALE))
    }

    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "price" });
        }
        // Accept a decimal comma as typed on pt-BR keyboards.
        let amount = Decimal::from_str(&trimmed.replace(',', ".")).map_err(|_| {
            ValidationError::NotANumber {
                field: "price",
                value: trimmed.to_string(),
            }
        })?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl ToSql for Price {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Price {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        let amount = Decimal::from_str(text).map_err(|err| FromSqlError::Other(Box::new(err)))?;
        Self::new(amount).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Natural key of a user (a national identity number).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationalId(String);

impl NationalId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "national_id",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NationalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NationalId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NationalId> for String {
    fn from(value: NationalId) -> Self {
        value.0
    }
}

impl ToSql for NationalId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for NationalId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::new(text).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Parses a caller-supplied synthetic key.
///
/// Rejects non-numeric, zero and negative input so that no store call is
/// made with a key that can never exist.
pub fn parse_record_id(input: &str) -> Result<RecordId, ValidationError> {
    let trimmed = input.trim();
    match trimmed.parse::<RecordId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidKey(trimmed.to_string())),
    }
}

/// Parses a non-negative integer field such as a quantity or house number.
pub fn parse_count(field: &'static str, input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.starts_with('-') && trimmed[1..].parse::<u64>().is_ok() {
        return Err(ValidationError::Negative { field });
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: trimmed.to_string(),
        })
}

/// Rejects empty or whitespace-only text.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_count, parse_record_id, NationalId, Price, ValidationError};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn price_is_normalized_to_two_decimals() {
        let price = Price::from_str("12.5").unwrap();
        assert_eq!(price.to_string(), "12.50");
        assert_eq!(Price::from_str("7").unwrap().to_string(), "7.00");
        assert_eq!(Price::from_str("3,99").unwrap().to_string(), "3.99");
        assert_eq!(Price::from_str("1.230").unwrap().to_string(), "1.23");
    }

    #[test]
    fn price_rejects_negative_and_fractional_cents() {
        assert_eq!(
            Price::from_str("-1").unwrap_err(),
            ValidationError::Negative { field: "price" }
        );
        assert!(matches!(
            Price::from_str("0.001").unwrap_err(),
            ValidationError::TooManyDecimals { scale: 3, .. }
        ));
        assert!(matches!(
            Price::from_str("abc").unwrap_err(),
            ValidationError::NotANumber { .. }
        ));
    }

    #[test]
    fn price_from_cents_matches_parsed_value() {
        assert_eq!(Price::from_cents(1250), Price::from_str("12.50").unwrap());
        assert_eq!(Price::from_cents(1250).amount(), Decimal::new(1250, 2));
    }

    #[test]
    fn price_serializes_as_string() {
        let json = serde_json::to_string(&Price::from_cents(1250)).unwrap();
        assert_eq!(json, "\"12.50\"");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Price::from_cents(1250));
        assert!(serde_json::from_str::<Price>("\"-3.00\"").is_err());
    }

    #[test]
    fn national_id_is_trimmed_and_required() {
        assert_eq!(NationalId::new(" 111 ").unwrap().as_str(), "111");
        assert!(NationalId::new("   ").is_err());
    }

    #[test]
    fn record_id_parsing_rejects_non_positive_input() {
        assert_eq!(parse_record_id(" 42 "), Ok(42));
        assert!(parse_record_id("0").is_err());
        assert!(parse_record_id("-3").is_err());
        assert!(parse_record_id("abc").is_err());
    }

    #[test]
    fn count_parsing_distinguishes_negative_from_garbage() {
        assert_eq!(parse_count("quantity", "10"), Ok(10));
        assert_eq!(
            parse_count("quantity", "-1"),
            Err(ValidationError::Negative { field: "quantity" })
        );
        assert!(matches!(
            parse_count("number", "ten"),
            Err(ValidationError::NotANumber { field: "number", .. })
        ));
    }
}
