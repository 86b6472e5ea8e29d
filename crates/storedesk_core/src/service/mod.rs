//! Core use-case services.
//!
//! # Responsibility
//! - Expose menu-level record operations over a selected store.
//! - Keep the menu layer decoupled from storage details.

pub mod outcome;
pub mod record_service;
