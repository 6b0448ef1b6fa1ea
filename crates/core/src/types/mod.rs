//! Core types for Leadbook.
//!
//! This module provides type-safe wrappers for the buyer-lead domain.

pub mod buyer;
pub mod email;
pub mod id;
pub mod status;

pub use buyer::{Buyer, BuyerDraft, BuyerHistory, BuyerSummary, OptionalField, diff_buyer};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
