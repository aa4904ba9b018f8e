//! Core types for TicketWave.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod pass;
pub mod price;
pub mod status;

pub use address::ShippingAddress;
pub use email::{Email, EmailError};
pub use id::*;
pub use pass::{MERCHANDISE_PICKS, Merchandise, PaymentPlan};
pub use price::{CurrencyCode, Price};
pub use status::*;
