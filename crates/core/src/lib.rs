//! TicketWave Core - Shared types library.
//!
//! This crate provides common types used across all TicketWave components:
//! - `storefront` - Public JSON API for the pass signup wizard, auth and profiles
//! - `cli` - Command-line tools for migrations and support tasks
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`signup`] - The signup wizard model: steps, form data, drafts and step validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod signup;
pub mod types;

pub use types::*;
