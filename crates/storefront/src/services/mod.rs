//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password accounts, JWTs and email verification
//! - `email` - Verification email delivery
//! - `identity` - Google and Apple identity-token checks
//! - `registration` - Account plus pass order creation for completed signups

pub mod auth;
pub mod email;
pub mod identity;
pub mod registration;
