//! Domain models for storefront.

pub mod order;
pub mod profile;
pub mod session;
pub mod user;

pub use order::Order;
pub use profile::DashboardProfile;
pub use session::{CurrentUser, keys as session_keys};
pub use user::{User, UserView};
