//! Account creation with pass purchase in a single transaction.

use sqlx::PgPool;

use ticketwave_core::{Email, Merchandise, OrderId, PaymentPlan, ShippingAddress};

use super::{RepositoryError, addresses, orders, users};
use crate::models::User;

/// Rows to write for a new registration.
#[derive(Debug)]
pub struct NewRegistration<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub address: Option<&'a ShippingAddress>,
    pub plan: Option<PaymentPlan>,
    pub merchandise: &'a [Merchandise],
}

/// What was written.
#[derive(Debug)]
pub struct CreatedRegistration {
    pub user: User,
    pub order_id: Option<OrderId>,
}

/// Create the user, their address and (when a plan was chosen) the order.
///
/// Either every row is written or none is.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email is already registered.
pub async fn create(
    pool: &PgPool,
    registration: NewRegistration<'_>,
) -> Result<CreatedRegistration, RepositoryError> {
    let mut tx = pool.begin().await?;

    let mut user = users::insert_with_password(
        &mut *tx,
        registration.name,
        registration.email,
        registration.password_hash,
    )
    .await?;

    if let Some(address) = registration.address {
        addresses::upsert(&mut *tx, user.id, address).await?;
    }

    let order_id = match registration.plan {
        Some(plan) => {
            let id = orders::insert(&mut tx, user.id, plan, registration.merchandise).await?;
            orders::mark_has_ticket(&mut *tx, user.id).await?;
            user.has_ticket = true;
            Some(id)
        }
        None => None,
    };

    tx.commit().await?;

    Ok(CreatedRegistration { user, order_id })
}
