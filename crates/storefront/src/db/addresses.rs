//! Shipping address repository.

use sqlx::{FromRow, PgExecutor, PgPool};

use ticketwave_core::{ShippingAddress, UserId};

use super::RepositoryError;

#[derive(FromRow)]
struct AddressRow {
    address: String,
    city: String,
    state: String,
    zip_code: String,
}

impl From<AddressRow> for ShippingAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
        }
    }
}

/// Insert or replace a user's shipping address.
///
/// Each user has at most one address.
pub(crate) async fn upsert<'e>(
    executor: impl PgExecutor<'e>,
    user_id: UserId,
    address: &ShippingAddress,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shipping_addresses (user_id, address, city, state, zip_code) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (user_id) DO UPDATE SET \
             address = EXCLUDED.address, city = EXCLUDED.city, \
             state = EXCLUDED.state, zip_code = EXCLUDED.zip_code, updated_at = NOW()",
    )
    .bind(user_id)
    .bind(&address.address)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.zip_code)
    .execute(executor)
    .await?;
    Ok(())
}

/// Repository for shipping addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the address on file for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<ShippingAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            "SELECT address, city, state, zip_code FROM shipping_addresses WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(ShippingAddress::from))
    }
}
