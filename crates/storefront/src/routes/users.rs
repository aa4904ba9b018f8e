//! Pass holder profile API.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::info;

use ticketwave_core::ShippingAddress;
use ticketwave_core::signup::{CardDetails, FieldErrors};

use crate::db::addresses::{self, AddressRepository};
use crate::db::orders::OrderRepository;
use crate::db::users::{self, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::DashboardProfile;
use crate::routes::auth::MessageResponse;
use crate::state::AppState;

/// Profile changes. The address is only replaced when all four parts are sent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl UpdateProfileRequest {
    /// Trimmed new name, if one was sent.
    fn name(&self) -> std::result::Result<Option<&str>, FieldErrors> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if name.chars().count() < 2 => Err(FieldErrors::single(
                "name",
                "Name must be at least 2 characters",
            )),
            other => Ok(other),
        }
    }

    fn address(&self) -> Option<ShippingAddress> {
        ShippingAddress::from_parts(
            self.address.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.zip_code.as_deref(),
        )
    }
}

/// Dashboard profile: pass, plan, schedule, merchandise and address.
///
/// GET /api/users/me
///
/// # Errors
///
/// Returns 404 if the account no longer exists.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<DashboardProfile>> {
    let pool = state.pool();
    let user = UserRepository::new(pool)
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let orders = OrderRepository::new(pool);
    let order = orders.active_for_user(user.id).await?;
    let items = match &order {
        Some(order) => orders.items(order.id).await?,
        None => Vec::new(),
    };
    let address = AddressRepository::new(pool).get_for_user(user.id).await?;

    Ok(Json(DashboardProfile::new(
        &user,
        order.as_ref(),
        &items,
        address,
    )))
}

/// Update name and/or shipping address.
///
/// PUT /api/users/me
///
/// Both changes commit together or not at all.
///
/// # Errors
///
/// Returns 400 if the new name is too short.
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>> {
    let name = req.name().map_err(AppError::Validation)?;
    let address = req.address();

    let mut tx = state
        .pool()
        .begin()
        .await
        .map_err(crate::db::RepositoryError::from)?;

    if let Some(name) = name {
        users::update_name(&mut *tx, current.id, name).await?;
    }
    if let Some(address) = &address {
        addresses::upsert(&mut *tx, current.id, address).await?;
    }

    tx.commit().await.map_err(crate::db::RepositoryError::from)?;

    info!(user_id = %current.id, renamed = name.is_some(), moved = address.is_some(), "Profile updated");
    Ok(Json(MessageResponse {
        message: "Profile updated successfully",
    }))
}

/// Replace the card on file.
///
/// PUT /api/users/payment
///
/// Card details are checked and acknowledged; no card data is stored.
///
/// # Errors
///
/// Returns 400 with field errors for a malformed card.
pub async fn update_payment(
    RequireAuth(current): RequireAuth,
    Json(card): Json<CardDetails>,
) -> Result<Json<MessageResponse>> {
    card.validate().map_err(AppError::Validation)?;

    info!(user_id = %current.id, last4 = ?card.last4(), "Payment method updated");
    Ok(Json(MessageResponse {
        message: "Payment method updated successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: Option<&str>, parts: [Option<&str>; 4]) -> UpdateProfileRequest {
        let [address, city, state, zip_code] = parts.map(|p| p.map(str::to_string));
        UpdateProfileRequest {
            name: name.map(str::to_string),
            address,
            city,
            state,
            zip_code,
        }
    }

    #[test]
    fn test_name_is_optional_but_checked() {
        assert_eq!(request(None, [None; 4]).name(), Ok(None));
        assert_eq!(request(Some("  Jo "), [None; 4]).name(), Ok(Some("Jo")));
        assert!(request(Some("J"), [None; 4]).name().is_err());
    }

    #[test]
    fn test_partial_address_ignored() {
        let partial = request(None, [Some("1 Main St"), Some("Newark"), None, Some("07102")]);
        assert!(partial.address().is_none());

        let full = request(
            None,
            [Some("1 Main St"), Some("Newark"), Some("NJ"), Some("07102")],
        );
        assert_eq!(full.address().map(|a| a.zip_code), Some("07102".to_string()));
    }
}
