//! Dashboard profile assembled from user, order and address rows.

use chrono::NaiveDate;
use serde::Serialize;

use ticketwave_core::{Email, Merchandise, OrderStatus, PaymentPlan, ShippingAddress};

use super::{Order, User};

/// Everything the dashboard shows about a pass holder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardProfile {
    pub name: String,
    pub email: Email,
    pub is_email_verified: bool,
    pub has_pass: bool,
    pub purchase_date: Option<NaiveDate>,
    pub payment_plan: Option<PaymentPlan>,
    pub payment_status: Option<OrderStatus>,
    pub next_payment_date: Option<NaiveDate>,
    pub remaining_payments: Option<u32>,
    /// Display names of the bundled merchandise.
    pub merchandise: Vec<String>,
    pub shipping_address: Option<ShippingAddress>,
}

impl DashboardProfile {
    /// Assemble the profile. Unknown item ids are shown as stored.
    #[must_use]
    pub fn new(
        user: &User,
        order: Option<&Order>,
        item_ids: &[String],
        shipping_address: Option<ShippingAddress>,
    ) -> Self {
        let merchandise = item_ids
            .iter()
            .map(|id| Merchandise::from_id(id).map_or_else(|| id.clone(), |m| m.name().to_string()))
            .collect();

        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            is_email_verified: user.email_verified,
            has_pass: order.is_some(),
            purchase_date: order.map(|o| o.created_at.date_naive()),
            payment_plan: order.map(|o| o.plan),
            payment_status: order.map(|o| o.status),
            next_payment_date: order.and_then(Order::next_payment_date),
            remaining_payments: order.and_then(Order::remaining_payments),
            merchandise,
            shipping_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ticketwave_core::{OrderId, UserId};

    use super::*;
    use crate::models::user::tests::user;

    #[test]
    fn test_profile_without_order() {
        let profile = DashboardProfile::new(&user(true, false), None, &[], None);
        assert!(!profile.has_pass);
        assert_eq!(profile.payment_plan, None);
        assert_eq!(profile.next_payment_date, None);

        let json = serde_json::to_value(&profile).expect("serializes");
        assert_eq!(json["hasPass"], false);
        assert!(json["shippingAddress"].is_null());
    }

    #[test]
    fn test_profile_with_installment_order() {
        let order = Order {
            id: OrderId::new(3),
            user_id: UserId::new(7),
            plan: PaymentPlan::Installment,
            amount: PaymentPlan::Installment.charge_today(),
            status: OrderStatus::Active,
            created_at: Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).single().expect("valid date"),
            payments_made: 1,
        };
        let items = vec!["hoodie".to_string(), "vinyl".to_string()];

        let profile = DashboardProfile::new(&user(true, true), Some(&order), &items, None);
        let json = serde_json::to_value(&profile).expect("serializes");

        assert_eq!(json["paymentPlan"], "installment");
        assert_eq!(json["paymentStatus"], "active");
        assert_eq!(json["purchaseDate"], "2025-05-02");
        assert_eq!(json["nextPaymentDate"], "2025-07-02");
        assert_eq!(json["remainingPayments"], 5);
        assert_eq!(json["merchandise"][0], "Premium Hoodie");
    }
}
