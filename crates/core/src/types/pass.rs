//! FANS ONLY pass catalog: payment plans and bundled merchandise.

use serde::{Deserialize, Serialize};

use super::price::Price;

/// Number of merchandise items bundled with every pass.
pub const MERCHANDISE_PICKS: usize = 2;

/// How the pass is paid for.
///
/// Wire values match the signup form (`oneTime` / `installment`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentPlan {
    /// Full payment today.
    OneTime,
    /// Monthly installments.
    Installment,
}

impl PaymentPlan {
    /// Number of monthly installments on the installment plan.
    pub const INSTALLMENT_COUNT: u32 = 6;

    /// Form/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneTime => "oneTime",
            Self::Installment => "installment",
        }
    }

    /// Amount charged at registration time.
    #[must_use]
    pub fn charge_today(self) -> Price {
        match self {
            Self::OneTime => Price::usd(5300),
            Self::Installment => Price::usd(900),
        }
    }

    /// Total number of payments over the life of the order.
    #[must_use]
    pub const fn payment_count(self) -> u32 {
        match self {
            Self::OneTime => 1,
            Self::Installment => Self::INSTALLMENT_COUNT,
        }
    }
}

impl std::str::FromStr for PaymentPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oneTime" => Ok(Self::OneTime),
            "installment" => Ok(Self::Installment),
            _ => Err(format!("invalid payment plan: {s}")),
        }
    }
}

/// Merchandise a pass holder can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Merchandise {
    Tshirt,
    Hoodie,
    Poster,
    Vinyl,
    Hat,
    Wristband,
}

impl Merchandise {
    /// Every item in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Tshirt,
        Self::Hoodie,
        Self::Poster,
        Self::Vinyl,
        Self::Hat,
        Self::Wristband,
    ];

    /// Stable item identifier used by the form and `order_items.item_id`.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Tshirt => "tshirt",
            Self::Hoodie => "hoodie",
            Self::Poster => "poster",
            Self::Vinyl => "vinyl",
            Self::Hat => "hat",
            Self::Wristband => "wristband",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tshirt => "Concert T-Shirt",
            Self::Hoodie => "Premium Hoodie",
            Self::Poster => "Autographed Poster",
            Self::Vinyl => "Vinyl Record",
            Self::Hat => "Snapback Hat",
            Self::Wristband => "VIP Wristband",
        }
    }

    /// Look up an item by its identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentPlan::OneTime).unwrap_or_default(),
            "\"oneTime\""
        );
        assert_eq!("installment".parse(), Ok(PaymentPlan::Installment));
        assert!("monthly".parse::<PaymentPlan>().is_err());
    }

    #[test]
    fn test_plan_pricing() {
        assert_eq!(PaymentPlan::OneTime.charge_today(), Price::usd(5300));
        assert_eq!(PaymentPlan::Installment.charge_today(), Price::usd(900));
        assert_eq!(PaymentPlan::Installment.payment_count(), 6);
    }

    #[test]
    fn test_merchandise_lookup() {
        for item in Merchandise::ALL {
            assert_eq!(Merchandise::from_id(item.id()), Some(item));
        }
        assert_eq!(Merchandise::from_id("mug"), None);
    }
}
