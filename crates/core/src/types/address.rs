//! Shipping address value type.

use serde::{Deserialize, Serialize};

/// A pass holder's shipping address for bundled merchandise.
///
/// All four fields are required; partial addresses are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Street address line.
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl ShippingAddress {
    /// Build an address when every part is present and non-blank.
    ///
    /// Returns `None` if any field is missing or whitespace-only.
    #[must_use]
    pub fn from_parts(
        address: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        zip_code: Option<&str>,
    ) -> Option<Self> {
        let part = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        Some(Self {
            address: part(address)?,
            city: part(city)?,
            state: part(state)?,
            zip_code: part(zip_code)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_complete() {
        let address = ShippingAddress::from_parts(
            Some("1 Main St"),
            Some("Newark"),
            Some("NJ"),
            Some(" 07102 "),
        );
        assert_eq!(address.map(|a| a.zip_code), Some("07102".to_string()));
    }

    #[test]
    fn test_from_parts_rejects_blank() {
        let blank_city =
            ShippingAddress::from_parts(Some("1 Main St"), Some("  "), Some("NJ"), Some("07102"));
        assert!(blank_city.is_none());

        let missing_state =
            ShippingAddress::from_parts(Some("1 Main St"), Some("Newark"), None, Some("07102"));
        assert!(missing_state.is_none());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::json!({
            "address": "1 Main St",
            "city": "Newark",
            "state": "NJ",
            "zipCode": "07102"
        });
        let parsed: Result<ShippingAddress, _> = serde_json::from_value(json);
        assert!(parsed.is_ok());
    }
}
