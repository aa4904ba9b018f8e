//! Typed input for the registration API.

use secrecy::SecretString;

use super::validate::{check_password, parse_merchandise};
use super::{FieldErrors, FormData, fields};
use crate::types::{Email, Merchandise, PaymentPlan, ShippingAddress};

/// Everything needed to create an account with a pass order.
///
/// Built from accumulated wizard answers. Card data is deliberately absent;
/// it travels separately and is never persisted.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub address: Option<ShippingAddress>,
    pub plan: Option<PaymentPlan>,
    pub merchandise: Vec<Merchandise>,
}

impl RegistrationRequest {
    /// Build a request from wizard form data.
    ///
    /// Requires every field collected by steps 1 to 3.
    ///
    /// # Errors
    ///
    /// Returns every missing or malformed field.
    pub fn from_form(form: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let plan = form
            .get_str(fields::PAYMENT_OPTION)
            .and_then(|p| p.parse::<PaymentPlan>().ok());
        if plan.is_none() {
            errors.add(fields::PAYMENT_OPTION, "Please choose a payment option");
        }

        let merchandise = match parse_merchandise(form.get(fields::MERCHANDISE)) {
            Ok(items) => items,
            Err(message) => {
                errors.add(fields::MERCHANDISE, message);
                Vec::new()
            }
        };

        let name = form.get_str(fields::NAME).map_or("", str::trim);
        if name.chars().count() < 2 {
            errors.add(fields::NAME, "Name must be at least 2 characters");
        }

        let email = form.email().and_then(|e| Email::parse(e).ok());
        if email.is_none() {
            errors.add(fields::EMAIL, "Please enter a valid email address");
        }

        let password = form.get_str(fields::PASSWORD).unwrap_or_default();
        if let Err(message) = check_password(password) {
            errors.add(fields::PASSWORD, message);
        }

        let address = ShippingAddress::from_parts(
            form.get_str(fields::ADDRESS),
            form.get_str(fields::CITY),
            form.get_str(fields::STATE),
            form.get_str(fields::ZIP_CODE),
        );
        if address.is_none() {
            errors.add(fields::ADDRESS, "A complete shipping address is required");
        }

        match (email, errors.is_empty()) {
            (Some(email), true) => Ok(Self {
                name: name.to_string(),
                email,
                password: SecretString::from(password.to_string()),
                address,
                plan,
                merchandise,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;

    fn complete_form() -> FormData {
        FormData::try_from(json!({
            "paymentOption": "installment",
            "merchandise": ["hoodie", "vinyl"],
            "termsAccepted": true,
            "name": " Jane Doe ",
            "email": "jane@x.com",
            "password": "hunter22a",
            "confirmPassword": "hunter22a",
            "address": "1 Main St",
            "city": "Newark",
            "state": "NJ",
            "zipCode": "07102",
        }))
        .unwrap_or_default()
    }

    #[test]
    fn test_from_complete_form() {
        let request = RegistrationRequest::from_form(&complete_form());
        assert!(request.is_ok());
        let Ok(request) = request else { return };

        assert_eq!(request.name, "Jane Doe");
        assert_eq!(request.email.as_str(), "jane@x.com");
        assert_eq!(request.password.expose_secret(), "hunter22a");
        assert_eq!(request.plan, Some(PaymentPlan::Installment));
        assert_eq!(request.merchandise, vec![Merchandise::Hoodie, Merchandise::Vinyl]);
        assert_eq!(request.address.map(|a| a.zip_code), Some("07102".to_string()));
    }

    #[test]
    fn test_missing_fields_are_reported_together() {
        let mut form = complete_form();
        form.insert("paymentOption", "never");
        form.insert("city", "");
        form.insert("email", "nope");

        let errors = RegistrationRequest::from_form(&form).err().unwrap_or_default();
        assert!(errors.get("paymentOption").is_some());
        assert!(errors.get("address").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("name").is_none());
    }
}
