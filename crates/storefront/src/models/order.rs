//! Pass order and installment schedule.

use chrono::{DateTime, Months, NaiveDate, Utc};

use ticketwave_core::{OrderId, OrderStatus, PaymentPlan, Price, UserId};

/// A user's pass order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub plan: PaymentPlan,
    /// Charge taken at registration.
    pub amount: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Installments recorded in `payments` after the initial charge.
    pub payments_made: u32,
}

impl Order {
    /// Installments still owed, or `None` for one-time orders.
    #[must_use]
    pub const fn remaining_payments(&self) -> Option<u32> {
        match self.plan {
            PaymentPlan::OneTime => None,
            PaymentPlan::Installment => {
                Some(PaymentPlan::INSTALLMENT_COUNT.saturating_sub(self.payments_made))
            }
        }
    }

    /// Due date of the next installment.
    ///
    /// One month after the order date for every payment already made, plus
    /// one. Month-end dates clamp to the last day of the target month.
    #[must_use]
    pub fn next_payment_date(&self) -> Option<NaiveDate> {
        let remaining = self.remaining_payments()?;
        if remaining == 0 {
            return None;
        }
        self.created_at
            .date_naive()
            .checked_add_months(Months::new(self.payments_made + 1))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use ticketwave_core::CurrencyCode;

    use super::*;

    fn order(plan: PaymentPlan, payments_made: u32, created: (i32, u32, u32)) -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            plan,
            amount: plan.charge_today(),
            status: OrderStatus::Active,
            created_at: Utc
                .with_ymd_and_hms(created.0, created.1, created.2, 12, 0, 0)
                .single()
                .expect("valid date"),
            payments_made,
        }
    }

    #[test]
    fn test_one_time_has_no_schedule() {
        let o = order(PaymentPlan::OneTime, 0, (2025, 3, 10));
        assert_eq!(o.remaining_payments(), None);
        assert_eq!(o.next_payment_date(), None);
        assert_eq!(o.amount.currency_code, CurrencyCode::USD);
    }

    #[test]
    fn test_installment_schedule() {
        let o = order(PaymentPlan::Installment, 2, (2025, 3, 10));
        assert_eq!(o.remaining_payments(), Some(4));
        assert_eq!(o.next_payment_date(), NaiveDate::from_ymd_opt(2025, 6, 10));
    }

    #[test]
    fn test_installment_schedule_clamps_month_end() {
        let o = order(PaymentPlan::Installment, 0, (2025, 1, 31));
        assert_eq!(o.next_payment_date(), NaiveDate::from_ymd_opt(2025, 2, 28));
    }

    #[test]
    fn test_paid_off_installment() {
        let o = order(PaymentPlan::Installment, 6, (2025, 1, 1));
        assert_eq!(o.remaining_payments(), Some(0));
        assert_eq!(o.next_payment_date(), None);
    }
}
