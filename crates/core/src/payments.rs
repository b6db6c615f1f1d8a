//! Money comparison and payment validation.
//!
//! Amounts are `f64` values that have made a round trip through JSON and the
//! database; comparisons therefore allow a one-cent tolerance.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::installments::{installment_due, PurchaseTerms};

/// Tolerance for money comparisons.
pub const MONEY_EPSILON: f64 = 0.01;

/// Whether two amounts are equal within [`MONEY_EPSILON`].
pub fn amounts_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < MONEY_EPSILON
}

/// Round to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Payment methods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Qr,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::Qr => "qr",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            "qr" => Ok(Self::Qr),
            other => Err(CoreError::Validation(format!(
                "Unknown payment method '{other}'"
            ))),
        }
    }
}

/// One part of a payment settled with a single method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub method: PaymentMethod,
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A split payment must have at least one positive part and its parts must
/// add up to `expected_total`.
pub fn validate_split_payment(expected_total: f64, splits: &[PaymentSplit]) -> Result<(), CoreError> {
    if splits.is_empty() {
        return Err(CoreError::Validation(
            "At least one payment method is required".to_string(),
        ));
    }
    if let Some(bad) = splits.iter().find(|s| !s.amount.is_finite() || s.amount <= 0.0) {
        return Err(CoreError::Validation(format!(
            "Amount for {} must be greater than zero",
            bad.method.as_str()
        )));
    }

    let sum: f64 = splits.iter().map(|s| s.amount).sum();
    if !amounts_equal(sum, expected_total) {
        return Err(CoreError::Validation(format!(
            "Split amounts add up to {sum:.2}, expected {expected_total:.2}"
        )));
    }
    Ok(())
}

/// Check a payment against a purchase: known installment, positive amount,
/// exactly what that installment still owes.
pub fn validate_installment_payment(
    terms: &PurchaseTerms,
    installment_number: u32,
    amount: f64,
) -> Result<(), CoreError> {
    let count = terms.installment_count();
    if installment_number == 0 || installment_number > count {
        return Err(CoreError::Validation(format!(
            "Installment {installment_number} does not exist (purchase has {count})"
        )));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::Validation(
            "Payment amount must be greater than zero".to_string(),
        ));
    }

    let due = installment_due(terms, installment_number);
    if !amounts_equal(amount, due) {
        return Err(CoreError::Validation(format!(
            "Payment of {amount:.2} does not match the {due:.2} due on installment {installment_number}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::installments::PaymentPlan;

    fn terms(paid: f64) -> PurchaseTerms {
        PurchaseTerms {
            total_sessions: 8,
            used_sessions: 0,
            payment_plan: PaymentPlan::Installments,
            installments: 3,
            installment_amount: Some(100.0),
            total_price: 300.0,
            final_price: None,
            paid_amount: paid,
            installments_pay_on_sessions: None,
        }
    }

    fn split(method: PaymentMethod, amount: f64) -> PaymentSplit {
        PaymentSplit { method, amount }
    }

    #[test]
    fn epsilon_comparison() {
        assert!(amounts_equal(100.0, 100.004));
        assert!(amounts_equal(0.1 + 0.2, 0.3));
        assert!(!amounts_equal(100.0, 100.02));
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_cents(33.333_333), 33.33);
        assert_eq!(round_cents(66.666_666), 66.67);
    }

    #[test]
    fn method_codes_round_trip() {
        for m in [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::Transfer,
            PaymentMethod::Qr,
        ] {
            assert_eq!(m.as_str().parse::<PaymentMethod>().unwrap(), m);
        }
        assert_matches!("cheque".parse::<PaymentMethod>(), Err(CoreError::Validation(_)));
    }

    // -- split payments --

    #[test]
    fn split_matching_total_is_accepted() {
        let splits = [
            split(PaymentMethod::Cash, 40.0),
            split(PaymentMethod::Qr, 60.005),
        ];
        assert!(validate_split_payment(100.0, &splits).is_ok());
    }

    #[test]
    fn split_not_matching_total_is_rejected() {
        let splits = [
            split(PaymentMethod::Cash, 40.0),
            split(PaymentMethod::Card, 50.0),
        ];
        assert_matches!(
            validate_split_payment(100.0, &splits),
            Err(CoreError::Validation(msg)) if msg.contains("90.00")
        );
    }

    #[test]
    fn empty_split_is_rejected() {
        assert_matches!(validate_split_payment(100.0, &[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_positive_part_is_rejected() {
        let splits = [
            split(PaymentMethod::Cash, 100.0),
            split(PaymentMethod::Transfer, 0.0),
        ];
        assert_matches!(
            validate_split_payment(100.0, &splits),
            Err(CoreError::Validation(msg)) if msg.contains("transfer")
        );
    }

    // -- installment payments --

    #[test]
    fn installment_payment_within_balance() {
        assert!(validate_installment_payment(&terms(100.0), 2, 100.0).is_ok());
    }

    #[test]
    fn installment_out_of_range() {
        assert_matches!(
            validate_installment_payment(&terms(0.0), 4, 100.0),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_installment_payment(&terms(0.0), 0, 100.0),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn overpayment_is_rejected() {
        assert_matches!(
            validate_installment_payment(&terms(250.0), 3, 100.0),
            Err(CoreError::Validation(msg)) if msg.contains("50.00")
        );
    }

    #[test]
    fn underpayment_is_rejected() {
        assert_matches!(
            validate_installment_payment(&terms(0.0), 1, 10.0),
            Err(CoreError::Validation(msg)) if msg.contains("100.00")
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert_matches!(
            validate_installment_payment(&terms(0.0), 1, -5.0),
            Err(CoreError::Validation(_))
        );
    }
}
