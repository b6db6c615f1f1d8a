//! Installment status and payment summary for package purchases.
//!
//! Nothing here is stored: every figure is recomputed from the purchase row
//! and its payments on each request.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::json_list::{parse_json_list, JsonListError, ParsedList};
use crate::payments::{round_cents, MONEY_EPSILON};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPlan {
    /// Paid in one go.
    Single,
    Installments,
}

impl PaymentPlan {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Installments => "installments",
        }
    }
}

impl FromStr for PaymentPlan {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "installments" => Ok(Self::Installments),
            other => Err(CoreError::Validation(format!(
                "Unknown payment plan '{other}'"
            ))),
        }
    }
}

/// The part of a package purchase the calculator reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseTerms {
    pub total_sessions: u32,
    pub used_sessions: u32,
    pub payment_plan: PaymentPlan,
    pub installments: u32,
    pub installment_amount: Option<f64>,
    pub total_price: f64,
    pub final_price: Option<f64>,
    pub paid_amount: f64,
    /// JSON array of session numbers, one per installment.
    pub installments_pay_on_sessions: Option<String>,
}

impl PurchaseTerms {
    pub fn remaining_sessions(&self) -> u32 {
        self.total_sessions.saturating_sub(self.used_sessions)
    }

    /// Price owed after discounts.
    pub fn total_amount(&self) -> f64 {
        self.final_price.unwrap_or(self.total_price)
    }

    /// Number of installments; a single-payment plan always has one.
    pub fn installment_count(&self) -> u32 {
        match self.payment_plan {
            PaymentPlan::Single => 1,
            PaymentPlan::Installments => self.installments.max(1),
        }
    }

    /// Nominal amount of one installment.
    pub fn nominal_installment_amount(&self) -> f64 {
        match (self.payment_plan, self.installment_amount) {
            (PaymentPlan::Installments, Some(amount)) if amount > 0.0 => amount,
            _ => round_cents(self.total_amount() / f64::from(self.installment_count())),
        }
    }

    pub fn pay_on_sessions(&self) -> Vec<u32> {
        self.installments_pay_on_sessions
            .as_deref()
            .map(parse_pay_on_sessions)
            .unwrap_or_default()
    }
}

/// A recorded payment, as far as installment matching is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPayment {
    pub installment_number: Option<u32>,
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Paid,
    Pending,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallmentDetail {
    pub number: u32,
    pub amount: f64,
    pub status: InstallmentStatus,
    /// Session after which this installment is due, if scheduled that way.
    pub pay_on_session: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub paid_installments: u32,
    pub total_installments: u32,
    pub paid_amount: f64,
    pub total_amount: f64,
    pub remaining_amount: f64,
    pub percentage_paid: f64,
}

// ---------------------------------------------------------------------------
// Pay-on-session parsing
// ---------------------------------------------------------------------------

fn accept_session(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}

/// Parse a stored pay-on-session list, reporting malformed input.
pub fn try_parse_pay_on_sessions(json: &str) -> Result<ParsedList<u32>, JsonListError> {
    parse_json_list(json, accept_session)
}

/// Parse a stored pay-on-session list. Never fails; malformed input yields
/// an empty list.
pub fn parse_pay_on_sessions(json: &str) -> Vec<u32> {
    try_parse_pay_on_sessions(json)
        .map(|parsed| parsed.items)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// One entry per installment, numbered from 1.
///
/// An installment is paid once the payments carrying its number cover its
/// nominal amount, or once nothing is owed on the purchase. Otherwise it is
/// overdue once the client has used as many sessions as its due session,
/// and pending before that.
pub fn get_installments_detail(
    terms: &PurchaseTerms,
    payments: &[InstallmentPayment],
) -> Vec<InstallmentDetail> {
    let amount = terms.nominal_installment_amount();
    let due_sessions = terms.pay_on_sessions();
    let settled = !has_pending_installments(terms);

    (1..=terms.installment_count())
        .map(|number| {
            let pay_on_session = due_sessions.get(number as usize - 1).copied();
            let covered: f64 = payments
                .iter()
                .filter(|p| p.installment_number == Some(number))
                .map(|p| p.amount)
                .sum();
            let paid = settled || covered >= amount - MONEY_EPSILON;

            let status = if paid {
                InstallmentStatus::Paid
            } else if pay_on_session.is_some_and(|s| terms.used_sessions >= s) {
                InstallmentStatus::Overdue
            } else {
                InstallmentStatus::Pending
            };

            InstallmentDetail {
                number,
                amount,
                status,
                pay_on_session,
            }
        })
        .collect()
}

/// Whether money is still owed on the purchase.
pub fn has_pending_installments(terms: &PurchaseTerms) -> bool {
    terms.paid_amount < terms.total_amount() - MONEY_EPSILON
}

/// Installments covered by the amount paid so far.
fn paid_installment_count(terms: &PurchaseTerms) -> u32 {
    let count = terms.installment_count();
    if !has_pending_installments(terms) {
        return count;
    }
    let nominal = terms.nominal_installment_amount();
    if nominal <= MONEY_EPSILON {
        return 0;
    }
    let covered = ((terms.paid_amount.max(0.0) + MONEY_EPSILON) / nominal).floor() as u32;
    covered.min(count)
}

/// Aggregate view of what has been paid against the purchase price.
pub fn get_payment_summary(terms: &PurchaseTerms) -> PaymentSummary {
    let total_amount = terms.total_amount();
    let paid_amount = terms.paid_amount;
    let percentage_paid = if total_amount <= MONEY_EPSILON {
        100.0
    } else {
        round_cents((paid_amount / total_amount * 100.0).clamp(0.0, 100.0))
    };

    PaymentSummary {
        paid_installments: paid_installment_count(terms),
        total_installments: terms.installment_count(),
        paid_amount,
        total_amount,
        remaining_amount: round_cents((total_amount - paid_amount).max(0.0)),
        percentage_paid,
    }
}

/// Lowest installment not yet covered, or `None` when fully paid.
pub fn get_next_installment_to_pay(terms: &PurchaseTerms) -> Option<u32> {
    if !has_pending_installments(terms) {
        return None;
    }
    Some((paid_installment_count(terms) + 1).min(terms.installment_count()))
}

/// Amount a payment towards installment `number` must carry.
///
/// Every installment owes its nominal amount, capped at the balance; the
/// last one settles whatever balance is left.
pub fn installment_due(terms: &PurchaseTerms, number: u32) -> f64 {
    let remaining = (terms.total_amount() - terms.paid_amount).max(0.0);
    if number >= terms.installment_count() {
        round_cents(remaining)
    } else {
        round_cents(terms.nominal_installment_amount().min(remaining))
    }
}

/// First installment in `details` not yet paid.
pub fn first_unpaid(details: &[InstallmentDetail]) -> Option<u32> {
    details
        .iter()
        .find(|d| d.status != InstallmentStatus::Paid)
        .map(|d| d.number)
}

// ---------------------------------------------------------------------------
// Pay-on-session scheduling
// ---------------------------------------------------------------------------

/// Spread installment due sessions evenly across a package. The first
/// installment is due at session 1.
pub fn suggest_pay_on_sessions(total_sessions: u32, installments: u32) -> Vec<u32> {
    if total_sessions == 0 || installments == 0 {
        return Vec::new();
    }
    (0..installments)
        .map(|i| 1 + i * total_sessions / installments)
        .collect()
}

/// A pay-on-session list must name one session per installment, each inside
/// the package, in non-decreasing order.
pub fn validate_pay_on_sessions(
    sessions: &[u32],
    total_sessions: u32,
    installments: u32,
) -> Result<(), CoreError> {
    if sessions.len() != installments as usize {
        return Err(CoreError::Validation(format!(
            "Expected {installments} pay-on-session entries, got {}",
            sessions.len()
        )));
    }
    if let Some(bad) = sessions.iter().find(|s| **s == 0 || **s > total_sessions) {
        return Err(CoreError::Validation(format!(
            "Session {bad} is outside the package (1..={total_sessions})"
        )));
    }
    if sessions.windows(2).any(|w| w[0] > w[1]) {
        return Err(CoreError::Validation(
            "Pay-on-session entries must be in ascending order".to_string(),
        ));
    }
    Ok(())
}
