// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived debt figures.
//!
//! Nothing here is persisted. Every figure is recomputed from the debt's terms,
//! its opening balance and a single aggregate over the expenses currently
//! linked to it, so repeated reads with no intervening writes always agree.

use crate::error::{LedgerError, Result};
use crate::models::{DEBT_CATEGORY_SLUG, Debt, decimal_at};
use rusqlite::{Connection, params};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Round half away from zero and always keep two fractional digits.
pub fn round_money(d: Decimal) -> Decimal {
    let mut r = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    r.rescale(2);
    r
}

/// `a + b`, pinned at the `Decimal` bounds instead of overflowing.
pub fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(if b.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// `a * b`, pinned at the `Decimal` bounds instead of overflowing.
pub fn saturating_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or(if a.is_sign_negative() != b.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

/// Count and sum of the debt-category expenses linked to one debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentAggregate {
    pub count: i64,
    pub total: Decimal,
}

impl Default for PaymentAggregate {
    fn default() -> Self {
        PaymentAggregate {
            count: 0,
            total: round_money(Decimal::ZERO),
        }
    }
}

pub trait PaymentQuery {
    /// Never absent: `(0, 0.00)` when nothing is linked.
    fn sum_debt_payments(&self, debt_id: i64) -> Result<PaymentAggregate>;
}

impl PaymentQuery for Connection {
    fn sum_debt_payments(&self, debt_id: i64) -> Result<PaymentAggregate> {
        let mut stmt = self.prepare(
            "SELECT e.amount FROM expenses e
             JOIN categories c ON e.category_id=c.id
             WHERE e.debt_id=?1 AND c.slug=?2",
        )?;
        let rows = stmt.query_map(params![debt_id, DEBT_CATEGORY_SLUG], |r| decimal_at(r, 0))?;
        let mut agg = PaymentAggregate::default();
        for amount in rows {
            agg.count = agg.count.saturating_add(1);
            agg.total = saturating_add(agg.total, amount?);
        }
        agg.total = round_money(agg.total);
        Ok(agg)
    }
}

/// How `interest_rate` is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestModel {
    /// Flat percent per month, charged for every month of the tenure.
    #[default]
    Monthly,
    /// Percent per year, simple interest over `tenure_months / 12` years.
    Annual,
}

impl InterestModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestModel::Monthly => "monthly",
            InterestModel::Annual => "annual",
        }
    }
}

impl FromStr for InterestModel {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(InterestModel::Monthly),
            "annual" => Ok(InterestModel::Annual),
            _ => Err(LedgerError::invalid("interest_model", s)),
        }
    }
}

impl fmt::Display for InterestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtStatus {
    Active,
    Closed,
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtStatus::Active => f.write_str("Active"),
            DebtStatus::Closed => f.write_str("Closed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtLedger {
    pub debt_id: i64,
    pub paid_payment_count: i64,
    pub paid_payment_amount: Decimal,
    pub total_emi_paid: i64,
    /// Negative when more EMIs were paid than the tenure.
    pub emi_remaining: i64,
    pub status: DebtStatus,
    pub monthly_interest: Decimal,
    pub total_interest: Decimal,
    pub gross_amount: Decimal,
    pub net_paid: Decimal,
    pub net_remaining: Decimal,
}

/// Pure; rows written around the write-time checks saturate rather than panic.
pub fn compute(debt: &Debt, payments: &PaymentAggregate, model: InterestModel) -> DebtLedger {
    let paid_payment_amount = round_money(payments.total);
    let total_emi_paid = debt.emi_already_paid.saturating_add(payments.count);
    let status = if total_emi_paid < debt.tenure_months {
        DebtStatus::Active
    } else {
        DebtStatus::Closed
    };

    let rate = debt.interest_rate.unwrap_or(Decimal::ZERO) / Decimal::ONE_HUNDRED;
    let per_period = saturating_mul(debt.principal_amount, rate);
    let tenure = Decimal::from(debt.tenure_months);
    let (monthly_interest, total_interest) = match model {
        InterestModel::Monthly => {
            let monthly = round_money(per_period);
            (monthly, round_money(saturating_mul(monthly, tenure)))
        }
        InterestModel::Annual => {
            let months_per_year = Decimal::from(12);
            (
                round_money(per_period / months_per_year),
                round_money(saturating_mul(per_period, tenure) / months_per_year),
            )
        }
    };

    let gross_amount = round_money(saturating_add(debt.principal_amount, total_interest));
    let net_paid = round_money(saturating_add(debt.amount_already_paid, paid_payment_amount));
    let net_remaining = round_money(saturating_add(gross_amount, -net_paid).max(Decimal::ZERO));

    DebtLedger {
        debt_id: debt.id,
        paid_payment_count: payments.count,
        paid_payment_amount,
        total_emi_paid,
        emi_remaining: debt.tenure_months.saturating_sub(total_emi_paid),
        status,
        monthly_interest,
        total_interest,
        gross_amount,
        net_paid,
        net_remaining,
    }
}

/// Fetch the payment aggregate once and derive every figure from it.
pub fn debt_ledger<Q>(query: &Q, debt: &Debt, model: InterestModel) -> Result<DebtLedger>
where
    Q: PaymentQuery + ?Sized,
{
    let payments = query.sum_debt_payments(debt.id)?;
    let ledger = compute(debt, &payments, model);
    tracing::debug!(
        debt_id = debt.id,
        count = payments.count,
        total = %payments.total,
        status = %ledger.status,
        "computed debt ledger"
    );
    Ok(ledger)
}

/// Sums over a user's debt list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtTotals {
    pub principal: Decimal,
    pub net_paid: Decimal,
    pub net_remaining: Decimal,
}

impl Default for DebtTotals {
    fn default() -> Self {
        DebtTotals {
            principal: round_money(Decimal::ZERO),
            net_paid: round_money(Decimal::ZERO),
            net_remaining: round_money(Decimal::ZERO),
        }
    }
}

impl DebtTotals {
    pub fn add(&mut self, debt: &Debt, ledger: &DebtLedger) {
        self.principal = round_money(saturating_add(self.principal, debt.principal_amount));
        self.net_paid = round_money(saturating_add(self.net_paid, ledger.net_paid));
        self.net_remaining = round_money(saturating_add(self.net_remaining, ledger.net_remaining));
    }
}
