// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use chrono::NaiveDate;
use rusqlite::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slug of the category that links an expense to a debt.
pub const DEBT_CATEGORY_SLUG: &str = "debt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub slug: String,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebtType {
    Loan,
    Emi,
    Borrow,
    Other,
}

impl DebtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtType::Loan => "LOAN",
            DebtType::Emi => "EMI",
            DebtType::Borrow => "BORROW",
            DebtType::Other => "OTHER",
        }
    }
}

impl FromStr for DebtType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOAN" => Ok(DebtType::Loan),
            "EMI" => Ok(DebtType::Emi),
            "BORROW" => Ok(DebtType::Borrow),
            "OTHER" => Ok(DebtType::Other),
            _ => Err(LedgerError::invalid("debt_type", s)),
        }
    }
}

impl fmt::Display for DebtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Card,
    Bank,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::Card => "card",
            PaymentMode::Bank => "bank",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Upi => "UPI",
            PaymentMode::Card => "Card",
            PaymentMode::Bank => "Bank Transfer",
        }
    }
}

impl FromStr for PaymentMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            "card" => Ok(PaymentMode::Card),
            "bank" => Ok(PaymentMode::Bank),
            _ => Err(LedgerError::invalid("payment_mode", s)),
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable fields of a debt, as submitted by the write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtDraft {
    pub name: String,
    pub debt_type: DebtType,
    pub lender: Option<String>,
    pub principal_amount: Decimal,
    pub interest_rate: Option<Decimal>, // percent per month
    pub tenure_months: i64,
    pub emi_amount: Decimal,
    pub start_date: NaiveDate,
    pub emi_already_paid: i64,
    pub amount_already_paid: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub debt_type: DebtType,
    pub lender: Option<String>,
    pub principal_amount: Decimal,
    pub interest_rate: Option<Decimal>,
    pub tenure_months: i64,
    pub emi_amount: Decimal,
    pub start_date: NaiveDate,
    pub emi_already_paid: i64,
    pub amount_already_paid: Decimal,
    pub is_active: bool,
    pub is_deleted: bool,
}

pub const DEBT_COLUMNS: &str = "id, user_id, name, debt_type, lender, principal_amount, interest_rate, \
     tenure_months, emi_amount, start_date, emi_already_paid, amount_already_paid, is_active, is_deleted";

impl Debt {
    /// Map a row selected with [`DEBT_COLUMNS`].
    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Debt> {
        let debt_type: String = r.get(3)?;
        let rate: Option<String> = r.get(6)?;
        Ok(Debt {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            debt_type: debt_type.parse().map_err(|e| conversion_error(3, e))?,
            lender: r.get(4)?,
            principal_amount: decimal_at(r, 5)?,
            interest_rate: match rate {
                Some(s) => Some(parse_stored_decimal(6, &s)?),
                None => None,
            },
            tenure_months: r.get(7)?,
            emi_amount: decimal_at(r, 8)?,
            start_date: r.get(9)?,
            emi_already_paid: r.get(10)?,
            amount_already_paid: decimal_at(r, 11)?,
            is_active: r.get(12)?,
            is_deleted: r.get(13)?,
        })
    }

    pub fn draft(&self) -> DebtDraft {
        DebtDraft {
            name: self.name.clone(),
            debt_type: self.debt_type,
            lender: self.lender.clone(),
            principal_amount: self.principal_amount,
            interest_rate: self.interest_rate,
            tenure_months: self.tenure_months,
            emi_amount: self.emi_amount,
            start_date: self.start_date,
            emi_already_paid: self.emi_already_paid,
            amount_already_paid: self.amount_already_paid,
            is_active: self.is_active,
        }
    }
}

/// Editable fields of an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub category_id: Option<i64>,
    pub debt_id: Option<i64>,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub expense_date: NaiveDate,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub debt_id: Option<i64>,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub expense_date: NaiveDate,
    pub note: String,
}

pub const EXPENSE_COLUMNS: &str =
    "id, user_id, category_id, debt_id, amount, payment_mode, expense_date, note";

impl Expense {
    /// Map a row selected with [`EXPENSE_COLUMNS`].
    pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Expense> {
        let mode: String = r.get(5)?;
        Ok(Expense {
            id: r.get(0)?,
            user_id: r.get(1)?,
            category_id: r.get(2)?,
            debt_id: r.get(3)?,
            amount: decimal_at(r, 4)?,
            payment_mode: mode.parse().map_err(|e| conversion_error(5, e))?,
            expense_date: r.get(6)?,
            note: r.get(7)?,
        })
    }

    pub fn draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            category_id: self.category_id,
            debt_id: self.debt_id,
            amount: self.amount,
            payment_mode: self.payment_mode,
            expense_date: self.expense_date,
            note: self.note.clone(),
        }
    }
}

/// Amounts are stored as TEXT so they never pass through a float.
pub fn decimal_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    parse_stored_decimal(idx, &s)
}

fn parse_stored_decimal(idx: usize, s: &str) -> rusqlite::Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| conversion_error(idx, LedgerError::invalid("amount", s)))
}

fn conversion_error(idx: usize, e: LedgerError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("emi".parse::<DebtType>().unwrap(), DebtType::Emi);
        assert_eq!(" UPI ".parse::<PaymentMode>().unwrap(), PaymentMode::Upi);
        assert!("cheque".parse::<PaymentMode>().is_err());
        assert_eq!(PaymentMode::Bank.label(), "Bank Transfer");
    }
}
