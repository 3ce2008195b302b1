// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Write-time checks.
//!
//! Callers run `validate_*` and then perform the write inside the same SQLite
//! transaction. Every check runs; the caller gets the full list of problems
//! rather than the first one.

use crate::error::{LedgerError, Result, ValidationError};
use crate::ledger::round_money;
use crate::models::{DEBT_CATEGORY_SLUG, DebtDraft, ExpenseDraft, User};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

/// Whole digits a money column holds (12 digits, 2 decimal places).
pub const MONEY_WHOLE_DIGITS: u32 = 10;
/// EMI amounts hold 10 digits, 2 decimal places.
pub const EMI_WHOLE_DIGITS: u32 = 8;
/// Rates hold 5 digits, 2 decimal places.
pub const RATE_WHOLE_DIGITS: u32 = 3;
/// Upper bound for month counts.
pub const MAX_MONTHS: i64 = i32::MAX as i64;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Category names are compared trimmed and lowercased.
pub fn normalize_category_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn slugify(name: &str) -> String {
    let lowered = normalize_category_name(name);
    NON_SLUG.replace_all(&lowered, "-").trim_matches('-').to_string()
}

/// True when `value`, as stored, needs more than `digits` digits before the point.
fn too_many_whole_digits(value: Decimal, digits: u32) -> bool {
    round_money(value).abs().trunc() >= Decimal::from(10i64.pow(digits))
}

fn whole_digits_message(digits: u32) -> String {
    format!(
        "Ensure that there are no more than {} digits before the decimal point.",
        digits
    )
}

/// An existing, non-deleted category carrying a given name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameOwner {
    pub category_id: i64,
    pub user_id: i64,
    pub is_superuser: bool,
}

/// Resolves categories by stable slug, never by display name.
pub trait CategoryRegistry {
    fn category_slug(&self, category_id: i64) -> Result<Option<String>>;

    fn name_owners(&self, name: &str) -> Result<Vec<NameOwner>>;

    /// The seeded row holding the debt slug.
    fn debt_category_id(&self) -> Result<Option<i64>>;

    fn is_debt_category(&self, category_id: i64) -> Result<bool> {
        Ok(self.category_slug(category_id)?.as_deref() == Some(DEBT_CATEGORY_SLUG))
    }
}

impl CategoryRegistry for Connection {
    fn category_slug(&self, category_id: i64) -> Result<Option<String>> {
        let slug = self
            .query_row(
                "SELECT slug FROM categories WHERE id=?1",
                params![category_id],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(slug)
    }

    fn name_owners(&self, name: &str) -> Result<Vec<NameOwner>> {
        let mut stmt = self.prepare(
            "SELECT c.id, c.user_id, u.is_superuser FROM categories c
             JOIN users u ON c.user_id=u.id
             WHERE lower(c.name)=lower(?1) AND c.is_deleted=0",
        )?;
        let rows = stmt.query_map(params![name], |r| {
            Ok(NameOwner {
                category_id: r.get(0)?,
                user_id: r.get(1)?,
                is_superuser: r.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn debt_category_id(&self) -> Result<Option<i64>> {
        let id = self
            .query_row(
                "SELECT id FROM categories WHERE slug=?1 ORDER BY id LIMIT 1",
                params![DEBT_CATEGORY_SLUG],
                |r| r.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }
}

pub fn validate_debt(draft: &DebtDraft) -> std::result::Result<(), ValidationError> {
    let mut errors = ValidationError::new();

    if draft.name.trim().is_empty() {
        errors.add("name", "This field is required.");
    }
    if draft.principal_amount < Decimal::ZERO {
        errors.add("principal_amount", "Principal amount cannot be negative.");
    } else if too_many_whole_digits(draft.principal_amount, MONEY_WHOLE_DIGITS) {
        errors.add("principal_amount", whole_digits_message(MONEY_WHOLE_DIGITS));
    }
    if let Some(rate) = draft.interest_rate {
        if rate < Decimal::ZERO {
            errors.add("interest_rate", "Interest rate cannot be negative.");
        } else if too_many_whole_digits(rate, RATE_WHOLE_DIGITS) {
            errors.add("interest_rate", whole_digits_message(RATE_WHOLE_DIGITS));
        }
    }
    if draft.tenure_months < 1 {
        errors.add("tenure_months", "Tenure must be at least one month.");
    } else if draft.tenure_months > MAX_MONTHS {
        errors.add(
            "tenure_months",
            format!("Ensure this value is less than or equal to {}.", MAX_MONTHS),
        );
    }
    if draft.emi_amount <= Decimal::ZERO {
        errors.add("emi_amount", "EMI amount must be greater than zero.");
    } else if too_many_whole_digits(draft.emi_amount, EMI_WHOLE_DIGITS) {
        errors.add("emi_amount", whole_digits_message(EMI_WHOLE_DIGITS));
    }
    if draft.emi_already_paid < 0 {
        errors.add("emi_already_paid", "Paid EMIs cannot be negative.");
    } else if draft.emi_already_paid > draft.tenure_months {
        errors.add("emi_already_paid", "Paid EMIs cannot exceed total tenure.");
    }
    if draft.amount_already_paid < Decimal::ZERO {
        errors.add("amount_already_paid", "Amount already paid cannot be negative.");
    } else if too_many_whole_digits(draft.amount_already_paid, MONEY_WHOLE_DIGITS) {
        errors.add("amount_already_paid", whole_digits_message(MONEY_WHOLE_DIGITS));
    }

    errors.into_result()
}

/// An expense links to a debt if and only if it carries the debt category.
pub fn validate_expense<R>(registry: &R, draft: &ExpenseDraft) -> Result<()>
where
    R: CategoryRegistry + ?Sized,
{
    let mut errors = ValidationError::new();

    if draft.amount < Decimal::ZERO {
        errors.add("amount", "Amount cannot be negative.");
    } else if too_many_whole_digits(draft.amount, MONEY_WHOLE_DIGITS) {
        errors.add("amount", whole_digits_message(MONEY_WHOLE_DIGITS));
    }

    let is_debt_payment = match draft.category_id {
        Some(id) => registry.is_debt_category(id)?,
        None => false,
    };
    match (is_debt_payment, draft.debt_id) {
        (true, None) => errors.add("debt", "Select the debt this payment repays."),
        (false, Some(_)) => errors.add(
            "category",
            "Only payments in the debt category can be linked to a debt.",
        ),
        _ => {}
    }

    errors.into_result().map_err(LedgerError::from)
}

/// Name rules for a new or renamed category. `name` is expected normalized.
pub fn validate_category<R>(
    registry: &R,
    owner: &User,
    name: &str,
    existing_id: Option<i64>,
) -> Result<()>
where
    R: CategoryRegistry + ?Sized,
{
    let mut errors = ValidationError::new();

    if name.is_empty() {
        errors.add("name", "This field is required.");
        return Err(errors.into());
    }

    let others: Vec<NameOwner> = registry
        .name_owners(name)?
        .into_iter()
        .filter(|o| Some(o.category_id) != existing_id)
        .collect();

    if owner.is_superuser {
        if others.iter().any(|o| o.user_id == owner.id) {
            errors.add("name", "This global category already exists.");
        }
    } else {
        if others.iter().any(|o| o.is_superuser) {
            errors.add("name", "This category name is reserved by the system.");
        }
        if others.iter().any(|o| o.user_id == owner.id) {
            errors.add("name", "You have already created this category.");
        }
    }
    // Names like "Debt." slug to the reserved value; only the seeded row may hold it.
    if errors.is_empty()
        && slugify(name) == DEBT_CATEGORY_SLUG
        && registry.debt_category_id()? != existing_id
    {
        errors.add("name", "This category name is reserved by the system.");
    }

    errors.into_result().map_err(LedgerError::from)
}
