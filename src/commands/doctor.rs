// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result as LedgerResult;
use crate::ledger::{InterestModel, debt_ledger};
use crate::models::{DEBT_CATEGORY_SLUG, DEBT_COLUMNS, Debt};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

pub fn handle(conn: &Connection, model: InterestModel) -> Result<()> {
    let issues = find_issues(conn, model)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Rows that slipped past the write-time gate, across all users.
pub fn find_issues(conn: &Connection, model: InterestModel) -> LedgerResult<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Debt-category payments with no debt
    let mut stmt = conn.prepare(
        "SELECT e.id FROM expenses e JOIN categories c ON e.category_id=c.id
         WHERE c.slug=?1 AND e.debt_id IS NULL ORDER BY e.id",
    )?;
    let mut cur = stmt.query(params![DEBT_CATEGORY_SLUG])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        issues.push(Issue {
            kind: "debt_payment_unlinked",
            detail: format!("expense #{}", id),
        });
    }

    // 2) Debt links on other categories
    let mut stmt = conn.prepare(
        "SELECT e.id, e.debt_id FROM expenses e LEFT JOIN categories c ON e.category_id=c.id
         WHERE e.debt_id IS NOT NULL AND (c.slug IS NULL OR c.slug!=?1) ORDER BY e.id",
    )?;
    let mut cur = stmt.query(params![DEBT_CATEGORY_SLUG])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let debt: i64 = r.get(1)?;
        issues.push(Issue {
            kind: "debt_link_wrong_category",
            detail: format!("expense #{} -> debt #{}", id, debt),
        });
    }

    // 3) Payments pointing at someone else's debt
    let mut stmt = conn.prepare(
        "SELECT e.id, e.debt_id FROM expenses e JOIN debts d ON e.debt_id=d.id
         WHERE e.user_id!=d.user_id ORDER BY e.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let debt: i64 = r.get(1)?;
        issues.push(Issue {
            kind: "debt_owner_mismatch",
            detail: format!("expense #{} -> debt #{}", id, debt),
        });
    }

    // 4) Opening balance and over-payment
    let sql = format!("SELECT {} FROM debts ORDER BY id", DEBT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let debts = stmt.query_map([], Debt::from_row)?;
    for debt in debts {
        let debt = debt?;
        if debt.emi_already_paid > debt.tenure_months {
            issues.push(Issue {
                kind: "opening_emis_exceed_tenure",
                detail: format!(
                    "debt #{}: {} of {} months",
                    debt.id, debt.emi_already_paid, debt.tenure_months
                ),
            });
        }
        let ledger = debt_ledger(conn, &debt, model)?;
        if ledger.emi_remaining < 0 {
            issues.push(Issue {
                kind: "emi_overpaid",
                detail: format!(
                    "debt #{}: {} EMIs paid of {}",
                    debt.id, ledger.total_emi_paid, debt.tenure_months
                ),
            });
        }
    }

    Ok(issues)
}
