// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use super::debts::get_debt;
use crate::error::{LedgerError, Result as LedgerResult};
use crate::ledger::round_money;
use crate::models::{EXPENSE_COLUMNS, Expense, ExpenseDraft, User};
use crate::utils::{
    id_for_category, maybe_print_json, parse_date, parse_decimal, parse_month, pretty_table,
};
use crate::validation::{normalize_category_name, validate_expense};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub fn handle(conn: &Connection, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, session, sub)?,
        Some(("list", sub)) => list(conn, session, sub)?,
        Some(("edit", sub)) => edit(conn, session, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_expense(conn, &session.user, id)?;
            println!("Removed expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let category_id = match sub.get_one::<String>("category") {
        Some(name) => Some(id_for_category(conn, &session.user, name)?),
        None => None,
    };
    let draft = ExpenseDraft {
        category_id,
        debt_id: sub.get_one::<i64>("debt").copied(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        payment_mode: sub.get_one::<String>("mode").unwrap().parse()?,
        expense_date: parse_date(sub.get_one::<String>("date").unwrap())?,
        note: sub
            .get_one::<String>("note")
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    };
    let id = create_expense(conn, &session.user, &draft)?;
    println!(
        "Recorded expense #{}: {} {} on {} ({})",
        id,
        session.settings.currency,
        round_money(draft.amount),
        draft.expense_date,
        draft.payment_mode.label()
    );
    Ok(())
}

fn edit(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut d = get_expense(conn, &session.user, id)?.draft();

    if let Some(s) = sub.get_one::<String>("date") {
        d.expense_date = parse_date(s)?;
    }
    if let Some(s) = sub.get_one::<String>("amount") {
        d.amount = parse_decimal(s)?;
    }
    if let Some(s) = sub.get_one::<String>("mode") {
        d.payment_mode = s.parse()?;
    }
    if let Some(name) = sub.get_one::<String>("category") {
        d.category_id = Some(id_for_category(conn, &session.user, name)?);
    }
    if sub.get_flag("no_category") {
        d.category_id = None;
    }
    if let Some(debt) = sub.get_one::<i64>("debt") {
        d.debt_id = Some(*debt);
    }
    if sub.get_flag("unlink_debt") {
        d.debt_id = None;
    }
    if let Some(s) = sub.get_one::<String>("note") {
        d.note = s.trim().to_string();
    }

    update_expense(conn, &session.user, id, &d)?;
    println!("Updated expense {}", id);
    Ok(())
}

/// Categories and debts must be visible to the user before the gate runs.
/// A debt link carried over unchanged (`linked`) is kept even if that debt was archived.
fn check_references(
    conn: &Connection,
    user: &User,
    draft: &ExpenseDraft,
    linked: Option<i64>,
) -> LedgerResult<()> {
    if let Some(category_id) = draft.category_id {
        let visible: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories c JOIN users u ON c.user_id=u.id
             WHERE c.id=?1 AND (c.user_id=?2 OR u.is_superuser=1))",
            params![category_id, user.id],
            |r| r.get(0),
        )?;
        if !visible {
            return Err(LedgerError::not_found("Category", category_id));
        }
    }
    if let Some(debt_id) = draft.debt_id {
        if linked != Some(debt_id) {
            get_debt(conn, user, debt_id)?;
        }
    }
    Ok(())
}

pub fn create_expense(conn: &Connection, user: &User, draft: &ExpenseDraft) -> LedgerResult<i64> {
    let tx = conn.unchecked_transaction()?;
    check_references(&tx, user, draft, None)?;
    if let Err(e) = validate_expense(&*tx, draft) {
        tracing::warn!(user_id = user.id, error = %e, "expense rejected");
        return Err(e);
    }
    tx.execute(
        "INSERT INTO expenses(user_id, category_id, debt_id, amount, payment_mode, expense_date, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            draft.category_id,
            draft.debt_id,
            round_money(draft.amount).to_string(),
            draft.payment_mode.as_str(),
            draft.expense_date,
            draft.note,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    tracing::info!(expense_id = id, user_id = user.id, debt_id = ?draft.debt_id, "expense recorded");
    Ok(id)
}

pub fn update_expense(
    conn: &Connection,
    user: &User,
    id: i64,
    draft: &ExpenseDraft,
) -> LedgerResult<()> {
    let tx = conn.unchecked_transaction()?;
    let current = get_expense(&tx, user, id)?;
    check_references(&tx, user, draft, current.debt_id)?;
    if let Err(e) = validate_expense(&*tx, draft) {
        tracing::warn!(expense_id = id, error = %e, "expense update rejected");
        return Err(e);
    }
    tx.execute(
        "UPDATE expenses SET category_id=?1, debt_id=?2, amount=?3, payment_mode=?4,
             expense_date=?5, note=?6, updated_at=datetime('now')
         WHERE id=?7",
        params![
            draft.category_id,
            draft.debt_id,
            round_money(draft.amount).to_string(),
            draft.payment_mode.as_str(),
            draft.expense_date,
            draft.note,
            id,
        ],
    )?;
    tx.commit()?;
    tracing::info!(expense_id = id, user_id = user.id, "expense updated");
    Ok(())
}

/// Never touches the linked debt.
pub fn delete_expense(conn: &Connection, user: &User, id: i64) -> LedgerResult<()> {
    get_expense(conn, user, id)?;
    conn.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    tracing::info!(expense_id = id, user_id = user.id, "expense deleted");
    Ok(())
}

pub fn get_expense(conn: &Connection, user: &User, id: i64) -> LedgerResult<Expense> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE id=?1 AND user_id=?2",
        EXPENSE_COLUMNS
    );
    conn.query_row(&sql, params![id, user.id], Expense::from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Expense", id))
}

fn list(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, &session.user, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.category.clone(),
                    r.debt.clone(),
                    r.amount.clone(),
                    r.mode.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Category", "Debt", "Amount", "Mode", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub debt: String,
    pub amount: String,
    pub mode: String,
    pub note: String,
}

pub fn query_rows(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<Vec<ExpenseRow>> {
    let mut sql = String::from(
        "SELECT e.id, e.expense_date, c.name, d.name, e.amount, e.payment_mode, e.note
         FROM expenses e
         LEFT JOIN categories c ON e.category_id=c.id
         LEFT JOIN debts d ON e.debt_id=d.id
         WHERE e.user_id=?",
    );
    let mut values: Vec<Value> = vec![Value::Integer(user.id)];

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(e.expense_date,1,7)=?");
        values.push(Value::Text(parse_month(month)?));
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND lower(c.name)=?");
        values.push(Value::Text(normalize_category_name(cat)));
    }
    if let Some(debt) = sub.get_one::<i64>("debt") {
        sql.push_str(" AND e.debt_id=?");
        values.push(Value::Integer(*debt));
    }
    sql.push_str(" ORDER BY e.expense_date DESC, e.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(*limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let category: Option<String> = r.get(2)?;
        let debt: Option<String> = r.get(3)?;
        data.push(ExpenseRow {
            id: r.get(0)?,
            date: r.get(1)?,
            category: category.unwrap_or_default(),
            debt: debt.unwrap_or_default(),
            amount: r.get(4)?,
            mode: r.get(5)?,
            note: r.get(6)?,
        });
    }
    Ok(data)
}
