// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use super::debts::debt_rows;
use crate::models::User;
use anyhow::{Result, bail};
use rusqlite::{Connection, params};
use serde_json::json;

pub fn handle(conn: &Connection, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => export_expenses(conn, &session.user, sub),
        Some(("debts", sub)) => export_debts(conn, session, sub),
        _ => Ok(()),
    }
}

fn export_expenses(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT e.id, e.expense_date, c.name AS category, e.debt_id, e.amount, e.payment_mode, e.note
         FROM expenses e
         LEFT JOIN categories c ON e.category_id=c.id
         WHERE e.user_id=?1
         ORDER BY e.expense_date, e.id",
    )?;
    let rows = stmt.query_map(params![user.id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, Option<i64>>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "category", "debt_id", "amount", "mode", "note"])?;
            for row in rows {
                let (id, d, cat, debt, amt, mode, note) = row?;
                wtr.write_record([
                    id.to_string(),
                    d,
                    cat.unwrap_or_default(),
                    debt.map(|v| v.to_string()).unwrap_or_default(),
                    amt,
                    mode,
                    note,
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (id, d, cat, debt, amt, mode, note) = row?;
                items.push(json!({
                    "id": id, "date": d, "category": cat, "debt_id": debt, "amount": amt, "mode": mode, "note": note
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => bail!("Unknown format: {} (use csv|json)", fmt),
    }
    tracing::info!(path = %out, "expenses exported");
    println!("Exported expenses to {}", out);
    Ok(())
}

fn export_debts(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let (rows, _) = debt_rows(conn, &session.user, true, session.settings.interest_model)?;

    match fmt.as_str() {
        // serde flattens each DebtRow into one CSV record
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
        _ => bail!("Unknown format: {} (use csv|json)", fmt),
    }
    tracing::info!(path = %out, count = rows.len(), "debts exported");
    println!("Exported {} debts to {}", rows.len(), out);
    Ok(())
}
