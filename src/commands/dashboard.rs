// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::error::Result as LedgerResult;
use crate::ledger::round_money;
use crate::models::{User, decimal_at};
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

const RECENT: usize = 5;

pub fn handle(conn: &Connection, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("dashboard", sub)) => show(conn, session, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentExpense {
    pub id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub month_total: Decimal,
    pub today_total: Decimal,
    pub expense_count: usize,
    /// Current month, largest first.
    pub category_summary: Vec<CategoryTotal>,
    pub recent: Vec<RecentExpense>,
}

pub fn dashboard(conn: &Connection, user: &User, today: NaiveDate) -> LedgerResult<Dashboard> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.expense_date, c.name, e.amount FROM expenses e
         LEFT JOIN categories c ON e.category_id=c.id
         WHERE e.user_id=?1
         ORDER BY e.expense_date DESC, e.id DESC",
    )?;
    let rows = stmt.query_map(params![user.id], |r| {
        Ok(RecentExpense {
            id: r.get(0)?,
            date: r.get(1)?,
            category: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
            amount: decimal_at(r, 3)?,
        })
    })?;

    let mut month_total = Decimal::ZERO;
    let mut today_total = Decimal::ZERO;
    let mut expense_count = 0;
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut recent = Vec::new();

    for row in rows {
        let e = row?;
        expense_count += 1;
        if e.date.year() == today.year() && e.date.month() == today.month() {
            month_total += e.amount;
            *by_category.entry(e.category.clone()).or_insert(Decimal::ZERO) += e.amount;
        }
        if e.date == today {
            today_total += e.amount;
        }
        if recent.len() < RECENT {
            recent.push(e);
        }
    }

    let mut category_summary: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category,
            total: round_money(total),
        })
        .collect();
    category_summary.sort_by(|a, b| b.total.cmp(&a.total));

    Ok(Dashboard {
        date: today,
        month_total: round_money(month_total),
        today_total: round_money(today_total),
        expense_count,
        category_summary,
        recent,
    })
}

fn show(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let today = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let d = dashboard(conn, &session.user, today)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        return Ok(());
    }

    let ccy = &session.settings.currency;
    let summary = vec![
        vec!["This month".into(), fmt_money(&d.month_total, ccy)],
        vec!["Today".into(), fmt_money(&d.today_total, ccy)],
        vec!["Expenses recorded".into(), d.expense_count.to_string()],
    ];
    let day = d.date.to_string();
    println!(
        "{}",
        pretty_table(&[session.user.username.as_str(), day.as_str()], summary)
    );

    let cats = d
        .category_summary
        .iter()
        .map(|c| {
            let name = if c.category.is_empty() {
                "(uncategorized)".to_string()
            } else {
                c.category.clone()
            };
            vec![name, format!("{:.2}", c.total)]
        })
        .collect();
    println!("{}", pretty_table(&["Category", "Spent this month"], cats));

    let recent = d
        .recent
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.date.to_string(),
                e.category.clone(),
                format!("{:.2}", e.amount),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["ID", "Date", "Category", "Amount"], recent));
    Ok(())
}
