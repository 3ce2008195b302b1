// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::error::{LedgerError, Result as LedgerResult};
use crate::ledger::{
    DebtLedger, DebtTotals, InterestModel, debt_ledger, round_money, saturating_mul,
};
use crate::models::{DEBT_COLUMNS, Debt, DebtDraft, User};
use crate::utils::{fmt_money, maybe_print_json, parse_bool, parse_date, parse_decimal, pretty_table};
use crate::validation::validate_debt;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

pub fn handle(conn: &Connection, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, session, sub)?,
        Some(("info", sub)) => info(conn, session, sub)?,
        Some(("list", sub)) => list(conn, session, sub)?,
        Some(("edit", sub)) => edit(conn, session, sub)?,
        Some(("archive", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            archive_debt(conn, &session.user, id)?;
            println!("Archived debt {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_debt(conn, &session.user, id)?;
            println!("Debt {} deleted", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let emi_amount = parse_decimal(sub.get_one::<String>("emi").unwrap())?;
    let emi_already_paid = sub.get_one::<i64>("emi_paid").copied().unwrap_or(0);
    let amount_already_paid = match sub.get_one::<String>("amount_paid") {
        Some(s) => parse_decimal(s)?,
        None => opening_amount(emi_already_paid, emi_amount),
    };
    let draft = DebtDraft {
        name: sub.get_one::<String>("name").unwrap().trim().to_string(),
        debt_type: sub.get_one::<String>("type").unwrap().parse()?,
        lender: optional_text(sub, "lender"),
        principal_amount: parse_decimal(sub.get_one::<String>("principal").unwrap())?,
        interest_rate: sub
            .get_one::<String>("rate")
            .map(|s| parse_decimal(s))
            .transpose()?,
        tenure_months: *sub.get_one::<i64>("tenure").unwrap(),
        emi_amount,
        start_date: parse_date(sub.get_one::<String>("start").unwrap())?,
        emi_already_paid,
        amount_already_paid,
        is_active: true,
    };
    let id = create_debt(conn, &session.user, &draft)?;
    println!(
        "Added debt #{} '{}' ({}, {} x {} months)",
        id,
        draft.name,
        draft.debt_type,
        fmt_money(&draft.emi_amount, &session.settings.currency),
        draft.tenure_months
    );
    Ok(())
}

fn edit(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = get_debt(conn, &session.user, id)?;
    let mut d = current.draft();

    if let Some(s) = sub.get_one::<String>("name") {
        d.name = s.trim().to_string();
    }
    if let Some(s) = sub.get_one::<String>("type") {
        d.debt_type = s.parse()?;
    }
    if sub.contains_id("lender") {
        d.lender = optional_text(sub, "lender");
    }
    if let Some(s) = sub.get_one::<String>("principal") {
        d.principal_amount = parse_decimal(s)?;
    }
    if let Some(s) = sub.get_one::<String>("rate") {
        d.interest_rate = if s.trim().eq_ignore_ascii_case("none") {
            None
        } else {
            Some(parse_decimal(s)?)
        };
    }
    if let Some(t) = sub.get_one::<i64>("tenure") {
        d.tenure_months = *t;
    }
    if let Some(s) = sub.get_one::<String>("emi") {
        d.emi_amount = parse_decimal(s)?;
    }
    if let Some(s) = sub.get_one::<String>("start") {
        d.start_date = parse_date(s)?;
    }
    if let Some(n) = sub.get_one::<i64>("emi_paid") {
        d.emi_already_paid = *n;
    }
    match sub.get_one::<String>("amount_paid") {
        Some(s) => d.amount_already_paid = parse_decimal(s)?,
        None if sub.contains_id("emi_paid") || sub.contains_id("emi") => {
            d.amount_already_paid = opening_amount(d.emi_already_paid, d.emi_amount);
        }
        None => {}
    }
    if let Some(s) = sub.get_one::<String>("active") {
        d.is_active = parse_bool(s)?;
    }

    update_debt(conn, &session.user, id, &d)?;
    println!("Updated debt #{} '{}'", id, d.name);
    Ok(())
}

fn optional_text(sub: &clap::ArgMatches, id: &str) -> Option<String> {
    sub.get_one::<String>(id)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Opening balance implied by EMIs paid before tracking started.
pub fn opening_amount(emi_already_paid: i64, emi_amount: Decimal) -> Decimal {
    if emi_already_paid <= 0 {
        return round_money(Decimal::ZERO);
    }
    round_money(saturating_mul(Decimal::from(emi_already_paid), emi_amount))
}

pub fn create_debt(conn: &Connection, user: &User, draft: &DebtDraft) -> LedgerResult<i64> {
    let tx = conn.unchecked_transaction()?;
    if let Err(e) = validate_debt(draft) {
        tracing::warn!(user_id = user.id, errors = %e, "debt rejected");
        return Err(e.into());
    }
    tx.execute(
        "INSERT INTO debts(user_id, name, debt_type, lender, principal_amount, interest_rate,
             tenure_months, emi_amount, start_date, emi_already_paid, amount_already_paid, is_active)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
        params![
            user.id,
            draft.name,
            draft.debt_type.as_str(),
            draft.lender,
            round_money(draft.principal_amount).to_string(),
            draft.interest_rate.map(|r| round_money(r).to_string()),
            draft.tenure_months,
            round_money(draft.emi_amount).to_string(),
            draft.start_date,
            draft.emi_already_paid,
            round_money(draft.amount_already_paid).to_string(),
            draft.is_active,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    tracing::info!(debt_id = id, user_id = user.id, name = %draft.name, "debt created");
    Ok(id)
}

pub fn update_debt(conn: &Connection, user: &User, id: i64, draft: &DebtDraft) -> LedgerResult<()> {
    let tx = conn.unchecked_transaction()?;
    get_debt(&tx, user, id)?;
    if let Err(e) = validate_debt(draft) {
        tracing::warn!(debt_id = id, errors = %e, "debt update rejected");
        return Err(e.into());
    }
    tx.execute(
        "UPDATE debts SET name=?1, debt_type=?2, lender=?3, principal_amount=?4, interest_rate=?5,
             tenure_months=?6, emi_amount=?7, start_date=?8, emi_already_paid=?9,
             amount_already_paid=?10, is_active=?11, updated_at=datetime('now')
         WHERE id=?12",
        params![
            draft.name,
            draft.debt_type.as_str(),
            draft.lender,
            round_money(draft.principal_amount).to_string(),
            draft.interest_rate.map(|r| round_money(r).to_string()),
            draft.tenure_months,
            round_money(draft.emi_amount).to_string(),
            draft.start_date,
            draft.emi_already_paid,
            round_money(draft.amount_already_paid).to_string(),
            draft.is_active,
            id,
        ],
    )?;
    tx.commit()?;
    tracing::info!(debt_id = id, user_id = user.id, "debt updated");
    Ok(())
}

/// A debt owned by `user` and not archived.
pub fn get_debt(conn: &Connection, user: &User, id: i64) -> LedgerResult<Debt> {
    let sql = format!(
        "SELECT {} FROM debts WHERE id=?1 AND user_id=?2 AND is_deleted=0",
        DEBT_COLUMNS
    );
    conn.query_row(&sql, params![id, user.id], Debt::from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Debt", id))
}

pub fn list_debts(conn: &Connection, user: &User, include_inactive: bool) -> LedgerResult<Vec<Debt>> {
    let sql = format!(
        "SELECT {} FROM debts WHERE user_id=?1 AND is_deleted=0 AND (is_active=1 OR ?2) ORDER BY start_date, id",
        DEBT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user.id, include_inactive], Debt::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Number of expenses pointing at a debt, whatever their category.
pub fn linked_expense_count(conn: &Connection, debt_id: i64) -> LedgerResult<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM expenses WHERE debt_id=?1",
        params![debt_id],
        |r| r.get(0),
    )?;
    Ok(n)
}

pub fn delete_debt(conn: &Connection, user: &User, id: i64) -> LedgerResult<()> {
    let tx = conn.unchecked_transaction()?;
    get_debt(&tx, user, id)?;
    let linked = linked_expense_count(&tx, id)?;
    if linked > 0 {
        tracing::warn!(debt_id = id, linked, "debt delete blocked");
        return Err(LedgerError::DeleteBlocked { debt_id: id, linked });
    }
    tx.execute("DELETE FROM debts WHERE id=?1", params![id])?;
    tx.commit()?;
    tracing::info!(debt_id = id, user_id = user.id, "debt deleted");
    Ok(())
}

/// Hide a debt from lists while keeping its payments intact.
pub fn archive_debt(conn: &Connection, user: &User, id: i64) -> LedgerResult<()> {
    get_debt(conn, user, id)?;
    conn.execute(
        "UPDATE debts SET is_deleted=1, is_active=0, updated_at=datetime('now') WHERE id=?1",
        params![id],
    )?;
    tracing::info!(debt_id = id, user_id = user.id, "debt archived");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DebtRow {
    pub id: i64,
    pub name: String,
    pub debt_type: String,
    pub lender: String,
    pub principal_amount: Decimal,
    pub emi_amount: Decimal,
    pub tenure_months: i64,
    pub total_emi_paid: i64,
    pub emi_remaining: i64,
    pub status: String,
    pub gross_amount: Decimal,
    pub net_paid: Decimal,
    pub net_remaining: Decimal,
    pub is_active: bool,
}

impl DebtRow {
    fn new(debt: &Debt, ledger: &DebtLedger) -> Self {
        DebtRow {
            id: debt.id,
            name: debt.name.clone(),
            debt_type: debt.debt_type.to_string(),
            lender: debt.lender.clone().unwrap_or_default(),
            principal_amount: round_money(debt.principal_amount),
            emi_amount: round_money(debt.emi_amount),
            tenure_months: debt.tenure_months,
            total_emi_paid: ledger.total_emi_paid,
            emi_remaining: ledger.emi_remaining,
            status: ledger.status.to_string(),
            gross_amount: ledger.gross_amount,
            net_paid: ledger.net_paid,
            net_remaining: ledger.net_remaining,
            is_active: debt.is_active,
        }
    }
}

/// One ledger per debt plus list-wide totals.
pub fn debt_rows(
    conn: &Connection,
    user: &User,
    include_inactive: bool,
    model: InterestModel,
) -> LedgerResult<(Vec<DebtRow>, DebtTotals)> {
    let mut rows = Vec::new();
    let mut totals = DebtTotals::default();
    for debt in list_debts(conn, user, include_inactive)? {
        let ledger = debt_ledger(conn, &debt, model)?;
        totals.add(&debt, &ledger);
        rows.push(DebtRow::new(&debt, &ledger));
    }
    Ok((rows, totals))
}

fn info(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let debt = get_debt(conn, &session.user, id)?;
    let ledger = debt_ledger(conn, &debt, session.settings.interest_model)?;
    let out = json!({ "debt": debt, "ledger": ledger });
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        return Ok(());
    }

    let ccy = &session.settings.currency;
    let rate = match debt.interest_rate {
        Some(r) => format!("{}% ({})", r, session.settings.interest_model),
        None => "-".to_string(),
    };
    let terms = vec![
        vec!["Name".into(), debt.name.clone()],
        vec!["Type".into(), debt.debt_type.to_string()],
        vec!["Lender".into(), debt.lender.clone().unwrap_or_default()],
        vec!["Principal".into(), fmt_money(&debt.principal_amount, ccy)],
        vec!["Interest rate".into(), rate],
        vec!["Tenure (months)".into(), debt.tenure_months.to_string()],
        vec!["EMI".into(), fmt_money(&debt.emi_amount, ccy)],
        vec!["Start date".into(), debt.start_date.to_string()],
        vec!["EMIs paid before tracking".into(), debt.emi_already_paid.to_string()],
        vec!["Paid before tracking".into(), fmt_money(&debt.amount_already_paid, ccy)],
        vec!["Active".into(), debt.is_active.to_string()],
    ];
    println!("{}", pretty_table(&["Debt", "Value"], terms));

    let figures = vec![
        vec!["Status".into(), ledger.status.to_string()],
        vec!["Recorded EMI payments".into(), ledger.paid_payment_count.to_string()],
        vec!["Recorded amount".into(), fmt_money(&ledger.paid_payment_amount, ccy)],
        vec!["Total EMIs paid".into(), ledger.total_emi_paid.to_string()],
        vec!["EMIs remaining".into(), ledger.emi_remaining.to_string()],
        vec!["Monthly interest".into(), fmt_money(&ledger.monthly_interest, ccy)],
        vec!["Total interest".into(), fmt_money(&ledger.total_interest, ccy)],
        vec!["Gross payable".into(), fmt_money(&ledger.gross_amount, ccy)],
        vec!["Net paid".into(), fmt_money(&ledger.net_paid, ccy)],
        vec!["Net remaining".into(), fmt_money(&ledger.net_remaining, ccy)],
    ];
    println!("{}", pretty_table(&["Ledger", "Value"], figures));
    Ok(())
}

fn list(conn: &Connection, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let (rows, totals) = debt_rows(
        conn,
        &session.user,
        sub.get_flag("all"),
        session.settings.interest_model,
    )?;
    let out = json!({ "debts": rows, "totals": totals });
    if sub.get_flag("jsonl") {
        maybe_print_json(false, true, &rows)?;
        return Ok(());
    }
    if maybe_print_json(sub.get_flag("json"), false, &out)? {
        return Ok(());
    }

    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.name.clone(),
                r.debt_type.clone(),
                r.lender.clone(),
                format!("{:.2}", r.principal_amount),
                format!("{}/{}", r.total_emi_paid, r.tenure_months),
                r.emi_remaining.to_string(),
                r.status.clone(),
                format!("{:.2}", r.net_paid),
                format!("{:.2}", r.net_remaining),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[
                "ID", "Name", "Type", "Lender", "Principal", "EMIs", "Left", "Status", "Paid",
                "Remaining"
            ],
            data,
        )
    );
    let ccy = &session.settings.currency;
    println!(
        "Total debt {} | paid {} | remaining {}",
        fmt_money(&totals.principal, ccy),
        fmt_money(&totals.net_paid, ccy),
        fmt_money(&totals.net_remaining, ccy)
    );
    Ok(())
}
