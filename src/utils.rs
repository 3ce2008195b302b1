// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result as LedgerResult};
use crate::models::User;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(anyhow::anyhow!("Invalid boolean '{}', expected true|false", s)),
    }
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, crate::ledger::round_money(*d))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn find_user(conn: &Connection, username: &str) -> LedgerResult<User> {
    conn.query_row(
        "SELECT id, username, is_superuser FROM users WHERE username=?1",
        params![username.trim()],
        |r| {
            Ok(User {
                id: r.get(0)?,
                username: r.get(1)?,
                is_superuser: r.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("User", username.trim()))
}

/// Categories a user may tag expenses with: their own plus every superuser's.
pub fn id_for_category(conn: &Connection, user: &User, name: &str) -> LedgerResult<i64> {
    let name = crate::validation::normalize_category_name(name);
    conn.query_row(
        "SELECT c.id FROM categories c JOIN users u ON c.user_id=u.id
         WHERE lower(c.name)=?1 AND c.is_deleted=0 AND (c.user_id=?2 OR u.is_superuser=1)
         ORDER BY c.user_id=?2 DESC LIMIT 1",
        params![name, user.id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Category", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsers_trim_input() {
        assert_eq!(
            parse_date(" 2025-03-01 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
        assert_eq!(parse_month("2025-03").unwrap(), "2025-03");
        assert!(parse_month("2025-13").is_err());
        assert_eq!(parse_decimal(" 10.50 ").unwrap().to_string(), "10.50");
        assert!(parse_bool("maybe").is_err());
        assert_eq!(fmt_money(&Decimal::from(5), "INR"), "INR 5.00");
    }
}
