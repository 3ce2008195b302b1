// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Homeledger", "homeledger"));

/// Overrides the platform data directory when set.
pub const DB_ENV: &str = "HOMELEDGER_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .ok_or(crate::error::LedgerError::NoDataDir)?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("homeledger.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    tracing::debug!(path = %path.display(), "opening database");
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create tables if missing and seed the superuser plus the reserved debt category.
pub fn init_schema(conn: &Connection) -> crate::error::Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        is_superuser INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_categories_slug ON categories(slug);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_debt_slug ON categories(slug) WHERE slug='debt';

    CREATE TABLE IF NOT EXISTS debts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        debt_type TEXT NOT NULL CHECK(debt_type IN ('LOAN','EMI','BORROW','OTHER')),
        lender TEXT,
        principal_amount TEXT NOT NULL,
        interest_rate TEXT, -- percent per month
        tenure_months INTEGER NOT NULL,
        emi_amount TEXT NOT NULL,
        start_date TEXT NOT NULL,
        emi_already_paid INTEGER NOT NULL DEFAULT 0,
        amount_already_paid TEXT NOT NULL DEFAULT '0.00',
        is_active INTEGER NOT NULL DEFAULT 1,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        category_id INTEGER,
        debt_id INTEGER,
        amount TEXT NOT NULL,
        payment_mode TEXT NOT NULL CHECK(payment_mode IN ('cash','upi','card','bank')),
        expense_date TEXT NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL,
        FOREIGN KEY(debt_id) REFERENCES debts(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date);
    CREATE INDEX IF NOT EXISTS idx_expenses_debt ON expenses(debt_id);

    INSERT OR IGNORE INTO users(username, is_superuser) VALUES ('admin', 1);

    INSERT INTO categories(user_id, name, slug)
        SELECT id, 'debt', 'debt' FROM users
        WHERE username='admin'
          AND NOT EXISTS (SELECT 1 FROM categories WHERE slug='debt');
    "#,
    )?;
    tracing::debug!("schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_seeds_debt_category() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories WHERE slug='debt'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(n, 1);
        let su: bool = conn
            .query_row(
                "SELECT is_superuser FROM users WHERE username='admin'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(su);
    }

    #[test]
    fn debt_slug_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let dup = conn.execute(
            "INSERT INTO categories(user_id, name, slug) VALUES (1, 'debt.', 'debt')",
            [],
        );
        assert!(dup.is_err());
    }
}
