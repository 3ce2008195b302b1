// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! User-facing settings.
//!
//! Values live in the `settings` table; the active user can also come from
//! the `--user` flag or the `HOMELEDGER_USER` environment variable.

use crate::error::{LedgerError, Result};
use crate::ledger::InterestModel;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub const USER_ENV: &str = "HOMELEDGER_USER";
pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_CURRENCY: &str = "INR";

pub const KEY_CURRENCY: &str = "currency";
pub const KEY_INTEREST_MODEL: &str = "interest_model";
pub const KEY_DEFAULT_USER: &str = "default_user";

pub const KNOWN_KEYS: [&str; 3] = [KEY_CURRENCY, KEY_INTEREST_MODEL, KEY_DEFAULT_USER];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub currency: String,
    pub interest_model: InterestModel,
    pub default_user: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            currency: DEFAULT_CURRENCY.to_string(),
            interest_model: InterestModel::default(),
            default_user: DEFAULT_USER.to_string(),
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Settings> {
        let mut s = Settings::default();
        if let Some(v) = get_setting(conn, KEY_CURRENCY)? {
            s.currency = v;
        }
        if let Some(v) = get_setting(conn, KEY_INTEREST_MODEL)? {
            s.interest_model = v.parse()?;
        }
        if let Some(v) = get_setting(conn, KEY_DEFAULT_USER)? {
            s.default_user = v;
        }
        Ok(s)
    }

    /// Flag wins over the environment, which wins over the stored default.
    pub fn active_username(&self, flag: Option<&str>) -> String {
        flag.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                std::env::var(USER_ENV)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| self.default_user.clone())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_CURRENCY, self.currency.clone()),
            (KEY_INTEREST_MODEL, self.interest_model.to_string()),
            (KEY_DEFAULT_USER, self.default_user.clone()),
        ]
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

/// Store a setting after checking the key and normalizing the value.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<String> {
    let value = value.trim();
    let normalized = match key {
        KEY_CURRENCY => {
            if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(LedgerError::invalid("currency", value));
            }
            value.to_uppercase()
        }
        KEY_INTEREST_MODEL => value.parse::<InterestModel>()?.to_string(),
        KEY_DEFAULT_USER => {
            if value.is_empty() {
                return Err(LedgerError::invalid("default_user", value));
            }
            value.to_string()
        }
        _ => return Err(LedgerError::invalid("setting", key)),
    };
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, normalized],
    )?;
    tracing::info!(key, value = %normalized, "setting updated");
    Ok(normalized)
}
