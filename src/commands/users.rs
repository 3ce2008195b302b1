// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Result as LedgerResult, ValidationError};
use crate::models::User;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let superuser = sub.get_flag("superuser");
            create_user(conn, name, superuser)?;
            println!(
                "Added user '{}'{}",
                name.trim(),
                if superuser { " (superuser)" } else { "" }
            );
        }
        Some(("list", _)) => {
            let data = list_users(conn)?
                .into_iter()
                .map(|u| {
                    vec![
                        u.id.to_string(),
                        u.username,
                        if u.is_superuser { "yes".into() } else { String::new() },
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["ID", "Username", "Superuser"], data));
        }
        _ => {}
    }
    Ok(())
}

pub fn create_user(conn: &Connection, username: &str, is_superuser: bool) -> LedgerResult<i64> {
    let username = username.trim();
    let mut errors = ValidationError::new();
    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else {
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username=?1)",
            params![username],
            |r| r.get(0),
        )?;
        if taken {
            errors.add("username", "A user with that username already exists.");
        }
    }
    errors.into_result()?;

    conn.execute(
        "INSERT INTO users(username, is_superuser) VALUES (?1, ?2)",
        params![username, is_superuser],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, username, is_superuser, "user created");
    Ok(id)
}

pub fn list_users(conn: &Connection) -> LedgerResult<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, username, is_superuser FROM users ORDER BY username")?;
    let rows = stmt.query_map([], |r| {
        Ok(User {
            id: r.get(0)?,
            username: r.get(1)?,
            is_superuser: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
