// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::error::{LedgerError, Result as LedgerResult, ValidationError};
use crate::models::{Category, DEBT_CATEGORY_SLUG, User};
use crate::utils::{maybe_print_json, pretty_table};
use crate::validation::{normalize_category_name, slugify, validate_category};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

pub fn handle(conn: &Connection, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            create_category(conn, &session.user, name)?;
            println!("Added category '{}'", normalize_category_name(name));
        }
        Some(("list", sub)) => {
            let cats = list_categories(conn, &session.user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let data = cats
                    .into_iter()
                    .map(|c| {
                        let scope = if c.user_id == session.user.id {
                            "mine"
                        } else {
                            "global"
                        };
                        vec![title_case(&c.name), c.slug, scope.to_string()]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Slug", "Scope"], data));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            remove_category(conn, &session.user, name)?;
            println!("Removed category '{}'", normalize_category_name(name));
        }
        _ => {}
    }
    Ok(())
}

pub fn create_category(conn: &Connection, user: &User, name: &str) -> LedgerResult<i64> {
    let name = normalize_category_name(name);
    let tx = conn.unchecked_transaction()?;
    if let Err(e) = validate_category(&*tx, user, &name, None) {
        tracing::warn!(user_id = user.id, name = %name, error = %e, "category rejected");
        return Err(e);
    }
    tx.execute(
        "INSERT INTO categories(user_id, name, slug) VALUES (?1, ?2, ?3)",
        params![user.id, name, slugify(&name)],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    tracing::info!(category_id = id, user_id = user.id, name = %name, "category created");
    Ok(id)
}

/// The user's own categories plus every global one, skipping soft-deleted rows.
pub fn list_categories(conn: &Connection, user: &User) -> LedgerResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.user_id, c.name, c.slug, c.is_deleted FROM categories c
         JOIN users u ON c.user_id=u.id
         WHERE (c.user_id=?1 OR u.is_superuser=1) AND c.is_deleted=0
         ORDER BY c.name",
    )?;
    let rows = stmt.query_map(params![user.id], |r| {
        Ok(Category {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            slug: r.get(3)?,
            is_deleted: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Soft delete; expenses keep pointing at the row.
pub fn remove_category(conn: &Connection, user: &User, name: &str) -> LedgerResult<()> {
    let name = normalize_category_name(name);
    let found: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, slug FROM categories WHERE user_id=?1 AND lower(name)=?2 AND is_deleted=0",
            params![user.id, name],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((id, slug)) = found else {
        return Err(LedgerError::not_found("Category", name));
    };
    if slug == DEBT_CATEGORY_SLUG {
        let mut errors = ValidationError::new();
        errors.add("name", "The debt category is reserved and cannot be removed.");
        return Err(errors.into());
    }
    conn.execute(
        "UPDATE categories SET is_deleted=1, updated_at=datetime('now') WHERE id=?1",
        params![id],
    )?;
    tracing::info!(category_id = id, user_id = user.id, "category removed");
    Ok(())
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
