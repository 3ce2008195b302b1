// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use clap::ArgMatches;
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use homeledger::commands::{self, Session};
use homeledger::{cli, config::Settings, db, utils};

const LOG_ENV: &str = "HOMELEDGER_LOG";

/// `--user` is global, so it may sit at any depth.
fn user_flag(m: &ArgMatches) -> Option<String> {
    if let Some(u) = m.get_one::<String>("user") {
        return Some(u.clone());
    }
    m.subcommand().and_then(|(_, sub)| user_flag(sub))
}

fn session(conn: &Connection, matches: &ArgMatches) -> Result<Session> {
    let settings = Settings::load(conn)?;
    let username = settings.active_username(user_flag(matches).as_deref());
    let user = utils::find_user(conn, &username)
        .with_context(|| format!("Create it with: homeledger user add --name {}", username))?;
    Ok(Session { user, settings })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        Some(("doctor", _)) => {
            let settings = Settings::load(&conn)?;
            commands::doctor::handle(&conn, settings.interest_model)?
        }
        Some(("category", sub)) => {
            commands::categories::handle(&conn, &session(&conn, &matches)?, sub)?
        }
        Some(("debt", sub)) => commands::debts::handle(&conn, &session(&conn, &matches)?, sub)?,
        Some(("tx", sub)) => {
            commands::transactions::handle(&conn, &session(&conn, &matches)?, sub)?
        }
        Some(("report", sub)) => {
            commands::dashboard::handle(&conn, &session(&conn, &matches)?, sub)?
        }
        Some(("export", sub)) => {
            commands::exporter::handle(&conn, &session(&conn, &matches)?, sub)?
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
