// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{KNOWN_KEYS, Settings, set_setting};
use crate::utils::pretty_table;
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let s = Settings::load(conn)?;
            let data = s
                .entries()
                .into_iter()
                .map(|(k, v)| vec![k.to_string(), v])
                .collect();
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim().to_lowercase();
            let value = sub.get_one::<String>("value").unwrap();
            let stored = set_setting(conn, &key, value)
                .with_context(|| format!("Known keys: {}", KNOWN_KEYS.join(", ")))?;
            println!("Set {} = {}", key, stored);
        }
        _ => {}
    }
    Ok(())
}
