// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::UserId;
use crate::store::accounts;
use crate::utils::{pretty_table, required};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let vendor = required(sub, "vendor")?;
            let login = required(sub, "login")?;
            let label = sub.get_one::<String>("label").map(|s| s.as_str());
            let id = accounts::create_access(conn, user_id, vendor, login, label)?;
            println!("Added access {} ({})", id, vendor);
        }
        Some(("list", _)) => {
            let data = accounts::list_accesses(conn, user_id)?
                .into_iter()
                .map(|a| {
                    vec![
                        a.id.to_string(),
                        a.vendor,
                        a.login,
                        a.label.unwrap_or_default(),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["ID", "Vendor", "Login", "Label"], data));
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            accounts::delete_access(conn, user_id, id)?;
            println!("Removed access {} and its accounts", id);
        }
        _ => {}
    }
    Ok(())
}
