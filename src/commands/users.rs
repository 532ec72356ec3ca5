// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::utils::{pretty_table, required, user_id_for_login};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let login = required(sub, "login")?;
            let id = user_id_for_login(conn, login)?;
            println!("User '{}' has id {}", login.trim(), id);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare("SELECT id, login FROM users ORDER BY login")?;
            let rows = stmt.query_map([], |r| {
                Ok(User {
                    id: r.get(0)?,
                    login: r.get(1)?,
                })
            })?;
            let mut data = Vec::new();
            for row in rows {
                let user = row?;
                data.push(vec![user.id.to_string(), user.login]);
            }
            println!("{}", pretty_table(&["ID", "Login"], data));
        }
        _ => {}
    }
    Ok(())
}
