// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::UserId;
use crate::settings;
use crate::utils::{pretty_table, required};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => match sub.get_one::<String>("key") {
            Some(key) => println!("{}", settings::get(conn, user_id, key.trim())?),
            None => {
                let mut data = Vec::new();
                for key in settings::KEYS {
                    let stored = settings::get_raw(conn, user_id, key)?.is_some();
                    data.push(vec![
                        key.to_string(),
                        settings::get(conn, user_id, key)?,
                        if stored { String::new() } else { "default".into() },
                    ]);
                }
                println!("{}", pretty_table(&["Key", "Value", "Source"], data));
            }
        },
        Some(("set", sub)) => {
            let key = required(sub, "key")?.trim();
            let value = settings::set(conn, user_id, key, required(sub, "value")?)?;
            println!("{} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
