// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::duplicates;
use crate::models::UserId;
use crate::utils::{fmt_datetime, id_for_account, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("find", sub)) => {
            let found = match sub.get_one::<String>("account") {
                Some(label) => {
                    let id = id_for_account(conn, user_id, label)?;
                    duplicates::find_duplicates_for_account(conn, user_id, id)?
                }
                None => duplicates::find_duplicates_for_user(conn, user_id)?,
            };
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &found)? {
                let rows = found
                    .iter()
                    .map(|c| {
                        vec![
                            format!("{} / {}", c.first_id, c.second_id),
                            c.amount.to_string(),
                            fmt_datetime(&c.first_date),
                            fmt_datetime(&c.second_date),
                            format!("{} / {}", c.first_label, c.second_label),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["IDs", "Amount", "First", "Second", "Labels"], rows)
                );
            }
        }
        Some(("dismiss", sub)) => {
            let a = *sub.get_one::<i64>("first").context("Missing --first")?;
            let b = *sub.get_one::<i64>("second").context("Missing --second")?;
            if duplicates::dismiss_duplicate(conn, user_id, a, b)? {
                println!("Pair {} / {} will no longer be proposed", a, b);
            } else {
                println!("Pair {} / {} was already dismissed", a, b);
            }
        }
        _ => {}
    }
    Ok(())
}
