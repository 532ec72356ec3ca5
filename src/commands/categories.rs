// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cascade;
use crate::models::UserId;
use crate::store::categories;
use crate::utils::{id_for_category, pretty_table, required};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let label = required(sub, "label")?;
            let color = sub.get_one::<String>("color").map(|s| s.as_str());
            categories::create_category(conn, user_id, label, color)?;
            println!("Added category '{}'", label.trim());
        }
        Some(("list", _)) => {
            let data = categories::list_categories(conn, user_id)?
                .into_iter()
                .map(|c| vec![c.id.to_string(), c.label, c.color.unwrap_or_default()])
                .collect();
            println!("{}", pretty_table(&["ID", "Category", "Color"], data));
        }
        Some(("rm", sub)) => {
            let label = required(sub, "label")?;
            let id = id_for_category(conn, user_id, label)?;
            let replacement = match sub.get_one::<String>("replace-with") {
                Some(r) => Some(id_for_category(conn, user_id, r)?),
                None => None,
            };
            let report = cascade::destroy_category(conn, user_id, id, replacement)?;
            println!(
                "Removed category '{}': {} transaction(s) and {} rule(s) moved, {} budget(s) deleted",
                label.trim(),
                report.transactions_migrated,
                report.rules_migrated,
                report.budgets_removed
            );
        }
        _ => {}
    }
    Ok(())
}
