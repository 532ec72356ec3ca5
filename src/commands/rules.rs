// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::UserId;
use crate::store::{categories, rules};
use crate::utils::{id_for_category, pretty_table, required};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let pattern = required(sub, "pattern")?.trim();
            let cat = sub
                .get_one::<String>("category")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());
            let rewrite = sub.get_one::<String>("label-rewrite").map(|s| s.as_str());
            let cat_id = match cat {
                Some(c) => Some(id_for_category(conn, user_id, c)?),
                None => None,
            };
            let id = rules::create_rule(conn, user_id, pattern, cat_id, rewrite)?;
            println!(
                "Added rule {}: /{}/ -> category {:?}, rewrite {:?}",
                id, pattern, cat, rewrite
            );
        }
        Some(("list", _)) => {
            let names: HashMap<i64, String> = categories::list_categories(conn, user_id)?
                .into_iter()
                .map(|c| (c.id, c.label))
                .collect();
            let data = rules::list_rules(conn, user_id)?
                .into_iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.pattern,
                        r.category_id
                            .and_then(|cid| names.get(&cid).cloned())
                            .unwrap_or_default(),
                        r.label_rewrite.unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "Pattern", "Category", "Label Rewrite"], data)
            );
        }
        Some(("rm", sub)) => {
            let raw = required(sub, "id")?;
            let id = raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid rule id '{}'", raw))?;
            rules::delete_rule(conn, user_id, id)?;
            println!("Removed rule {}", id);
        }
        _ => {}
    }
    Ok(())
}
