// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::UserId;
use crate::store::{budgets, categories};
use crate::utils::{id_for_category, parse_decimal, parse_month, pretty_table, required};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, user_id, sub)?,
        Some(("list", sub)) => list(conn, user_id, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, user_id: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let (year, month) = parse_month(required(sub, "month")?)?;
    let cat = required(sub, "category")?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let cat_id = id_for_category(conn, user_id, cat)?;
    budgets::set_budget(conn, user_id, cat_id, year, month, amount)?;
    println!("Budget set for {}-{:02} / {} = {}", year, month, cat, amount);
    Ok(())
}

fn list(conn: &Connection, user_id: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let period = match sub.get_one::<String>("month") {
        Some(m) => Some(parse_month(m)?),
        None => None,
    };
    let names: HashMap<i64, String> = categories::list_categories(conn, user_id)?
        .into_iter()
        .map(|c| (c.id, c.label))
        .collect();
    let data = budgets::list_budgets(conn, user_id, period)?
        .into_iter()
        .map(|b| {
            vec![
                format!("{}-{:02}", b.year, b.month),
                names.get(&b.category_id).cloned().unwrap_or_default(),
                b.threshold.to_string(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Month", "Category", "Threshold"], data));
    Ok(())
}
