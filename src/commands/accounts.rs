// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::balance;
use crate::models::UserId;
use crate::settings;
use crate::store::accounts::{self, NewAccount};
use crate::utils::{
    fmt_money, id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table,
    required,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user_id, sub)?,
        Some(("list", sub)) => list(conn, user_id, sub)?,
        Some(("rm", sub)) => {
            let label = required(sub, "label")?;
            let id = id_for_account(conn, user_id, label)?;
            accounts::delete_account(conn, user_id, id)?;
            println!("Removed account '{}' and its transactions", label);
        }
        Some(("balance", sub)) => balances(conn, user_id, sub)?,
        Some(("recompute", sub)) => {
            let label = required(sub, "account")?;
            let id = id_for_account(conn, user_id, label)?;
            let (value, skipped) = balance::recompute_balance(conn, user_id, id, balance::today())?;
            let ccy = accounts::get_account(conn, user_id, id)?.currency;
            println!("Balance of '{}' is now {}", label, fmt_money(&value, &ccy));
            if !skipped.is_empty() {
                println!("{} corrupt transaction(s) were skipped; run `doctor`", skipped.len());
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, user_id: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let access_id = *sub.get_one::<i64>("access").context("Missing --access")?;
    let label = required(sub, "label")?;
    let typ = required(sub, "type")?;
    let ccy = match sub.get_one::<String>("currency") {
        Some(c) => c.trim().to_uppercase(),
        None => settings::load(conn, user_id)?.default_currency,
    };
    let initial_balance = parse_decimal(required(sub, "initial-balance")?)?;
    let import_date = match sub.get_one::<String>("import-date") {
        Some(s) => parse_date(s)?,
        None => balance::today(),
    };
    let account = NewAccount {
        access_id,
        label: label.to_string(),
        r#type: typ.to_string(),
        currency: ccy.clone(),
        initial_balance,
        import_date,
    };
    let id = accounts::create_account(conn, user_id, &account)?;
    println!("Added account '{}' ({}, {}) with id {}", label, typ, ccy, id);
    Ok(())
}

fn list(conn: &Connection, user_id: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let data = accounts::list_accounts(conn, user_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|a| {
                vec![
                    a.id.to_string(),
                    a.label,
                    a.r#type,
                    a.currency.clone(),
                    fmt_money(&a.initial_balance, &a.currency),
                    a.import_date.to_string(),
                    a.balance
                        .map(|b| fmt_money(&b, &a.currency))
                        .unwrap_or_else(|| "(stale)".to_string()),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Label", "Type", "CCY", "Initial", "Imported", "Cached balance"],
                rows
            )
        );
    }
    Ok(())
}

fn balances(conn: &mut Connection, user_id: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let ids = match sub.get_one::<String>("account") {
        Some(label) => vec![id_for_account(conn, user_id, label)?],
        None => accounts::list_accounts(conn, user_id)?
            .into_iter()
            .map(|a| a.id)
            .collect(),
    };
    let today = balance::today();
    let mut data = Vec::with_capacity(ids.len());
    for id in ids {
        data.push(balance::account_summary(conn, user_id, id, today)?);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|s| {
                vec![
                    s.label.clone(),
                    s.account_type.to_string(),
                    fmt_money(&s.balance, &s.currency),
                    fmt_money(&s.outstanding_sum, &s.currency),
                    s.skipped.len().to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Account", "Type", "Balance", "Outstanding", "Skipped rows"],
                rows
            )
        );
    }
    Ok(())
}
