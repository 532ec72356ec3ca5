// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{NewTransaction, TransactionType, UserId};
use crate::store::{rules, transactions};
use crate::utils::{
    id_for_account, id_for_category, maybe_print_json, parse_datetime, parse_decimal,
    pretty_table, required,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user_id, sub)?,
        Some(("list", sub)) => list(conn, user_id, sub)?,
        Some(("categorize", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let category_id = match sub.get_one::<String>("category") {
                Some(c) => Some(id_for_category(conn, user_id, c)?),
                None => None,
            };
            transactions::set_transaction_category(conn, user_id, id, category_id)?;
            println!("Transaction {} categorized", id);
        }
        Some(("label", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let label = sub.get_one::<String>("custom-label").map(|s| s.as_str());
            transactions::set_custom_label(conn, user_id, id, label)?;
            println!("Transaction {} relabeled", id);
        }
        Some(("redate", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let date = parse_datetime(required(sub, "date")?)?;
            transactions::set_transaction_date(conn, user_id, id, date)?;
            println!("Transaction {} moved to {}", id, date);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, user_id: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_datetime(required(sub, "date")?)?;
    let debit_date = match sub.get_one::<String>("debit-date") {
        Some(raw) => Some(parse_datetime(raw)?),
        None => None,
    };
    let account_name = required(sub, "account")?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let label = required(sub, "label")?;

    let account_id = id_for_account(conn, user_id, account_name)?;
    let mut category_id = match sub.get_one::<String>("category") {
        Some(cat) => Some(id_for_category(conn, user_id, cat)?),
        None => None,
    };
    if category_id.is_none() {
        let (rule_cat, _) = rules::apply_rules(conn, user_id, label, None)?;
        category_id = rule_cat;
    }

    let mut tx = NewTransaction::manual(account_id, date, amount, label);
    tx.category_id = category_id;
    tx.debit_date = debit_date;
    tx.custom_label = sub.get_one::<String>("custom-label").cloned();
    tx.r#type = TransactionType::parse(required(sub, "type")?);
    tx.pending = sub.get_flag("pending");

    let id = transactions::insert_transaction(conn, user_id, &tx)?;
    println!(
        "Recorded {} on {} at '{}' (acct: {}, id: {})",
        amount, date, label, account_name, id
    );
    Ok(())
}

fn list(conn: &Connection, user_id: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, user_id, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.account.clone(),
                    r.label.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    if r.pending { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Account", "Label", "Amount", "Category", "Pending"],
                rows,
            )
        );
    }
    Ok(())
}

/// Display row. Values are shown as stored, so corrupt cells stay visible.
#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub label: String,
    pub amount: String,
    pub category: String,
    pub pending: bool,
}

pub fn query_rows(
    conn: &Connection,
    user_id: UserId,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, a.label, COALESCE(t.custom_label, t.label), CAST(t.amount AS TEXT), c.label, t.pending
         FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.user_id=?",
    );
    let mut params_vec: Vec<rusqlite::types::Value> = vec![user_id.into()];

    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.label=?");
        params_vec.push(acct.trim().to_string().into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.label=?");
        params_vec.push(cat.trim().to_string().into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(i64::try_from(*limit).unwrap_or(i64::MAX).into());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let category: Option<String> = r.get(5)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            account: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
            label: r.get(3)?,
            amount: r.get(4)?,
            category: category.unwrap_or_default(),
            pending: r.get(6)?,
        });
    }
    Ok(data)
}
