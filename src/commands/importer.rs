// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::duplicates;
use crate::models::{AccountId, CategoryId, NewTransaction, TransactionType, UserId};
use crate::store::{rules, transactions};
use crate::utils::{id_for_account, id_for_category, parse_datetime, parse_decimal, required};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap, hash_map::Entry};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub accounts: Vec<AccountId>,
    pub duplicate_candidates: usize,
}

pub fn handle(conn: &mut Connection, user_id: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let path = required(sub, "path")?.trim();
            let summary = import_transactions(conn, user_id, Path::new(path))?;
            println!(
                "Imported {} transaction(s) from {} into {} account(s)",
                summary.imported,
                path,
                summary.accounts.len()
            );
            if summary.duplicate_candidates > 0 {
                println!(
                    "{} possible duplicate pair(s); see `duplicates find`",
                    summary.duplicate_candidates
                );
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(anyhow!("Invalid pending flag '{}'", other)),
    }
}

/// Inserts every row of the CSV in one transaction, then scans the touched
/// accounts for duplicates. Any bad row aborts the whole file.
pub fn import_transactions(
    conn: &mut Connection,
    user_id: UserId,
    path: &Path,
) -> Result<ImportSummary> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;

    let tx = conn.transaction()?;
    let mut account_cache: HashMap<String, AccountId> = HashMap::new();
    let mut category_cache: HashMap<String, CategoryId> = HashMap::new();
    let mut touched = BTreeSet::new();
    let mut imported = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 2;
        let rec = result?;
        let field = |i: usize| rec.get(i).map(str::trim).unwrap_or("");

        let date_raw = field(0);
        let label = field(1);
        let amount_raw = field(2);
        let category = field(3);
        let account = field(4);
        if label.is_empty() {
            return Err(anyhow!("Line {}: label missing", line));
        }
        if account.is_empty() {
            return Err(anyhow!("Line {}: account missing", line));
        }

        let date = parse_datetime(date_raw).with_context(|| format!("Line {}", line))?;
        let amount = parse_decimal(amount_raw)
            .with_context(|| format!("Line {}: invalid amount for {}", line, label))?;
        let debit_date = match field(8) {
            "" => None,
            raw => Some(parse_datetime(raw).with_context(|| format!("Line {}: debit date", line))?),
        };

        let account_id = match account_cache.entry(account.to_string()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => *entry.insert(id_for_account(&tx, user_id, account)?),
        };
        let mut category_id = if category.is_empty() {
            None
        } else {
            let cid = match category_cache.entry(category.to_string()) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => *entry.insert(id_for_category(&tx, user_id, category)?),
            };
            Some(cid)
        };

        let custom_label = Some(field(7)).filter(|s| !s.is_empty());
        let (rule_cat, rewrite) = rules::apply_rules(&tx, user_id, label, custom_label)?;
        if category_id.is_none() {
            category_id = rule_cat;
        }

        let new_tx = NewTransaction {
            account_id,
            category_id,
            r#type: TransactionType::parse(field(5)),
            label: rewrite.unwrap_or_else(|| label.to_string()),
            raw_label: label.to_string(),
            custom_label: custom_label.map(str::to_string),
            date,
            debit_date,
            amount,
            created_by_user: false,
            pending: parse_flag(field(6)).with_context(|| format!("Line {}", line))?,
        };
        transactions::insert_transaction(&tx, user_id, &new_tx)?;
        touched.insert(account_id);
        imported += 1;
    }
    tx.commit()?;
    tracing::info!(user_id, imported, accounts = touched.len(), path = %path.display(), "import committed");

    let mut duplicate_candidates = 0;
    for &account_id in &touched {
        duplicate_candidates += duplicates::find_duplicates_for_account(conn, user_id, account_id)?.len();
    }
    Ok(ImportSummary {
        imported,
        accounts: touched.into_iter().collect(),
        duplicate_candidates,
    })
}
