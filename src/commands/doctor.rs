// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::UserId;
use crate::store::{accounts, transactions};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Collects ledger problems as (issue, detail) rows. Nothing is repaired.
pub fn diagnose(conn: &Connection, user_id: UserId) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();

    // 1) Rows the balance and duplicate scans skip
    let loaded = transactions::find_transactions_for_user(conn, user_id, None)?;
    for warning in loaded.corrupt {
        rows.push((
            "corrupt_transaction".to_string(),
            format!("#{}: {}", warning.transaction_id, warning.reason),
        ));
    }

    // 2) Stale balance caches
    for account in accounts::list_accounts(conn, user_id)? {
        if account.balance.is_none() {
            rows.push(("stale_balance".to_string(), account.label));
        }
    }

    // 3) Category references without a category
    let orphaned = transactions::count_orphaned(conn, user_id)?;
    if orphaned > 0 {
        rows.push((
            "orphaned_category_ref".to_string(),
            format!("{} transaction(s)", orphaned),
        ));
    }
    Ok(rows)
}

pub fn handle(conn: &Connection, user_id: UserId) -> Result<()> {
    let rows = diagnose(conn, user_id)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = rows.into_iter().map(|(a, b)| vec![a, b]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
