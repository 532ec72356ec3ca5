// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, params};

use crate::duplicates::DismissedPairs;
use crate::error::LedgerResult;
use crate::models::{TransactionId, UserId};

pub fn load_dismissed(conn: &Connection, user_id: UserId) -> LedgerResult<DismissedPairs> {
    let mut stmt = conn.prepare(
        "SELECT first_id, second_id FROM dismissed_duplicates WHERE user_id=?1",
    )?;
    let rows = stmt.query_map(params![user_id], |r| {
        Ok((r.get::<_, TransactionId>(0)?, r.get::<_, TransactionId>(1)?))
    })?;
    let mut pairs = DismissedPairs::default();
    for row in rows {
        let (a, b) = row?;
        pairs.insert(a, b);
    }
    Ok(pairs)
}

/// Stores a "not a duplicate" verdict. Returns false if it was already known.
pub fn insert_dismissal(
    conn: &Connection,
    user_id: UserId,
    a: TransactionId,
    b: TransactionId,
) -> LedgerResult<bool> {
    let (first, second) = if a < b { (a, b) } else { (b, a) };
    let n = conn.execute(
        "INSERT OR IGNORE INTO dismissed_duplicates(user_id, first_id, second_id) VALUES (?1,?2,?3)",
        params![user_id, first, second],
    )?;
    Ok(n > 0)
}
