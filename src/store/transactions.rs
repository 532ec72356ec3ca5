// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::{Loaded, accounts, atomically, categories, decimal_from_value};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AccountId, CategoryId, DataCorruptionWarning, NewTransaction, Transaction, TransactionId,
    TransactionType, UserId,
};
use crate::utils::{fmt_datetime, parse_stored_datetime};

const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, category_id, type, label, raw_label, \
     custom_label, date, debit_date, amount, created_by_user, pending";

type Decoded = Result<Transaction, DataCorruptionWarning>;

/// Decodes one row. Column-type errors are store errors; unparseable
/// dates and amounts become a [`DataCorruptionWarning`] for the row.
fn decode_row(r: &Row<'_>) -> rusqlite::Result<Decoded> {
    let id: TransactionId = r.get(0)?;
    let corrupt = |reason: String| DataCorruptionWarning {
        transaction_id: id,
        reason,
    };

    let date = match r.get::<_, Value>(8)? {
        Value::Text(s) => match parse_stored_datetime(&s) {
            Some(dt) => dt,
            None => return Ok(Err(corrupt(format!("unparseable date '{}'", s)))),
        },
        other => return Ok(Err(corrupt(format!("date has unexpected type {:?}", other.data_type())))),
    };
    let debit_date = match r.get::<_, Value>(9)? {
        Value::Null => None,
        Value::Text(s) if s.trim().is_empty() => None,
        Value::Text(s) => match parse_stored_datetime(&s) {
            Some(dt) => Some(dt),
            None => return Ok(Err(corrupt(format!("unparseable debit date '{}'", s)))),
        },
        other => {
            return Ok(Err(corrupt(format!(
                "debit date has unexpected type {:?}",
                other.data_type()
            ))));
        }
    };
    let amount = match decimal_from_value(&r.get::<_, Value>(10)?) {
        Ok(a) => a,
        Err(reason) => return Ok(Err(corrupt(reason))),
    };
    let type_raw: String = r.get(4)?;

    Ok(Ok(Transaction {
        id,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        category_id: r.get(3)?,
        r#type: TransactionType::parse(&type_raw),
        label: r.get(5)?,
        raw_label: r.get(6)?,
        custom_label: r.get(7)?,
        date,
        debit_date,
        amount,
        created_by_user: r.get(11)?,
        pending: r.get(12)?,
    }))
}

fn load(conn: &Connection, sql: &str, args: &[Value]) -> LedgerResult<Loaded<Transaction>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), decode_row)?;
    let mut loaded = Loaded::default();
    for row in rows {
        match row? {
            Ok(tx) => loaded.rows.push(tx),
            Err(warning) => {
                tracing::warn!(
                    transaction_id = warning.transaction_id,
                    reason = %warning.reason,
                    "skipping corrupt transaction row"
                );
                loaded.corrupt.push(warning);
            }
        }
    }
    Ok(loaded)
}

/// All transactions of one account, ordered by date then id.
pub fn find_transactions_by_account(
    conn: &Connection,
    user_id: UserId,
    account_id: AccountId,
) -> LedgerResult<Loaded<Transaction>> {
    load(
        conn,
        &format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE user_id=?1 AND account_id=?2 ORDER BY date, id"
        ),
        &[Value::Integer(user_id), Value::Integer(account_id)],
    )
}

/// Transactions filed under a category; `None` selects uncategorized ones.
pub fn find_transactions_by_category(
    conn: &Connection,
    user_id: UserId,
    category_id: Option<CategoryId>,
) -> LedgerResult<Loaded<Transaction>> {
    match category_id {
        Some(cid) => load(
            conn,
            &format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions
                 WHERE user_id=?1 AND category_id=?2 ORDER BY date, id"
            ),
            &[Value::Integer(user_id), Value::Integer(cid)],
        ),
        None => load(
            conn,
            &format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions
                 WHERE user_id=?1 AND category_id IS NULL ORDER BY date, id"
            ),
            &[Value::Integer(user_id)],
        ),
    }
}

/// Every transaction of the user, newest first, optionally capped.
pub fn find_transactions_for_user(
    conn: &Connection,
    user_id: UserId,
    limit: Option<usize>,
) -> LedgerResult<Loaded<Transaction>> {
    let mut sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id=?1 ORDER BY date DESC, id DESC"
    );
    let mut args = vec![Value::Integer(user_id)];
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?2");
        args.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }
    load(conn, &sql, &args)
}

pub fn get_transaction(
    conn: &Connection,
    user_id: UserId,
    transaction_id: TransactionId,
) -> LedgerResult<Transaction> {
    let decoded = conn
        .query_row(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id=?1 AND id=?2"),
            params![user_id, transaction_id],
            decode_row,
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found("transaction", transaction_id))?;
    decoded.map_err(|w| LedgerError::validation(format!("Transaction is corrupt: {}", w)))
}

pub fn transaction_exists(
    conn: &Connection,
    user_id: UserId,
    transaction_id: TransactionId,
) -> LedgerResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM transactions WHERE user_id=?1 AND id=?2",
            params![user_id, transaction_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Inserts a transaction and marks the owning account's balance as stale.
pub fn insert_transaction(
    conn: &Connection,
    user_id: UserId,
    tx: &NewTransaction,
) -> LedgerResult<TransactionId> {
    // Ownership checks; the account check also guarantees invalidation below
    // hits a row.
    accounts::get_account(conn, user_id, tx.account_id)?;
    if let Some(cid) = tx.category_id {
        categories::ensure_category(conn, user_id, cid)?;
    }
    let custom_label = tx
        .custom_label
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let id = atomically(conn, "insert_transaction", |conn| {
        conn.execute(
            "INSERT INTO transactions(user_id, account_id, category_id, type, label, raw_label,
                 custom_label, date, debit_date, amount, created_by_user, pending)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                user_id,
                tx.account_id,
                tx.category_id,
                tx.r#type.as_str(),
                tx.label,
                tx.raw_label,
                custom_label,
                fmt_datetime(&tx.date),
                tx.debit_date.as_ref().map(fmt_datetime),
                tx.amount.to_string(),
                tx.created_by_user,
                tx.pending,
            ],
        )?;
        let id = conn.last_insert_rowid();
        accounts::invalidate_balance(conn, user_id, tx.account_id)?;
        Ok(id)
    })?;
    tracing::debug!(user_id, transaction_id = id, account_id = tx.account_id, "inserted transaction");
    Ok(id)
}

/// Files one transaction under another category (or none). Amounts are
/// untouched, so balances stay valid.
pub fn set_transaction_category(
    conn: &Connection,
    user_id: UserId,
    transaction_id: TransactionId,
    category_id: Option<CategoryId>,
) -> LedgerResult<()> {
    if let Some(cid) = category_id {
        categories::ensure_category(conn, user_id, cid)?;
    }
    let n = conn.execute(
        "UPDATE transactions SET category_id=?3 WHERE user_id=?1 AND id=?2",
        params![user_id, transaction_id, category_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("transaction", transaction_id));
    }
    Ok(())
}

/// Sets or clears the user's own label. Blank labels clear it.
pub fn set_custom_label(
    conn: &Connection,
    user_id: UserId,
    transaction_id: TransactionId,
    custom_label: Option<&str>,
) -> LedgerResult<()> {
    let custom_label = custom_label.map(str::trim).filter(|s| !s.is_empty());
    let n = conn.execute(
        "UPDATE transactions SET custom_label=?3 WHERE user_id=?1 AND id=?2",
        params![user_id, transaction_id, custom_label],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("transaction", transaction_id));
    }
    Ok(())
}

/// Moves a manually created transaction to another date. Imported
/// transactions keep the bank's date.
pub fn set_transaction_date(
    conn: &Connection,
    user_id: UserId,
    transaction_id: TransactionId,
    date: NaiveDateTime,
) -> LedgerResult<()> {
    let (account_id, created_by_user): (AccountId, bool) = conn
        .query_row(
            "SELECT account_id, created_by_user FROM transactions WHERE user_id=?1 AND id=?2",
            params![user_id, transaction_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found("transaction", transaction_id))?;
    if !created_by_user {
        return Err(LedgerError::validation(format!(
            "Transaction {} was imported; only manually created transactions can be re-dated",
            transaction_id
        )));
    }
    atomically(conn, "set_transaction_date", |conn| {
        conn.execute(
            "UPDATE transactions SET date=?3 WHERE user_id=?1 AND id=?2",
            params![user_id, transaction_id, fmt_datetime(&date)],
        )?;
        accounts::invalidate_balance(conn, user_id, account_id)
    })
}

/// Re-points every transaction filed under `from` to `to`. Returns the
/// number of rows moved.
pub fn reassign_category(
    conn: &Connection,
    user_id: UserId,
    from: CategoryId,
    to: Option<CategoryId>,
) -> LedgerResult<usize> {
    Ok(conn.execute(
        "UPDATE transactions SET category_id=?3 WHERE user_id=?1 AND category_id=?2",
        params![user_id, from, to],
    )?)
}

/// Counts transactions whose category no longer exists.
pub fn count_orphaned(conn: &Connection, user_id: UserId) -> LedgerResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM transactions t
         WHERE t.user_id=?1 AND t.category_id IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM categories c WHERE c.id=t.category_id AND c.user_id=t.user_id)",
        params![user_id],
        |r| r.get(0),
    )?)
}
