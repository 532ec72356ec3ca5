// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use super::decimal_column;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Access, AccessId, Account, AccountId, UserId};

pub fn create_access(
    conn: &Connection,
    user_id: UserId,
    vendor: &str,
    login: &str,
    label: Option<&str>,
) -> LedgerResult<AccessId> {
    let vendor = vendor.trim();
    if vendor.is_empty() {
        return Err(LedgerError::validation("Access vendor cannot be empty"));
    }
    conn.execute(
        "INSERT INTO accesses(user_id, vendor, login, label) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, vendor, login.trim(), label],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_accesses(conn: &Connection, user_id: UserId) -> LedgerResult<Vec<Access>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, vendor, login, label FROM accesses WHERE user_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_id], |r| {
        Ok(Access {
            id: r.get(0)?,
            user_id: r.get(1)?,
            vendor: r.get(2)?,
            login: r.get(3)?,
            label: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Deletes the access together with its accounts and their transactions.
pub fn delete_access(conn: &Connection, user_id: UserId, access_id: AccessId) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM accesses WHERE user_id=?1 AND id=?2",
        params![user_id, access_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("access", access_id));
    }
    tracing::info!(user_id, access_id, "deleted access");
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub access_id: AccessId,
    pub label: String,
    pub r#type: String,
    pub currency: String,
    pub initial_balance: Decimal,
    pub import_date: NaiveDate,
}

pub fn create_account(
    conn: &Connection,
    user_id: UserId,
    account: &NewAccount,
) -> LedgerResult<AccountId> {
    let owned: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM accesses WHERE user_id=?1 AND id=?2",
            params![user_id, account.access_id],
            |r| r.get(0),
        )
        .optional()?;
    if owned.is_none() {
        return Err(LedgerError::not_found("access", account.access_id));
    }
    let label = account.label.trim();
    if label.is_empty() {
        return Err(LedgerError::validation("Account label cannot be empty"));
    }
    let currency = account.currency.trim().to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LedgerError::validation(format!(
            "Invalid currency code '{}'",
            account.currency
        )));
    }
    conn.execute(
        "INSERT INTO accounts(user_id, access_id, label, type, currency, initial_balance, import_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            account.access_id,
            label,
            account.r#type.trim(),
            currency,
            account.initial_balance.to_string(),
            account.import_date.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const ACCOUNT_COLUMNS: &str =
    "id, user_id, access_id, label, type, currency, initial_balance, import_date, balance";

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    let import_date: String = r.get(7)?;
    let import_date = NaiveDate::parse_from_str(import_date.trim(), "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
    })?;
    let id: AccountId = r.get(0)?;
    // A garbled cache is as good as a stale one.
    let balance = match r.get::<_, Option<rusqlite::types::Value>>(8)? {
        None => None,
        Some(v) => match super::decimal_from_value(&v) {
            Ok(d) => Some(d),
            Err(reason) => {
                tracing::warn!(account_id = id, %reason, "ignoring unreadable cached balance");
                None
            }
        },
    };
    Ok(Account {
        id,
        user_id: r.get(1)?,
        access_id: r.get(2)?,
        label: r.get(3)?,
        r#type: r.get(4)?,
        currency: r.get(5)?,
        initial_balance: decimal_column(r, 6)?,
        import_date,
        balance,
    })
}

pub fn get_account(conn: &Connection, user_id: UserId, account_id: AccountId) -> LedgerResult<Account> {
    conn.query_row(
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id=?1 AND id=?2"),
        params![user_id, account_id],
        account_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("account", account_id))
}

pub fn list_accounts(conn: &Connection, user_id: UserId) -> LedgerResult<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id=?1 ORDER BY label"
    ))?;
    let rows = stmt.query_map(params![user_id], account_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Writes the cached balance. `None` marks the account as needing a
/// recompute.
pub fn update_account_balance(
    conn: &Connection,
    user_id: UserId,
    account_id: AccountId,
    balance: Option<Decimal>,
) -> LedgerResult<()> {
    let n = conn.execute(
        "UPDATE accounts SET balance=?3 WHERE user_id=?1 AND id=?2",
        params![user_id, account_id, balance.map(|b| b.to_string())],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("account", account_id));
    }
    Ok(())
}

/// Marks the cached balance as stale.
pub fn invalidate_balance(conn: &Connection, user_id: UserId, account_id: AccountId) -> LedgerResult<()> {
    update_account_balance(conn, user_id, account_id, None)?;
    tracing::debug!(user_id, account_id, "invalidated balance");
    Ok(())
}

/// Deletes the account and, through the foreign key cascade, its transactions.
pub fn delete_account(conn: &Connection, user_id: UserId, account_id: AccountId) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM accounts WHERE user_id=?1 AND id=?2",
        params![user_id, account_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("account", account_id));
    }
    tracing::info!(user_id, account_id, "deleted account");
    Ok(())
}
