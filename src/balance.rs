// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account balance and outstanding sum reconciliation.
//!
//! The balance stored on an account is a cache: `initial_balance` plus every
//! transaction accepted by [`should_include_in_balance`]. Store mutations
//! that can move it reset it to `NULL`; [`ensure_balance`] fills it back in.

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::LedgerResult;
use crate::models::{
    Account, AccountId, AccountType, DataCorruptionWarning, Transaction, TransactionType, UserId,
};
use crate::settings;
use crate::store::{Loaded, accounts, transactions};
use crate::utils::{month_end, round_money};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Pending means either flagged by the bank or not yet effective.
pub fn is_pending(tx: &Transaction, today: NaiveDate) -> bool {
    tx.pending || tx.effective_date() > today
}

/// Deferred card spending shows up on the checking account as one monthly
/// settlement debit; the individual card lines only count on the card itself.
fn is_settled_elsewhere(tx: &Transaction, account_type: AccountType) -> bool {
    tx.r#type == TransactionType::DeferredCard && account_type != AccountType::Card
}

pub fn should_include_in_balance(
    tx: &Transaction,
    today: NaiveDate,
    account_type: AccountType,
) -> bool {
    if is_settled_elsewhere(tx, account_type) {
        return false;
    }
    if is_pending(tx, today) {
        return account_type.balance_is_forward_looking();
    }
    true
}

/// Never true for a transaction that [`should_include_in_balance`] accepts.
pub fn should_include_in_outstanding_sum(
    tx: &Transaction,
    today: NaiveDate,
    account_type: AccountType,
    limit_to_current_month: bool,
) -> bool {
    if is_settled_elsewhere(tx, account_type) || !is_pending(tx, today) {
        return false;
    }
    if should_include_in_balance(tx, today, account_type) {
        return false;
    }
    if limit_to_current_month {
        return match month_end(today.year(), today.month()) {
            Some(end) => tx.effective_date() <= end,
            None => false,
        };
    }
    true
}

fn resolve_type(account: &Account) -> AccountType {
    let t = account.account_type();
    if t == AccountType::Unknown {
        tracing::warn!(
            account_id = account.id,
            account_type = %account.r#type,
            "unrecognized account type, pending transactions are left out of the balance"
        );
    }
    t
}

/// `offset` plus the included amounts, rounded to the account currency's
/// minor unit. Pure: the cached balance is not read or written.
pub fn compute_balance(
    account: &Account,
    transactions: &[Transaction],
    today: NaiveDate,
    offset: Decimal,
) -> Decimal {
    let account_type = resolve_type(account);
    let sum: Decimal = transactions
        .iter()
        .filter(|tx| should_include_in_balance(tx, today, account_type))
        .map(|tx| tx.amount)
        .sum();
    round_money(offset + sum, &account.currency)
}

pub fn compute_outstanding_sum(
    account: &Account,
    transactions: &[Transaction],
    today: NaiveDate,
    limit_to_current_month: bool,
) -> Decimal {
    let account_type = resolve_type(account);
    let sum: Decimal = transactions
        .iter()
        .filter(|tx| {
            should_include_in_outstanding_sum(tx, today, account_type, limit_to_current_month)
        })
        .map(|tx| tx.amount)
        .sum();
    round_money(sum, &account.currency)
}

/// Computes the balance of already loaded rows and writes it to the cache.
fn persist_computed(
    conn: &Connection,
    account: &Account,
    loaded: &Loaded<Transaction>,
    today: NaiveDate,
) -> LedgerResult<Decimal> {
    let balance = compute_balance(account, &loaded.rows, today, account.initial_balance);
    accounts::update_account_balance(conn, account.user_id, account.id, Some(balance))?;
    tracing::info!(
        account_id = account.id,
        %balance,
        included = loaded.rows.len(),
        skipped = loaded.corrupt.len(),
        "recomputed balance"
    );
    Ok(balance)
}

/// Recomputes from the ledger and writes the cache. Runs on whatever
/// connection or open transaction it is handed.
fn recompute_in(
    conn: &Connection,
    account: &Account,
    today: NaiveDate,
) -> LedgerResult<(Decimal, Vec<DataCorruptionWarning>)> {
    let loaded = transactions::find_transactions_by_account(conn, account.user_id, account.id)?;
    let balance = persist_computed(conn, account, &loaded, today)?;
    Ok((balance, loaded.corrupt))
}

/// Returns the cached balance, recomputing and persisting it first if it is
/// stale. Read, recompute and write happen in one store transaction.
///
/// The warnings list the rows skipped by a recompute; a fresh cache reports
/// none.
pub fn ensure_balance(
    conn: &mut Connection,
    user_id: UserId,
    account_id: AccountId,
    today: NaiveDate,
) -> LedgerResult<(Decimal, Vec<DataCorruptionWarning>)> {
    let tx = conn.transaction()?;
    let account = accounts::get_account(&tx, user_id, account_id)?;
    if let Some(balance) = account.balance {
        return Ok((balance, Vec::new()));
    }
    let out = recompute_in(&tx, &account, today)?;
    tx.commit()?;
    Ok(out)
}

/// Recomputes and persists the balance even if the cache looks fresh.
pub fn recompute_balance(
    conn: &mut Connection,
    user_id: UserId,
    account_id: AccountId,
    today: NaiveDate,
) -> LedgerResult<(Decimal, Vec<DataCorruptionWarning>)> {
    let tx = conn.transaction()?;
    let account = accounts::get_account(&tx, user_id, account_id)?;
    let out = recompute_in(&tx, &account, today)?;
    tx.commit()?;
    Ok(out)
}

/// Marks the cached balance as stale.
pub fn invalidate_balance(
    conn: &Connection,
    user_id: UserId,
    account_id: AccountId,
) -> LedgerResult<()> {
    accounts::invalidate_balance(conn, user_id, account_id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    pub account_id: AccountId,
    pub label: String,
    pub account_type: AccountType,
    pub currency: String,
    pub balance: Decimal,
    pub outstanding_sum: Decimal,
    /// True when the cache was stale and had to be rebuilt.
    pub recomputed: bool,
    pub skipped: Vec<DataCorruptionWarning>,
}

/// Balance (ensured) and outstanding sum of one account, for display.
pub fn account_summary(
    conn: &mut Connection,
    user_id: UserId,
    account_id: AccountId,
    today: NaiveDate,
) -> LedgerResult<BalanceSummary> {
    let tx = conn.transaction()?;
    let prefs = settings::load(&tx, user_id)?;
    let account = accounts::get_account(&tx, user_id, account_id)?;
    let loaded = transactions::find_transactions_by_account(&tx, user_id, account_id)?;

    let (balance, recomputed) = match account.balance {
        Some(b) => (b, false),
        None => (persist_computed(&tx, &account, &loaded, today)?, true),
    };
    let outstanding_sum = compute_outstanding_sum(
        &account,
        &loaded.rows,
        today,
        prefs.outstanding_current_month_only,
    );
    tx.commit()?;

    Ok(BalanceSummary {
        account_id,
        account_type: account.account_type(),
        label: account.label,
        currency: account.currency,
        balance,
        outstanding_sum,
        recomputed,
        skipped: loaded.corrupt,
    })
}
