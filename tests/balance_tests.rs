// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use ledgerclip::balance;
use ledgerclip::db;
use ledgerclip::models::{AccountId, NewTransaction, TransactionType, UserId};
use ledgerclip::settings;
use ledgerclip::store::accounts::{self, NewAccount};
use ledgerclip::store::transactions;
use ledgerclip::utils::user_id_for_login;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::str::FromStr;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn at(y: i32, m: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, day)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn setup(kind: &str) -> (Connection, UserId, AccountId) {
    let conn = db::open_in_memory().unwrap();
    let user = user_id_for_login(&conn, "alice").unwrap();
    let access = accounts::create_access(&conn, user, "demo-bank", "alice", None).unwrap();
    let account = accounts::create_account(
        &conn,
        user,
        &NewAccount {
            access_id: access,
            label: "Main".into(),
            r#type: kind.into(),
            currency: "EUR".into(),
            initial_balance: d("100.00"),
            import_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        },
    )
    .unwrap();
    (conn, user, account)
}

fn add(conn: &Connection, user: UserId, account: AccountId, date: NaiveDateTime, amount: &str) -> i64 {
    let mut tx = NewTransaction::manual(account, date, d(amount), "entry");
    tx.created_by_user = false;
    tx.r#type = TransactionType::Card;
    transactions::insert_transaction(conn, user, &tx).unwrap()
}

fn cached(conn: &Connection, account: AccountId) -> Option<String> {
    conn.query_row(
        "SELECT balance FROM accounts WHERE id=?1",
        params![account],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn future_debit_stays_out_of_checking_balance() {
    let (mut conn, user, account) = setup("checking");
    add(&conn, user, account, at(2025, 3, 1), "50.00");
    add(&conn, user, account, at(2025, 3, 20), "-20.00");

    let summary = balance::account_summary(&mut conn, user, account, today()).unwrap();
    assert_eq!(summary.balance, d("150.00"));
    assert_eq!(summary.outstanding_sum, d("-20.00"));
    assert!(summary.recomputed);
    assert!(summary.skipped.is_empty());
}

#[test]
fn card_balance_counts_future_spending() {
    let (mut conn, user, account) = setup("card");
    add(&conn, user, account, at(2025, 3, 1), "-30.00");
    add(&conn, user, account, at(2025, 3, 20), "-20.00");

    let summary = balance::account_summary(&mut conn, user, account, today()).unwrap();
    assert_eq!(summary.balance, d("50.00"));
    assert_eq!(summary.outstanding_sum, Decimal::ZERO);
}

#[test]
fn ensure_balance_is_cached_and_idempotent() {
    let (mut conn, user, account) = setup("checking");
    add(&conn, user, account, at(2025, 2, 1), "-12.34");
    assert_eq!(cached(&conn, account), None);

    let (first, skipped) = balance::ensure_balance(&mut conn, user, account, today()).unwrap();
    assert_eq!(first, d("87.66"));
    assert!(skipped.is_empty());
    assert_eq!(cached(&conn, account).map(|s| d(&s)), Some(d("87.66")));

    let (second, _) = balance::ensure_balance(&mut conn, user, account, today()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn insert_invalidates_cached_balance() {
    let (mut conn, user, account) = setup("checking");
    balance::ensure_balance(&mut conn, user, account, today()).unwrap();
    assert!(cached(&conn, account).is_some());

    add(&conn, user, account, at(2025, 2, 3), "5");
    assert_eq!(cached(&conn, account), None);
    let (value, _) = balance::ensure_balance(&mut conn, user, account, today()).unwrap();
    assert_eq!(value, d("105.00"));
}

#[test]
fn redating_manual_transaction_invalidates_and_moves_it() {
    let (mut conn, user, account) = setup("checking");
    let tx = NewTransaction::manual(account, at(2025, 3, 1), d("-40"), "rent");
    let id = transactions::insert_transaction(&conn, user, &tx).unwrap();
    assert_eq!(
        balance::ensure_balance(&mut conn, user, account, today()).unwrap().0,
        d("60.00")
    );

    transactions::set_transaction_date(&conn, user, id, at(2025, 4, 1)).unwrap();
    assert_eq!(cached(&conn, account), None);
    assert_eq!(
        balance::ensure_balance(&mut conn, user, account, today()).unwrap().0,
        d("100.00")
    );
}

#[test]
fn imported_transaction_cannot_be_redated() {
    let (conn, user, account) = setup("checking");
    let id = add(&conn, user, account, at(2025, 3, 1), "-1");
    let err = transactions::set_transaction_date(&conn, user, id, at(2025, 3, 2)).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn corrupt_rows_are_skipped_and_reported() {
    let (mut conn, user, account) = setup("checking");
    add(&conn, user, account, at(2025, 3, 1), "10");
    let bad = add(&conn, user, account, at(2025, 3, 2), "20");
    conn.execute(
        "UPDATE transactions SET amount='twenty' WHERE id=?1",
        params![bad],
    )
    .unwrap();

    let (value, skipped) = balance::recompute_balance(&mut conn, user, account, today()).unwrap();
    assert_eq!(value, d("110.00"));
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].transaction_id, bad);
}

#[test]
fn ensure_balance_reports_rows_skipped_by_recompute() {
    let (mut conn, user, account) = setup("checking");
    let bad = add(&conn, user, account, at(2025, 3, 2), "20");
    conn.execute(
        "UPDATE transactions SET amount='twenty' WHERE id=?1",
        params![bad],
    )
    .unwrap();

    let (value, skipped) = balance::ensure_balance(&mut conn, user, account, today()).unwrap();
    assert_eq!(value, d("100.00"));
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].transaction_id, bad);

    let (_, again) = balance::ensure_balance(&mut conn, user, account, today()).unwrap();
    assert!(again.is_empty());
}

fn lock_balance(conn: &Connection) {
    conn.execute_batch(
        "CREATE TRIGGER lock_balance BEFORE UPDATE OF balance ON accounts
         BEGIN SELECT RAISE(ABORT, 'balance locked'); END;",
    )
    .unwrap();
}

#[test]
fn redating_rolls_back_when_invalidation_fails() {
    let (conn, user, account) = setup("checking");
    let tx = NewTransaction::manual(account, at(2025, 3, 1), d("-40"), "rent");
    let id = transactions::insert_transaction(&conn, user, &tx).unwrap();
    accounts::update_account_balance(&conn, user, account, Some(d("1"))).unwrap();
    lock_balance(&conn);

    assert!(transactions::set_transaction_date(&conn, user, id, at(2025, 4, 1)).is_err());
    assert_eq!(transactions::get_transaction(&conn, user, id).unwrap().date, at(2025, 3, 1));
    assert_eq!(cached(&conn, account).map(|s| d(&s)), Some(d("1")));
    assert!(conn.is_autocommit());
}

#[test]
fn insert_rolls_back_when_invalidation_fails() {
    let (conn, user, account) = setup("checking");
    add(&conn, user, account, at(2025, 3, 1), "-5");
    accounts::update_account_balance(&conn, user, account, Some(d("1"))).unwrap();
    lock_balance(&conn);

    let tx = NewTransaction::manual(account, at(2025, 3, 2), d("-40"), "rent");
    assert!(transactions::insert_transaction(&conn, user, &tx).is_err());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(cached(&conn, account).map(|s| d(&s)), Some(d("1")));
}

#[test]
fn insert_inside_open_transaction_defers_to_outer_commit() {
    let (mut conn, user, account) = setup("checking");
    {
        let outer = conn.transaction().unwrap();
        let tx = NewTransaction::manual(account, at(2025, 3, 2), d("-40"), "rent");
        transactions::insert_transaction(&outer, user, &tx).unwrap();
        // dropped without commit
    }
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn explicit_invalidation_forces_recompute() {
    let (mut conn, user, account) = setup("savings");
    balance::ensure_balance(&mut conn, user, account, today()).unwrap();
    assert!(cached(&conn, account).is_some());
    balance::invalidate_balance(&conn, user, account).unwrap();
    assert_eq!(cached(&conn, account), None);
}

#[test]
fn outstanding_sum_can_be_limited_to_current_month() {
    let (mut conn, user, account) = setup("checking");
    add(&conn, user, account, at(2025, 3, 25), "-10");
    add(&conn, user, account, at(2025, 4, 5), "-7");

    let all = balance::account_summary(&mut conn, user, account, today()).unwrap();
    assert_eq!(all.outstanding_sum, d("-17"));

    settings::set(&conn, user, settings::OUTSTANDING_CURRENT_MONTH_ONLY, "true").unwrap();
    let limited = balance::account_summary(&mut conn, user, account, today()).unwrap();
    assert_eq!(limited.outstanding_sum, d("-10"));
    assert_eq!(limited.balance, d("100"));
}

#[test]
fn unknown_account_is_not_found() {
    let (mut conn, user, _) = setup("checking");
    let err = balance::ensure_balance(&mut conn, user, 9_999, today()).unwrap_err();
    assert!(err.is_not_found());
}
