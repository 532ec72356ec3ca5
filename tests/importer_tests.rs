// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ledgerclip::models::{AccountId, UserId};
use ledgerclip::store::accounts::{self, NewAccount};
use ledgerclip::store::{categories, rules};
use ledgerclip::utils::user_id_for_login;
use ledgerclip::{balance, cli, commands::importer, db};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "date,label,amount,category,account,type,pending,custom_label,debit_date";

fn base_conn() -> (Connection, UserId, AccountId) {
    let conn = db::open_in_memory().unwrap();
    let user = user_id_for_login(&conn, "default").unwrap();
    let access = accounts::create_access(&conn, user, "demo-bank", "me", None).unwrap();
    let account = accounts::create_account(
        &conn,
        user,
        &NewAccount {
            access_id: access,
            label: "A1".into(),
            r#type: "checking".into(),
            currency: "USD".into(),
            initial_balance: Decimal::new(10000, 2),
            import_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        },
    )
    .unwrap();
    (conn, user, account)
}

fn csv_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

fn run_import(conn: &mut Connection, user: UserId, path: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(["ledgerclip", "import", "transactions", "--path", path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(conn, user, import_m)
    } else {
        panic!("no import subcommand");
    }
}

fn count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn importer_trims_cli_path_argument() {
    let (mut conn, user, _) = base_conn();
    let file = csv_file(&["2025-02-03,Shop,-5.00,,A1,card,,"]);
    let padded = format!("  {}  ", file.path().to_str().unwrap());
    run_import(&mut conn, user, &padded).unwrap();
    assert_eq!(count(&conn), 1);
}

#[test]
fn importer_applies_rewrite_even_with_category() {
    let (mut conn, user, _) = base_conn();
    let manual = categories::create_category(&conn, user, "ManualCat", None).unwrap();
    let rule_cat = categories::create_category(&conn, user, "RuleCat", None).unwrap();
    rules::create_rule(&conn, user, "(?i)original", Some(rule_cat), Some("Updated Store")).unwrap();

    let file = csv_file(&["2025-02-03,Original Shop,-20.00,ManualCat,A1,card,,"]);
    run_import(&mut conn, user, file.path().to_str().unwrap()).unwrap();

    let (label, raw_label, category_id, amount, created_by_user): (String, String, Option<i64>, String, bool) = conn
        .query_row(
            "SELECT label, raw_label, category_id, amount, created_by_user FROM transactions ORDER BY id DESC LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(label, "Updated Store");
    assert_eq!(raw_label, "Original Shop");
    assert_eq!(category_id, Some(manual));
    assert_eq!(amount, "-20.00");
    assert!(!created_by_user);
}

#[test]
fn importer_trims_fields_and_uses_rule_category() {
    let (mut conn, user, _) = base_conn();
    let cat = categories::create_category(&conn, user, "Shopping", None).unwrap();
    rules::create_rule(&conn, user, "(?i)original", Some(cat), None).unwrap();

    let file = csv_file(&["2025-02-03,  Original Shop  ,-20.00,, A1 , type.deferred_card , yes ,  memo text  "]);
    run_import(&mut conn, user, file.path().to_str().unwrap()).unwrap();

    let (label, category_id, kind, pending, custom): (String, Option<i64>, String, bool, Option<String>) = conn
        .query_row(
            "SELECT label, category_id, type, pending, custom_label FROM transactions",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(label, "Original Shop");
    assert_eq!(category_id, Some(cat));
    assert_eq!(kind, "deferred-card");
    assert!(pending);
    assert_eq!(custom.as_deref(), Some("memo text"));
}

#[test]
fn importer_rejects_invalid_date() {
    let (mut conn, user, _) = base_conn();
    let file = csv_file(&["2025-13-03,Shop,-5,,A1,card,,"]);
    let err = run_import(&mut conn, user, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid date '2025-13-03'"));
    assert_eq!(count(&conn), 0);
}

#[test]
fn importer_rejects_invalid_amount() {
    let (mut conn, user, _) = base_conn();
    let file = csv_file(&["2025-02-03,Shop,abc,,A1,card,,"]);
    let err = run_import(&mut conn, user, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("invalid amount for Shop"));
    assert_eq!(count(&conn), 0);
}

#[test]
fn importer_rolls_back_when_row_fails() {
    let (mut conn, user, _) = base_conn();
    let file = csv_file(&[
        "2025-02-03,Shop,-5.00,,A1,card,,",
        "2025-02-04,Other,-7.00,,Nowhere,card,,",
    ]);
    let err = run_import(&mut conn, user, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("Account 'Nowhere' not found"));
    assert_eq!(count(&conn), 0);
}

#[test]
fn importer_skips_rules_whose_pattern_no_longer_compiles() {
    let (mut conn, user, _) = base_conn();
    conn.execute(
        "INSERT INTO rules(user_id, pattern, category_id, label_rewrite) VALUES (?1, '(?P<', NULL, 'Broken')",
        params![user],
    )
    .unwrap();
    let file = csv_file(&["2025-02-03,Shop,-5.00,,A1,card,,"]);
    run_import(&mut conn, user, file.path().to_str().unwrap()).unwrap();

    let label: String = conn
        .query_row("SELECT label FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(label, "Shop");
}

#[test]
fn import_invalidates_balance_and_reports_duplicates() {
    let (mut conn, user, account) = base_conn();
    let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    balance::ensure_balance(&mut conn, user, account, today).unwrap();

    let file = csv_file(&[
        "2025-02-03 10:00,Coffee,-3.20,,A1,card,,",
        "2025-02-03 18:00,Coffee,-3.20,,A1,card,,",
        "2025-02-10,Salary,1000,,A1,transfer,,",
    ]);
    let summary = importer::import_transactions(&mut conn, user, file.path()).unwrap();
    assert_eq!(summary.imported, 3);
    assert_eq!(summary.accounts, vec![account]);
    assert_eq!(summary.duplicate_candidates, 1);

    assert_eq!(accounts::get_account(&conn, user, account).unwrap().balance, None);
    assert_eq!(
        balance::ensure_balance(&mut conn, user, account, today).unwrap().0,
        Decimal::new(109360, 2)
    );
}

#[test]
fn future_debit_date_keeps_import_out_of_checking_balance() {
    let (mut conn, user, account) = base_conn();
    let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let file = csv_file(&[
        "2025-02-27,Card settlement,-40.00,,A1,card,,,2025-03-31",
        "2025-03-01,Refund,5.00,,A1,transfer,,",
    ]);
    let summary = importer::import_transactions(&mut conn, user, file.path()).unwrap();
    assert_eq!(summary.imported, 2);

    let debit: Option<String> = conn
        .query_row(
            "SELECT debit_date FROM transactions WHERE raw_label='Card settlement'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(debit.as_deref(), Some("2025-03-31 00:00:00"));

    let (value, _) = balance::ensure_balance(&mut conn, user, account, today).unwrap();
    assert_eq!(value, Decimal::new(10500, 2));
    let summary = balance::account_summary(&mut conn, user, account, today).unwrap();
    assert_eq!(summary.outstanding_sum, Decimal::new(-4000, 2));
}

#[test]
fn unparseable_debit_date_aborts_the_import() {
    let (mut conn, user, _) = base_conn();
    let file = csv_file(&["2025-02-27,Shop,-4.00,,A1,card,,,end of month"]);
    let err = importer::import_transactions(&mut conn, user, file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("debit date"));
    assert_eq!(count(&conn), 0);
}
