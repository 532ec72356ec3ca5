// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ledgerclip::db;
use ledgerclip::models::UserId;
use ledgerclip::settings::{self, Settings};
use ledgerclip::store::accounts;
use ledgerclip::utils::user_id_for_login;
use ledgerclip::{cli, commands};
use rusqlite::Connection;

#[test]
fn defaults_apply_when_nothing_is_stored() {
    let conn = db::open_in_memory().unwrap();
    let user = user_id_for_login(&conn, "dave").unwrap();
    assert_eq!(settings::load(&conn, user).unwrap(), Settings::default());
    assert_eq!(settings::get(&conn, user, settings::DUPLICATE_THRESHOLD).unwrap(), "24");
    assert_eq!(settings::get(&conn, user, settings::DEFAULT_CURRENCY).unwrap(), "EUR");
}

#[test]
fn threshold_must_be_a_non_negative_integer() {
    let conn = db::open_in_memory().unwrap();
    let user = user_id_for_login(&conn, "dave").unwrap();
    for bad in ["-1", "soon", "1.5", ""] {
        let err = settings::set(&conn, user, settings::DUPLICATE_THRESHOLD, bad).unwrap_err();
        assert!(err.is_validation(), "{bad} should be rejected");
    }
    assert_eq!(
        settings::set(&conn, user, settings::DUPLICATE_THRESHOLD, " 72 ").unwrap(),
        "72"
    );
    assert_eq!(settings::load(&conn, user).unwrap().duplicate_threshold.hours(), 72);
}

#[test]
fn settings_are_per_user() {
    let conn = db::open_in_memory().unwrap();
    let a = user_id_for_login(&conn, "a").unwrap();
    let b = user_id_for_login(&conn, "b").unwrap();
    settings::set(&conn, a, settings::DEFAULT_CURRENCY, "usd").unwrap();
    assert_eq!(settings::get(&conn, a, settings::DEFAULT_CURRENCY).unwrap(), "USD");
    assert_eq!(settings::get(&conn, b, settings::DEFAULT_CURRENCY).unwrap(), "EUR");
}

#[test]
fn unknown_keys_are_rejected() {
    let conn = db::open_in_memory().unwrap();
    let user = user_id_for_login(&conn, "dave").unwrap();
    assert!(settings::get(&conn, user, "colour").unwrap_err().is_validation());
    assert!(settings::set(&conn, user, "colour", "red").unwrap_err().is_validation());
}

#[test]
fn settings_set_command_accepts_negative_looking_values_then_rejects_them() {
    let conn = db::open_in_memory().unwrap();
    let user = user_id_for_login(&conn, "dave").unwrap();
    let matches = cli::build_cli().get_matches_from([
        "ledgerclip",
        "settings",
        "set",
        "--key",
        "duplicate-threshold",
        "--value",
        "-5",
    ]);
    if let Some(("settings", settings_m)) = matches.subcommand() {
        let err = commands::settings::handle(&conn, user, settings_m).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    } else {
        panic!("settings command not parsed");
    }
    assert_eq!(settings::get_raw(&conn, user, settings::DUPLICATE_THRESHOLD).unwrap(), None);
}

fn add_account(conn: &mut Connection, user: UserId, args: &[&str]) {
    let mut argv = vec!["ledgerclip", "account", "add"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("account", account_m)) = matches.subcommand() {
        commands::accounts::handle(conn, user, account_m).unwrap();
    } else {
        panic!("account command not parsed");
    }
}

#[test]
fn account_add_falls_back_to_default_currency() {
    let mut conn = db::open_in_memory().unwrap();
    let user = user_id_for_login(&conn, "dave").unwrap();
    let access = accounts::create_access(&conn, user, "demo-bank", "dave", None).unwrap();
    let access = access.to_string();

    add_account(&mut conn, user, &["--access", &access, "--label", "Fallback", "--type", "checking"]);
    settings::set(&conn, user, settings::DEFAULT_CURRENCY, "usd").unwrap();
    add_account(&mut conn, user, &["--access", &access, "--label", "Configured", "--type", "checking"]);
    add_account(
        &mut conn,
        user,
        &["--access", &access, "--label", "Explicit", "--type", "savings", "--currency", "gbp"],
    );

    let currencies: Vec<(String, String)> = accounts::list_accounts(&conn, user)
        .unwrap()
        .into_iter()
        .map(|a| (a.label, a.currency))
        .collect();
    assert!(currencies.contains(&("Fallback".to_string(), "EUR".to_string())));
    assert!(currencies.contains(&("Configured".to_string(), "USD".to_string())));
    assert!(currencies.contains(&("Explicit".to_string(), "GBP".to_string())));
}
