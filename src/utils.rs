// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{AccountId, CategoryId, UserId};

/// Storage format for date-times; same shape as SQLite's `datetime()`.
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Lenient date-time decoding used for both user input and stored rows.
///
/// A bare date is read as midnight.
pub fn parse_stored_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in [DATETIME_FMT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    parse_stored_datetime(s)
        .ok_or_else(|| anyhow!("Invalid date '{}', expected YYYY-MM-DD[ HH:MM[:SS]]", s))
}

pub fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// Parses `YYYY-MM` into (year, month).
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let d = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((d.year(), d.month()))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Number of minor-unit digits for an ISO 4217 currency code.
pub fn minor_units(ccy: &str) -> u32 {
    match ccy.trim().to_ascii_uppercase().as_str() {
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX"
        | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        _ => 2,
    }
}

/// Rounds to the currency's minor unit, half-up (midpoint away from zero).
pub fn round_money(d: Decimal, ccy: &str) -> Decimal {
    d.round_dp_with_strategy(minor_units(ccy), RoundingStrategy::MidpointAwayFromZero)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    let dp = minor_units(ccy);
    let mut v = round_money(*d, ccy);
    v.rescale(dp);
    format!("{} {}", v, ccy)
}

/// Last calendar day of the given month.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Value of a required string argument.
pub fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.as_str())
        .with_context(|| format!("Missing --{}", name))
}

pub fn id_for_account(conn: &Connection, user_id: UserId, label: &str) -> Result<AccountId> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE user_id=?1 AND label=?2")?;
    let id: AccountId = stmt
        .query_row(params![user_id, label.trim()], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", label))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, user_id: UserId, label: &str) -> Result<CategoryId> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE user_id=?1 AND label=?2")?;
    let id: CategoryId = stmt
        .query_row(params![user_id, label.trim()], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", label))?;
    Ok(id)
}

/// Looks up a user by login, creating it on first use.
pub fn user_id_for_login(conn: &Connection, login: &str) -> Result<UserId> {
    let login = login.trim();
    if login.is_empty() {
        return Err(anyhow!("User login cannot be empty"));
    }
    let existing: Option<UserId> = conn
        .query_row("SELECT id FROM users WHERE login=?1", params![login], |r| {
            r.get(0)
        })
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute("INSERT INTO users(login) VALUES (?1)", params![login])?;
    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, login, "created user");
    Ok(id)
}
