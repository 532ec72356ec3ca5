// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-user settings consumed by the consistency engine.

use rusqlite::{Connection, OptionalExtension, params};

use crate::duplicates::DuplicateThreshold;
use crate::error::{LedgerError, LedgerResult};
use crate::models::UserId;

pub const DUPLICATE_THRESHOLD: &str = "duplicate-threshold";
pub const DUPLICATE_IGNORE_CUSTOM_FIELDS: &str = "duplicate-ignore-custom-fields";
pub const OUTSTANDING_CURRENT_MONTH_ONLY: &str = "outstanding-current-month-only";
pub const DEFAULT_CURRENCY: &str = "default-currency";

pub const KEYS: [&str; 4] = [
    DUPLICATE_THRESHOLD,
    DUPLICATE_IGNORE_CUSTOM_FIELDS,
    OUTSTANDING_CURRENT_MONTH_ONLY,
    DEFAULT_CURRENCY,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub duplicate_threshold: DuplicateThreshold,
    pub duplicate_ignore_custom_fields: bool,
    pub outstanding_current_month_only: bool,
    pub default_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            duplicate_threshold: DuplicateThreshold::from_hours(24),
            duplicate_ignore_custom_fields: false,
            outstanding_current_month_only: false,
            default_currency: "EUR".to_string(),
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> LedgerResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(LedgerError::validation(format!(
            "Setting '{}' expects a boolean, got '{}'",
            key, raw
        ))),
    }
}

fn parse_currency(raw: &str) -> LedgerResult<String> {
    let ccy = raw.trim().to_ascii_uppercase();
    if ccy.len() == 3 && ccy.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(ccy)
    } else {
        Err(LedgerError::validation(format!(
            "Setting '{}' expects an ISO currency code, got '{}'",
            DEFAULT_CURRENCY, raw
        )))
    }
}

/// Validates a raw value for `key` and returns its canonical text form.
fn normalize(key: &str, raw: &str) -> LedgerResult<String> {
    match key {
        DUPLICATE_THRESHOLD => Ok(DuplicateThreshold::parse(raw)?.hours().to_string()),
        DUPLICATE_IGNORE_CUSTOM_FIELDS | OUTSTANDING_CURRENT_MONTH_ONLY => {
            Ok(parse_bool(key, raw)?.to_string())
        }
        DEFAULT_CURRENCY => parse_currency(raw),
        _ => Err(unknown_key(key)),
    }
}

fn unknown_key(key: &str) -> LedgerError {
    LedgerError::validation(format!(
        "Unknown setting '{}' (known: {})",
        key,
        KEYS.join(", ")
    ))
}

pub fn get_raw(conn: &Connection, user_id: UserId, key: &str) -> LedgerResult<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM settings WHERE user_id=?1 AND key=?2",
            params![user_id, key],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn set(conn: &Connection, user_id: UserId, key: &str, value: &str) -> LedgerResult<String> {
    let value = normalize(key, value)?;
    conn.execute(
        "INSERT INTO settings(user_id, key, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, key) DO UPDATE SET value=excluded.value",
        params![user_id, key, value],
    )?;
    tracing::info!(user_id, key, value = %value, "updated setting");
    Ok(value)
}

/// Effective value of one setting, default included.
pub fn get(conn: &Connection, user_id: UserId, key: &str) -> LedgerResult<String> {
    if !KEYS.contains(&key) {
        return Err(unknown_key(key));
    }
    let s = load(conn, user_id)?;
    match key {
        DUPLICATE_THRESHOLD => Ok(s.duplicate_threshold.hours().to_string()),
        DUPLICATE_IGNORE_CUSTOM_FIELDS => Ok(s.duplicate_ignore_custom_fields.to_string()),
        OUTSTANDING_CURRENT_MONTH_ONLY => Ok(s.outstanding_current_month_only.to_string()),
        _ => Ok(s.default_currency),
    }
}

/// Reads every setting of the user, falling back to defaults. A stored value
/// that no longer validates is reported, not silently replaced.
pub fn load(conn: &Connection, user_id: UserId) -> LedgerResult<Settings> {
    let mut s = Settings::default();
    if let Some(raw) = get_raw(conn, user_id, DUPLICATE_THRESHOLD)? {
        s.duplicate_threshold = DuplicateThreshold::parse(&raw)?;
    }
    if let Some(raw) = get_raw(conn, user_id, DUPLICATE_IGNORE_CUSTOM_FIELDS)? {
        s.duplicate_ignore_custom_fields = parse_bool(DUPLICATE_IGNORE_CUSTOM_FIELDS, &raw)?;
    }
    if let Some(raw) = get_raw(conn, user_id, OUTSTANDING_CURRENT_MONTH_ONLY)? {
        s.outstanding_current_month_only = parse_bool(OUTSTANDING_CURRENT_MONTH_ONLY, &raw)?;
    }
    if let Some(raw) = get_raw(conn, user_id, DEFAULT_CURRENCY)? {
        s.default_currency = parse_currency(&raw)?;
    }
    Ok(s)
}
