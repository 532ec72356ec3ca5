// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger store: user-scoped record access over SQLite.
//!
//! Every function takes a `&Connection`, so it can run standalone or inside an
//! open `rusqlite::Transaction` (which derefs to `Connection`). Multi-row
//! operations that must be atomic open their transaction one level up.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod dismissals;
pub mod rules;
pub mod transactions;

use rusqlite::Connection;
use rusqlite::types::{Type, Value};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::LedgerResult;
use crate::models::DataCorruptionWarning;

/// Rows decoded from the store, plus the rows that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub corrupt: Vec<DataCorruptionWarning>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Loaded {
            rows: Vec::new(),
            corrupt: Vec::new(),
        }
    }
}

/// Runs `f` inside a savepoint: all of its writes land, or none do.
///
/// Outside a transaction the savepoint opens and commits one; inside an open
/// `rusqlite::Transaction` it nests, and the outer commit still decides.
pub(crate) fn atomically<T>(
    conn: &Connection,
    name: &str,
    f: impl FnOnce(&Connection) -> LedgerResult<T>,
) -> LedgerResult<T> {
    conn.execute_batch(&format!("SAVEPOINT {name}"))?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name}"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}")) {
                tracing::warn!(savepoint = name, %rollback, "rollback to savepoint failed");
            }
            Err(err)
        }
    }
}

/// Decodes a stored amount without ever going through binary float
/// arithmetic. REAL cells written by foreign tools are read back through their
/// shortest decimal representation.
pub(crate) fn decimal_from_value(v: &Value) -> Result<Decimal, String> {
    match v {
        Value::Text(s) => {
            Decimal::from_str(s.trim()).map_err(|e| format!("unparseable amount '{}': {}", s, e))
        }
        Value::Integer(i) => Ok(Decimal::from(*i)),
        Value::Real(f) if f.is_finite() => Decimal::from_str(&f.to_string())
            .or_else(|_| Decimal::from_scientific(&format!("{:e}", f)))
            .map_err(|e| format!("unrepresentable amount {}: {}", f, e)),
        Value::Real(f) => Err(format!("non-finite amount {}", f)),
        Value::Null => Err("missing amount".to_string()),
        Value::Blob(_) => Err("amount stored as blob".to_string()),
    }
}

/// Strict decimal column read for account-level fields. A bad value here is a
/// store error, not a skippable row.
pub(crate) fn decimal_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let v: Value = row.get(idx)?;
    decimal_from_value(&v).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::<dyn std::error::Error + Send + Sync>::from(e),
        )
    })
}
