// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;

use super::{categories, decimal_column};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Budget, BudgetId, CategoryId, UserId};

/// Creates or replaces the threshold for one category and month.
pub fn set_budget(
    conn: &Connection,
    user_id: UserId,
    category_id: CategoryId,
    year: i32,
    month: u32,
    threshold: Decimal,
) -> LedgerResult<BudgetId> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::validation(format!("Invalid month {}", month)));
    }
    categories::ensure_category(conn, user_id, category_id)?;
    conn.execute(
        "INSERT INTO budgets(user_id, category_id, year, month, threshold) VALUES (?1,?2,?3,?4,?5)
         ON CONFLICT(user_id, category_id, year, month) DO UPDATE SET threshold=excluded.threshold",
        params![user_id, category_id, year, month, threshold.to_string()],
    )?;
    Ok(conn.query_row(
        "SELECT id FROM budgets WHERE user_id=?1 AND category_id=?2 AND year=?3 AND month=?4",
        params![user_id, category_id, year, month],
        |r| r.get(0),
    )?)
}

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        user_id: r.get(1)?,
        category_id: r.get(2)?,
        year: r.get(3)?,
        month: r.get(4)?,
        threshold: decimal_column(r, 5)?,
    })
}

/// Budgets of the user, optionally restricted to one (year, month).
pub fn list_budgets(
    conn: &Connection,
    user_id: UserId,
    period: Option<(i32, u32)>,
) -> LedgerResult<Vec<Budget>> {
    let base = "SELECT id, user_id, category_id, year, month, threshold FROM budgets WHERE user_id=?1";
    let out = match period {
        Some((y, m)) => {
            let mut stmt =
                conn.prepare(&format!("{base} AND year=?2 AND month=?3 ORDER BY category_id"))?;
            let rows = stmt.query_map(params![user_id, y, m], budget_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{base} ORDER BY year DESC, month DESC, category_id"
            ))?;
            let rows = stmt.query_map(params![user_id], budget_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(out)
}

pub fn find_budgets_by_category(
    conn: &Connection,
    user_id: UserId,
    category_id: CategoryId,
) -> LedgerResult<Vec<Budget>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, category_id, year, month, threshold FROM budgets
         WHERE user_id=?1 AND category_id=?2 ORDER BY year, month",
    )?;
    let rows = stmt.query_map(params![user_id, category_id], budget_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Removes every budget targeting the category. Returns how many went away.
pub fn delete_budgets_for_category(
    conn: &Connection,
    user_id: UserId,
    category_id: CategoryId,
) -> LedgerResult<usize> {
    Ok(conn.execute(
        "DELETE FROM budgets WHERE user_id=?1 AND category_id=?2",
        params![user_id, category_id],
    )?)
}
