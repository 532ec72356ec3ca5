// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, CategoryId, UserId};

pub fn create_category(
    conn: &Connection,
    user_id: UserId,
    label: &str,
    color: Option<&str>,
) -> LedgerResult<CategoryId> {
    let label = label.trim();
    if label.is_empty() {
        return Err(LedgerError::validation("Category label cannot be empty"));
    }
    let taken: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM categories WHERE user_id=?1 AND label=?2",
            params![user_id, label],
            |r| r.get(0),
        )
        .optional()?;
    if taken.is_some() {
        return Err(LedgerError::validation(format!(
            "Category '{}' already exists",
            label
        )));
    }
    conn.execute(
        "INSERT INTO categories(user_id, label, color) VALUES (?1, ?2, ?3)",
        params![user_id, label, color.map(str::trim).filter(|c| !c.is_empty())],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_category(
    conn: &Connection,
    user_id: UserId,
    category_id: CategoryId,
) -> LedgerResult<Category> {
    conn.query_row(
        "SELECT id, user_id, label, color FROM categories WHERE user_id=?1 AND id=?2",
        params![user_id, category_id],
        |r| {
            Ok(Category {
                id: r.get(0)?,
                user_id: r.get(1)?,
                label: r.get(2)?,
                color: r.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("category", category_id))
}

/// Fails with `NotFound` unless the category exists and belongs to the user.
pub fn ensure_category(
    conn: &Connection,
    user_id: UserId,
    category_id: CategoryId,
) -> LedgerResult<()> {
    get_category(conn, user_id, category_id).map(|_| ())
}

pub fn list_categories(conn: &Connection, user_id: UserId) -> LedgerResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, label, color FROM categories WHERE user_id=?1 ORDER BY label",
    )?;
    let rows = stmt.query_map(params![user_id], |r| {
        Ok(Category {
            id: r.get(0)?,
            user_id: r.get(1)?,
            label: r.get(2)?,
            color: r.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Removes the category row only. Callers go through
/// [`crate::cascade::destroy_category`], which migrates dependents first.
pub(crate) fn delete_category_record(
    conn: &Connection,
    user_id: UserId,
    category_id: CategoryId,
) -> LedgerResult<usize> {
    Ok(conn.execute(
        "DELETE FROM categories WHERE user_id=?1 AND id=?2",
        params![user_id, category_id],
    )?)
}
