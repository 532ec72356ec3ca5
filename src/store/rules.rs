// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use regex::Regex;
use rusqlite::{Connection, params};

use super::categories;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{CategoryId, Rule, RuleId, UserId};

pub fn create_rule(
    conn: &Connection,
    user_id: UserId,
    pattern: &str,
    category_id: Option<CategoryId>,
    label_rewrite: Option<&str>,
) -> LedgerResult<RuleId> {
    let pattern = pattern.trim();
    Regex::new(pattern).map_err(|err| {
        LedgerError::validation(format!("Invalid regex pattern '{}': {}", pattern, err))
    })?;
    if let Some(cid) = category_id {
        categories::ensure_category(conn, user_id, cid)?;
    }
    let rewrite = label_rewrite.map(str::trim).filter(|s| !s.is_empty());
    conn.execute(
        "INSERT INTO rules(user_id, pattern, category_id, label_rewrite) VALUES (?1,?2,?3,?4)",
        params![user_id, pattern, category_id, rewrite],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Newest rule first; that is also the order rules are tried in.
pub fn list_rules(conn: &Connection, user_id: UserId) -> LedgerResult<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, pattern, category_id, label_rewrite FROM rules
         WHERE user_id=?1 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |r| {
        Ok(Rule {
            id: r.get(0)?,
            user_id: r.get(1)?,
            pattern: r.get(2)?,
            category_id: r.get(3)?,
            label_rewrite: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn delete_rule(conn: &Connection, user_id: UserId, rule_id: RuleId) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM rules WHERE user_id=?1 AND id=?2",
        params![user_id, rule_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("rule", rule_id));
    }
    Ok(())
}

/// Re-points rules targeting `from`. Returns the number of rules changed.
pub fn reassign_rules(
    conn: &Connection,
    user_id: UserId,
    from: CategoryId,
    to: Option<CategoryId>,
) -> LedgerResult<usize> {
    Ok(conn.execute(
        "UPDATE rules SET category_id=?3 WHERE user_id=?1 AND category_id=?2",
        params![user_id, from, to],
    )?)
}

/// First matching rule (newest first) for an imported label and memo.
///
/// Returns the rule's category and label rewrite. Patterns that no longer
/// compile are skipped.
pub fn apply_rules(
    conn: &Connection,
    user_id: UserId,
    label: &str,
    memo: Option<&str>,
) -> LedgerResult<(Option<CategoryId>, Option<String>)> {
    let hay = match memo {
        Some(m) => format!("{} {}", label, m),
        None => label.to_string(),
    };
    for rule in list_rules(conn, user_id)? {
        match Regex::new(&rule.pattern) {
            Ok(re) if re.is_match(&hay) => return Ok((rule.category_id, rule.label_rewrite)),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(rule_id = rule.id, %err, "skipping rule with invalid pattern");
            }
        }
    }
    Ok((None, None))
}
