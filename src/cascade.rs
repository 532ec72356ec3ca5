// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Category deletion with its dependent records.
//!
//! The cascade is an ordered script run inside a single store transaction.
//! Dependents are migrated before the category row goes away, so no reader
//! ever sees a transaction pointing at a deleted category.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{CategoryId, UserId};
use crate::store::{budgets, categories, rules, transactions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CascadeStage {
    Pending,
    TransactionsMigrated,
    RulesMigrated,
    BudgetsRemoved,
    CategoryRemoved,
    Committed,
}

#[derive(Debug, Clone, Copy)]
enum CascadeStep {
    MigrateTransactions,
    MigrateRules,
    RemoveBudgets,
    RemoveCategory,
}

impl CascadeStep {
    /// Execution order. Dependents first, the category row last.
    const ORDER: [CascadeStep; 4] = [
        CascadeStep::MigrateTransactions,
        CascadeStep::MigrateRules,
        CascadeStep::RemoveBudgets,
        CascadeStep::RemoveCategory,
    ];

    fn reaches(self) -> CascadeStage {
        match self {
            CascadeStep::MigrateTransactions => CascadeStage::TransactionsMigrated,
            CascadeStep::MigrateRules => CascadeStage::RulesMigrated,
            CascadeStep::RemoveBudgets => CascadeStage::BudgetsRemoved,
            CascadeStep::RemoveCategory => CascadeStage::CategoryRemoved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeReport {
    pub category_id: CategoryId,
    pub replacement_id: Option<CategoryId>,
    pub transactions_migrated: usize,
    pub rules_migrated: usize,
    pub budgets_removed: usize,
    pub stage: CascadeStage,
}

/// Deletes a category after moving its transactions and rules to
/// `replacement` (`None` leaves them uncategorized) and dropping its budgets.
///
/// Both categories must exist for the user, otherwise `NotFound` is returned
/// and nothing changes. Balances are left alone: no amount moves.
pub fn destroy_category(
    conn: &mut Connection,
    user_id: UserId,
    category_id: CategoryId,
    replacement: Option<CategoryId>,
) -> LedgerResult<CascadeReport> {
    if replacement == Some(category_id) {
        return Err(LedgerError::validation(
            "A category cannot be replaced by itself",
        ));
    }

    let tx = conn.transaction()?;
    categories::ensure_category(&tx, user_id, category_id)?;
    if let Some(rid) = replacement {
        categories::ensure_category(&tx, user_id, rid)?;
    }

    let mut report = CascadeReport {
        category_id,
        replacement_id: replacement,
        transactions_migrated: 0,
        rules_migrated: 0,
        budgets_removed: 0,
        stage: CascadeStage::Pending,
    };

    for step in CascadeStep::ORDER {
        match step {
            CascadeStep::MigrateTransactions => {
                report.transactions_migrated =
                    transactions::reassign_category(&tx, user_id, category_id, replacement)?;
            }
            CascadeStep::MigrateRules => {
                report.rules_migrated =
                    rules::reassign_rules(&tx, user_id, category_id, replacement)?;
            }
            CascadeStep::RemoveBudgets => {
                report.budgets_removed =
                    budgets::delete_budgets_for_category(&tx, user_id, category_id)?;
            }
            CascadeStep::RemoveCategory => {
                if categories::delete_category_record(&tx, user_id, category_id)? == 0 {
                    return Err(LedgerError::not_found("category", category_id));
                }
            }
        }
        report.stage = step.reaches();
        tracing::debug!(user_id, category_id, stage = ?report.stage, "cascade step done");
    }

    tx.commit()?;
    report.stage = CascadeStage::Committed;
    tracing::info!(
        user_id,
        category_id,
        replacement = ?replacement,
        transactions = report.transactions_migrated,
        rules = report.rules_migrated,
        budgets = report.budgets_removed,
        "deleted category"
    );
    Ok(report)
}
