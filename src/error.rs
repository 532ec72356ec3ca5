// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error type shared by the store and the consistency engine.

/// The errors the ledger core can surface to its callers.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The input was rejected before any mutation took place.
    ///
    /// The message is meant to be shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist for the requesting user.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The underlying store failed.
    ///
    /// Any open store transaction is rolled back when it is dropped, so a
    /// failed multi-row operation leaves no partial state behind.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
