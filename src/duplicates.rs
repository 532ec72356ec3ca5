// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Duplicate candidate detection.
//!
//! Transactions are sorted by value date once, then each one is compared only
//! with the transactions that follow it inside the threshold window.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, Transaction, TransactionId, UserId};
use crate::settings::{self, Settings};
use crate::store::{accounts, dismissals, transactions};

/// Maximum distance, in hours, between two transactions that may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateThreshold(u32);

impl DuplicateThreshold {
    pub const fn from_hours(hours: u32) -> Self {
        DuplicateThreshold(hours)
    }

    pub fn try_from_hours(hours: i64) -> LedgerResult<Self> {
        u32::try_from(hours).map(DuplicateThreshold).map_err(|_| {
            LedgerError::validation(format!(
                "Duplicate threshold must be a non-negative number of hours, got {}",
                hours
            ))
        })
    }

    /// Parses a threshold from user or settings text.
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        let hours: i64 = raw.trim().parse().map_err(|_| {
            LedgerError::validation(format!(
                "Duplicate threshold must be a whole number of hours, got '{}'",
                raw
            ))
        })?;
        Self::try_from_hours(hours)
    }

    pub fn hours(&self) -> u32 {
        self.0
    }

    fn window(&self) -> Duration {
        Duration::hours(i64::from(self.0))
    }
}

/// Pairs the user has declared "not a duplicate". Order inside a pair is
/// irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissedPairs(HashSet<(TransactionId, TransactionId)>);

impl DismissedPairs {
    fn key(a: TransactionId, b: TransactionId) -> (TransactionId, TransactionId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn insert(&mut self, a: TransactionId, b: TransactionId) -> bool {
        self.0.insert(Self::key(a, b))
    }

    pub fn contains(&self, a: TransactionId, b: TransactionId) -> bool {
        self.0.contains(&Self::key(a, b))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Two transactions that may record the same real-world event. `first` is
/// never later than `second`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicatePair<'a> {
    pub first: &'a Transaction,
    pub second: &'a Transaction,
}

impl DuplicatePair<'_> {
    pub fn ids(&self) -> (TransactionId, TransactionId) {
        (self.first.id, self.second.id)
    }

    pub fn to_candidate(&self) -> DuplicateCandidate {
        DuplicateCandidate {
            first_id: self.first.id,
            second_id: self.second.id,
            account_id: self.first.account_id,
            amount: self.first.amount,
            first_date: self.first.date,
            second_date: self.second.date,
            first_label: self.first.label.clone(),
            second_label: self.second.label.clone(),
        }
    }
}

/// Owned form of a [`DuplicatePair`], for callers that outlive the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateCandidate {
    pub first_id: TransactionId,
    pub second_id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub first_date: NaiveDateTime,
    pub second_date: NaiveDateTime,
    pub first_label: String,
    pub second_label: String,
}

/// A sorted snapshot of transactions ready to be scanned for duplicates.
///
/// [`DuplicateFinder::pairs`] can be called any number of times; each call
/// restarts the scan from the beginning.
#[derive(Debug, Clone)]
pub struct DuplicateFinder<'a> {
    sorted: Vec<&'a Transaction>,
    window: Duration,
    ignore_custom_fields: bool,
    dismissed: &'a DismissedPairs,
}

impl<'a> DuplicateFinder<'a> {
    pub fn new(
        transactions: &'a [Transaction],
        threshold: DuplicateThreshold,
        ignore_custom_fields: bool,
        dismissed: &'a DismissedPairs,
    ) -> Self {
        let mut seen = HashSet::with_capacity(transactions.len());
        let mut sorted: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| seen.insert(t.id))
            .collect();
        sorted.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        DuplicateFinder {
            sorted,
            window: threshold.window(),
            ignore_custom_fields,
            dismissed,
        }
    }

    pub fn pairs(&self) -> DuplicatePairs<'_, 'a> {
        DuplicatePairs {
            finder: self,
            i: 0,
            j: 1,
        }
    }

    fn is_candidate(&self, a: &Transaction, b: &Transaction) -> bool {
        a.id != b.id
            && a.account_id == b.account_id
            && a.amount == b.amount
            && (self.ignore_custom_fields || a.custom_label == b.custom_label)
            && !self.dismissed.contains(a.id, b.id)
    }
}

/// Lazy iterator over the candidate pairs of a [`DuplicateFinder`].
#[derive(Debug, Clone)]
pub struct DuplicatePairs<'f, 'a> {
    finder: &'f DuplicateFinder<'a>,
    i: usize,
    j: usize,
}

impl<'f, 'a> Iterator for DuplicatePairs<'f, 'a> {
    type Item = DuplicatePair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let sorted = &self.finder.sorted;
        while self.i < sorted.len() {
            let a = sorted[self.i];
            if self.j >= sorted.len() || sorted[self.j].date - a.date > self.finder.window {
                self.i += 1;
                self.j = self.i + 1;
                continue;
            }
            let b = sorted[self.j];
            self.j += 1;
            if self.finder.is_candidate(a, b) {
                return Some(DuplicatePair { first: a, second: b });
            }
        }
        None
    }
}

/// Validates the threshold and prepares the scan. Negative thresholds are
/// rejected before any transaction is looked at.
pub fn find_duplicates<'a>(
    transactions: &'a [Transaction],
    threshold_hours: i64,
    ignore_custom_fields: bool,
    dismissed: &'a DismissedPairs,
) -> LedgerResult<DuplicateFinder<'a>> {
    let threshold = DuplicateThreshold::try_from_hours(threshold_hours)?;
    Ok(DuplicateFinder::new(
        transactions,
        threshold,
        ignore_custom_fields,
        dismissed,
    ))
}

fn scan_account(
    conn: &Connection,
    user_id: UserId,
    account_id: AccountId,
    prefs: &Settings,
    dismissed: &DismissedPairs,
) -> LedgerResult<Vec<DuplicateCandidate>> {
    let loaded = transactions::find_transactions_by_account(conn, user_id, account_id)?;
    let finder = DuplicateFinder::new(
        &loaded.rows,
        prefs.duplicate_threshold,
        prefs.duplicate_ignore_custom_fields,
        dismissed,
    );
    let found: Vec<DuplicateCandidate> = finder.pairs().map(|p| p.to_candidate()).collect();
    tracing::debug!(
        user_id,
        account_id,
        scanned = loaded.rows.len(),
        skipped = loaded.corrupt.len(),
        found = found.len(),
        "duplicate scan finished"
    );
    Ok(found)
}

/// Candidate pairs for one account, using the user's settings.
///
/// Rows, settings and dismissals are read inside one read transaction so the
/// result reflects a single snapshot of the ledger.
pub fn find_duplicates_for_account(
    conn: &Connection,
    user_id: UserId,
    account_id: AccountId,
) -> LedgerResult<Vec<DuplicateCandidate>> {
    let snapshot = conn.unchecked_transaction()?;
    let prefs = settings::load(&snapshot, user_id)?;
    accounts::get_account(&snapshot, user_id, account_id)?;
    let dismissed = dismissals::load_dismissed(&snapshot, user_id)?;
    let found = scan_account(&snapshot, user_id, account_id, &prefs, &dismissed)?;
    snapshot.commit()?;
    Ok(found)
}

/// Candidate pairs across every account of the user, read from one snapshot.
pub fn find_duplicates_for_user(
    conn: &Connection,
    user_id: UserId,
) -> LedgerResult<Vec<DuplicateCandidate>> {
    let snapshot = conn.unchecked_transaction()?;
    let prefs = settings::load(&snapshot, user_id)?;
    let dismissed = dismissals::load_dismissed(&snapshot, user_id)?;
    let mut out = Vec::new();
    for account in accounts::list_accounts(&snapshot, user_id)? {
        out.extend(scan_account(&snapshot, user_id, account.id, &prefs, &dismissed)?);
    }
    snapshot.commit()?;
    Ok(out)
}

/// Records the user's verdict that `a` and `b` are distinct events. The pair
/// is never proposed again.
pub fn dismiss_duplicate(
    conn: &Connection,
    user_id: UserId,
    a: TransactionId,
    b: TransactionId,
) -> LedgerResult<bool> {
    if a == b {
        return Err(LedgerError::validation(
            "A transaction cannot be a duplicate of itself",
        ));
    }
    for id in [a, b] {
        if !transactions::transaction_exists(conn, user_id, id)? {
            return Err(LedgerError::not_found("transaction", id));
        }
    }
    let inserted = dismissals::insert_dismissal(conn, user_id, a, b)?;
    if inserted {
        tracing::info!(user_id, a, b, "dismissed duplicate pair");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn tx(id: TransactionId, date: NaiveDateTime, amount: &str) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            account_id: 1,
            category_id: None,
            r#type: TransactionType::Card,
            label: format!("tx {}", id),
            raw_label: format!("TX {}", id),
            custom_label: None,
            date,
            debit_date: None,
            amount: Decimal::from_str(amount).unwrap(),
            created_by_user: false,
            pending: false,
        }
    }

    fn ids(finder: &DuplicateFinder<'_>) -> Vec<(TransactionId, TransactionId)> {
        finder.pairs().map(|p| p.ids()).collect()
    }

    #[test]
    fn raw_label_is_not_a_matching_field() {
        let mut a = tx(1, at(1, 9), "-12.34");
        a.label = "COFFEE".into();
        let mut b = tx(2, at(1, 15), "-12.34");
        b.label = "Coffee Shop".into();
        let txs = vec![a, b];
        let dismissed = DismissedPairs::default();
        let finder = find_duplicates(&txs, 24, false, &dismissed).unwrap();
        assert_eq!(ids(&finder), vec![(1, 2)]);
    }

    #[test]
    fn pairs_outside_the_window_are_not_reported() {
        let txs = vec![tx(1, at(1, 0), "-5"), tx(2, at(3, 2), "-5")];
        let dismissed = DismissedPairs::default();
        let finder = find_duplicates(&txs, 48, false, &dismissed).unwrap();
        assert!(ids(&finder).is_empty());
    }

    #[test]
    fn zero_threshold_matches_same_instant_only() {
        let txs = vec![
            tx(1, at(1, 10), "-5"),
            tx(2, at(1, 10), "-5"),
            tx(3, at(1, 11), "-5"),
        ];
        let dismissed = DismissedPairs::default();
        let finder = find_duplicates(&txs, 0, false, &dismissed).unwrap();
        assert_eq!(ids(&finder), vec![(1, 2)]);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let txs = vec![tx(1, at(1, 10), "-5")];
        let dismissed = DismissedPairs::default();
        let err = find_duplicates(&txs, -1, false, &dismissed).unwrap_err();
        assert!(err.is_validation());
        assert!(DuplicateThreshold::parse("soon").unwrap_err().is_validation());
    }

    #[test]
    fn each_unordered_pair_is_reported_once_regardless_of_input_order() {
        let a = tx(1, at(1, 10), "-5");
        let b = tx(2, at(1, 12), "-5");
        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];
        let dismissed = DismissedPairs::default();
        let f1 = find_duplicates(&forward, 24, false, &dismissed).unwrap();
        let f2 = find_duplicates(&backward, 24, false, &dismissed).unwrap();
        assert_eq!(ids(&f1), vec![(1, 2)]);
        assert_eq!(ids(&f1), ids(&f2));
    }

    #[test]
    fn repeated_input_rows_do_not_create_self_pairs() {
        let a = tx(1, at(1, 10), "-5");
        let b = tx(2, at(1, 10), "-5");
        let txs = vec![a.clone(), a, b];
        let dismissed = DismissedPairs::default();
        let finder = find_duplicates(&txs, 1, false, &dismissed).unwrap();
        assert_eq!(ids(&finder), vec![(1, 2)]);
    }

    #[test]
    fn custom_labels_must_agree_unless_ignored() {
        let mut a = tx(1, at(1, 10), "-5");
        a.custom_label = Some("Groceries".into());
        let b = tx(2, at(1, 11), "-5");
        let txs = vec![a, b];
        let dismissed = DismissedPairs::default();
        assert!(ids(&find_duplicates(&txs, 24, false, &dismissed).unwrap()).is_empty());
        assert_eq!(
            ids(&find_duplicates(&txs, 24, true, &dismissed).unwrap()),
            vec![(1, 2)]
        );
    }

    #[test]
    fn different_accounts_or_amounts_never_match() {
        let mut other_account = tx(2, at(1, 10), "-5");
        other_account.account_id = 2;
        let txs = vec![
            tx(1, at(1, 10), "-5"),
            other_account,
            tx(3, at(1, 10), "-5.01"),
            tx(4, at(1, 10), "5"),
        ];
        let dismissed = DismissedPairs::default();
        assert!(ids(&find_duplicates(&txs, 24, false, &dismissed).unwrap()).is_empty());
    }

    #[test]
    fn category_does_not_prevent_a_match() {
        let mut a = tx(1, at(1, 10), "-5");
        a.category_id = Some(3);
        let mut b = tx(2, at(1, 10), "-5");
        b.category_id = Some(4);
        let txs = vec![a, b];
        let dismissed = DismissedPairs::default();
        assert_eq!(
            ids(&find_duplicates(&txs, 24, false, &dismissed).unwrap()),
            vec![(1, 2)]
        );
    }

    #[test]
    fn dismissed_pairs_are_excluded_in_either_order() {
        let txs = vec![
            tx(1, at(1, 10), "-5"),
            tx(2, at(1, 11), "-5"),
            tx(3, at(1, 12), "-5"),
        ];
        let mut dismissed = DismissedPairs::default();
        dismissed.insert(2, 1);
        let finder = find_duplicates(&txs, 24, false, &dismissed).unwrap();
        assert_eq!(ids(&finder), vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn pairs_can_be_restarted() {
        let txs = vec![tx(1, at(1, 10), "-5"), tx(2, at(1, 11), "-5")];
        let dismissed = DismissedPairs::default();
        let finder = find_duplicates(&txs, 24, false, &dismissed).unwrap();
        let mut first = finder.pairs();
        assert!(first.next().is_some());
        assert!(first.next().is_none());
        assert_eq!(finder.pairs().count(), 1);
    }

    #[test]
    fn window_edge_is_inclusive() {
        let txs = vec![tx(1, at(1, 0), "-5"), tx(2, at(3, 0), "-5")];
        let dismissed = DismissedPairs::default();
        let finder = find_duplicates(&txs, 48, false, &dismissed).unwrap();
        assert_eq!(ids(&finder), vec![(1, 2)]);
    }
}
