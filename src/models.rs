// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = i64;
pub type AccessId = i64;
pub type AccountId = i64;
pub type CategoryId = i64;
pub type TransactionId = i64;
pub type BudgetId = i64;
pub type RuleId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub login: String,
}

/// A configured bank connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Access {
    pub id: AccessId,
    pub user_id: UserId,
    pub vendor: String,
    pub login: String,
    pub label: Option<String>,
}

/// Account kinds that drive the balance inclusion rules.
///
/// Any type string that is not recognized maps to [`AccountType::Unknown`],
/// which always takes the conservative branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Card,
    Loan,
    Market,
    Unknown,
}

impl AccountType {
    /// Accepts both the short form (`card`) and the namespaced form
    /// (`account-type.card`) used by bank connectors.
    pub fn parse(raw: &str) -> AccountType {
        let s = raw.trim().to_ascii_lowercase();
        let s = s.strip_prefix("account-type.").unwrap_or(&s);
        match s {
            "checking" => AccountType::Checking,
            "savings" => AccountType::Savings,
            "card" => AccountType::Card,
            "loan" => AccountType::Loan,
            "market" => AccountType::Market,
            _ => AccountType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Card => "card",
            AccountType::Loan => "loan",
            AccountType::Market => "market",
            AccountType::Unknown => "unknown",
        }
    }

    /// Whether the bank-reported balance of this kind of account already
    /// reflects pending and future-dated movements.
    pub fn balance_is_forward_looking(&self) -> bool {
        match self {
            AccountType::Card => true,
            AccountType::Checking
            | AccountType::Savings
            | AccountType::Loan
            | AccountType::Market
            | AccountType::Unknown => false,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub access_id: AccessId,
    pub label: String,
    /// Raw type string as reported by the bank; see [`Account::account_type`].
    pub r#type: String,
    pub currency: String,
    pub initial_balance: Decimal,
    pub import_date: NaiveDate,
    /// Cached balance. `None` means it must be recomputed before use.
    pub balance: Option<Decimal>,
}

impl Account {
    pub fn account_type(&self) -> AccountType {
        AccountType::parse(&self.r#type)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    Card,
    DeferredCard,
    Transfer,
    Check,
    Withdrawal,
    BankFee,
    Order,
    DirectDebit,
    Unknown,
}

impl TransactionType {
    pub fn parse(raw: &str) -> TransactionType {
        let s = raw.trim().to_ascii_lowercase().replace('_', "-");
        let s = s.strip_prefix("type.").unwrap_or(&s);
        match s {
            "card" => TransactionType::Card,
            "deferred-card" => TransactionType::DeferredCard,
            "transfer" => TransactionType::Transfer,
            "check" => TransactionType::Check,
            "withdrawal" => TransactionType::Withdrawal,
            "bankfee" | "bank-fee" => TransactionType::BankFee,
            "order" => TransactionType::Order,
            "direct-debit" => TransactionType::DirectDebit,
            _ => TransactionType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Card => "card",
            TransactionType::DeferredCard => "deferred-card",
            TransactionType::Transfer => "transfer",
            TransactionType::Check => "check",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::BankFee => "bank-fee",
            TransactionType::Order => "order",
            TransactionType::DirectDebit => "direct-debit",
            TransactionType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub account_id: AccountId,
    /// `None` is the "no category" sentinel.
    pub category_id: Option<CategoryId>,
    pub r#type: TransactionType,
    pub label: String,
    pub raw_label: String,
    pub custom_label: Option<String>,
    /// Value date.
    pub date: NaiveDateTime,
    pub debit_date: Option<NaiveDateTime>,
    pub amount: Decimal,
    pub created_by_user: bool,
    pub pending: bool,
}

impl Transaction {
    /// The date the movement hits the account: the debit date when the bank
    /// provides one, the value date otherwise.
    pub fn effective_date(&self) -> NaiveDate {
        self.debit_date.unwrap_or(self.date).date()
    }
}

/// Fields for a transaction that is about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub r#type: TransactionType,
    pub label: String,
    pub raw_label: String,
    pub custom_label: Option<String>,
    pub date: NaiveDateTime,
    pub debit_date: Option<NaiveDateTime>,
    pub amount: Decimal,
    pub created_by_user: bool,
    pub pending: bool,
}

impl NewTransaction {
    /// A manually entered, already settled transaction.
    pub fn manual(account_id: AccountId, date: NaiveDateTime, amount: Decimal, label: &str) -> Self {
        NewTransaction {
            account_id,
            category_id: None,
            r#type: TransactionType::Unknown,
            label: label.to_string(),
            raw_label: label.to_string(),
            custom_label: None,
            date,
            debit_date: None,
            amount,
            created_by_user: true,
            pending: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserId,
    pub label: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub year: i32,
    pub month: u32,
    pub threshold: Decimal,
}

/// Auto-categorization rule applied to imported labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub id: RuleId,
    pub user_id: UserId,
    pub pattern: String,
    pub category_id: Option<CategoryId>,
    pub label_rewrite: Option<String>,
}

/// A stored transaction row that could not be decoded.
///
/// Aggregates skip such rows instead of failing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataCorruptionWarning {
    pub transaction_id: TransactionId,
    pub reason: String,
}

impl fmt::Display for DataCorruptionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction {}: {}", self.transaction_id, self.reason)
    }
}
