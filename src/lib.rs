// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod balance;
pub mod cascade;
pub mod cli;
pub mod commands;
pub mod db;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod models;
pub mod settings;
pub mod store;
pub mod utils;

pub use error::{LedgerError, LedgerResult};
