// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accesses;
pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod doctor;
pub mod duplicates;
pub mod importer;
pub mod rules;
pub mod settings;
pub mod transactions;
pub mod users;
