// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod settlement;
pub mod sources;
pub mod store;
pub mod utils;

pub use error::SettlementError;
pub use settlement::generate_settlement_report;
