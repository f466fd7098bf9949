// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The settlement engine. Data flows one way:
//! allocation -> obligations -> aggregation -> transfer matching -> balance.

pub mod aggregate;
pub mod allocation;
pub mod balance;
pub mod obligation;
pub mod report;
pub mod review;
pub mod transfers;

pub use report::{
    LinePage, LineQuery, ReportAssembler, ReportRequest, build_report, generate_settlement_report,
};
