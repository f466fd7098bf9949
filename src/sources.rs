// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only collaborators the settlement engine pulls its inputs from.
//!
//! Implementations own retries, timeouts and normalization of their raw
//! records; the engine only sees clean [`AppointmentRecord`]s and
//! [`TransferRecord`]s for the requested tenant and window.

use anyhow::Result;
use chrono::NaiveDate;

use crate::models::{AppointmentRecord, TransferRecord};

pub trait AppointmentSource {
    /// Every service line of `tenant_id` dated within `[start, end]`, whatever its status.
    fn fetch_appointments(
        &self,
        tenant_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>>;
}

pub trait TransferSource {
    /// Transfers of `tenant_id` whose payment date falls within `[start, end]`.
    fn fetch_transfers(
        &self,
        tenant_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransferRecord>>;
}
