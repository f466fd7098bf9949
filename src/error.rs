// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures that stop a settlement report from being produced.
///
/// Data-quality problems that still allow a correct report are reported as
/// [`crate::models::SettlementWarning`] instead.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("booking '{booking_id}' has unrecognized payment mode '{mode}'")]
    InvalidMode { booking_id: String, mode: String },

    #[error("failed to fetch {what}: {source}")]
    UpstreamFetch {
        what: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("invalid settlement window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("invalid record '{record}': {reason}")]
    InvalidRecord { record: String, reason: String },

    #[error("settlement report cancelled")]
    Cancelled,
}

impl SettlementError {
    pub(crate) fn upstream(what: &'static str, err: anyhow::Error) -> Self {
        SettlementError::UpstreamFetch {
            what,
            source: err.into(),
        }
    }

    pub(crate) fn invalid_record(record: impl Into<String>, reason: impl Into<String>) -> Self {
        SettlementError::InvalidRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SettlementError>;
