// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::allocation::group_by_booking;
use crate::models::{AppointmentRecord, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ZeroBookingTotal,
    UnbalancedLines,
    ServiceCountMismatch,
    InconsistentBookingAmounts,
    UnrecognizedMode,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::ZeroBookingTotal => "zero_booking_total",
            IssueKind::UnbalancedLines => "unbalanced_lines",
            IssueKind::ServiceCountMismatch => "service_count_mismatch",
            IssueKind::InconsistentBookingAmounts => "inconsistent_booking_amounts",
            IssueKind::UnrecognizedMode => "unrecognized_mode",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingIssue {
    pub booking_id: String,
    pub kind: IssueKind,
    pub detail: String,
}

/// Finds bookings whose raw records would settle badly or not at all.
pub fn review_bookings(records: Vec<AppointmentRecord>) -> Vec<BookingIssue> {
    let mut issues = Vec::new();
    for group in group_by_booking(records) {
        let Some(first) = group.first() else {
            continue;
        };
        let id = first.id.clone();
        let mut push = |kind, detail: String| {
            issues.push(BookingIssue {
                booking_id: id.clone(),
                kind,
                detail,
            })
        };

        for line in &group {
            if let Mode::Unrecognized(raw) = &line.mode {
                push(
                    IssueKind::UnrecognizedMode,
                    format!("line {} has mode '{}'", line.service_index, raw),
                );
            }
        }

        let inconsistent = group.iter().any(|l| {
            l.platform_fee != first.platform_fee
                || l.service_tax != first.service_tax
                || l.total_booking_amount != first.total_booking_amount
        });
        if inconsistent {
            push(
                IssueKind::InconsistentBookingAmounts,
                "lines disagree on fee, tax or booking total".to_string(),
            );
        }

        let multi = group.len() > 1 || group.iter().any(|l| l.is_multi_service);
        if multi && first.service_count as usize != group.len() {
            push(
                IssueKind::ServiceCountMismatch,
                format!(
                    "serviceCount says {} but {} lines were found",
                    first.service_count,
                    group.len()
                ),
            );
        }
        if !multi {
            continue;
        }

        let base_sum: Decimal = group.iter().map(|l| l.base_amount).sum();
        if first.total_booking_amount.is_zero() {
            push(
                IssueKind::ZeroBookingTotal,
                format!("fee {} and tax {} cannot be allocated", first.platform_fee, first.service_tax),
            );
        } else if base_sum != first.total_booking_amount {
            push(
                IssueKind::UnbalancedLines,
                format!(
                    "lines sum to {} but booking total is {}",
                    base_sum, first.total_booking_amount
                ),
            );
        }
    }
    issues
}
