// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::error::{Result, SettlementError};
use crate::models::{ReportLine, Status};

/// Period totals over the obligations of completed lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObligationTotals {
    pub total_admin_owes_vendor: Decimal,
    pub total_vendor_owes_admin: Decimal,
    pub total_platform_fee: Decimal,
    pub total_tax_amount: Decimal,
    pub appointment_count: usize,
    pub line_count: usize,
}

/// Folds report lines into period totals.
///
/// Lines that are not completed are skipped. Money is summed per line, so each
/// line of a multi-service booking contributes its own allocated share, while
/// `appointment_count` counts each booking id once.
pub fn aggregate(lines: &[ReportLine]) -> Result<ObligationTotals> {
    let mut totals = ObligationTotals::default();
    let mut bookings: HashSet<&str> = HashSet::new();
    for entry in lines.iter().filter(|l| l.line.status == Status::Completed) {
        let id = entry.line.id.as_str();
        accumulate(&mut totals.total_admin_owes_vendor, entry.obligation.admin_owes_vendor, id)?;
        accumulate(&mut totals.total_vendor_owes_admin, entry.obligation.vendor_owes_admin, id)?;
        accumulate(&mut totals.total_platform_fee, entry.line.platform_fee, id)?;
        accumulate(&mut totals.total_tax_amount, entry.line.service_tax, id)?;
        totals.line_count += 1;
        bookings.insert(id);
    }
    totals.appointment_count = bookings.len();
    Ok(totals)
}

fn accumulate(total: &mut Decimal, value: Decimal, booking_id: &str) -> Result<()> {
    *total = total
        .checked_add(value)
        .ok_or_else(|| SettlementError::invalid_record(booking_id, "period totals overflow"))?;
    Ok(())
}
