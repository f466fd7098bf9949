// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use tracing::error;

use crate::error::{Result, SettlementError};
use crate::models::{AllocatedAppointmentLine, Mode, ObligationRecord, ReportLine, Status};

/// Works out who owes whom for a single allocated service line.
///
/// Online: the platform collected the money and owes the vendor everything
/// except its fee and tax. Offline: the vendor collected the money and owes the
/// platform its fee and tax. Lines that are not completed owe nothing, whatever
/// their mode.
pub fn obligation_for(line: &AllocatedAppointmentLine) -> Result<ObligationRecord> {
    if line.status != Status::Completed {
        return Ok(ObligationRecord::ZERO);
    }
    let overflow = || SettlementError::invalid_record(line.id.as_str(), "obligation overflows");
    match &line.mode {
        Mode::Online => Ok(ObligationRecord {
            admin_owes_vendor: line
                .final_amount
                .checked_sub(line.platform_fee)
                .and_then(|v| v.checked_sub(line.service_tax))
                .ok_or_else(overflow)?,
            vendor_owes_admin: Decimal::ZERO,
        }),
        Mode::Offline => Ok(ObligationRecord {
            admin_owes_vendor: Decimal::ZERO,
            vendor_owes_admin: line
                .platform_fee
                .checked_add(line.service_tax)
                .ok_or_else(overflow)?,
        }),
        Mode::Unrecognized(raw) => {
            error!(booking_id = %line.id, mode = %raw, "cannot settle line with unknown payment mode");
            Err(SettlementError::InvalidMode {
                booking_id: line.id.clone(),
                mode: raw.clone(),
            })
        }
    }
}

/// Attaches an obligation to every line, failing on the first unknown mode.
pub fn derive_obligations(lines: Vec<AllocatedAppointmentLine>) -> Result<Vec<ReportLine>> {
    lines
        .into_iter()
        .map(|line| {
            let obligation = obligation_for(&line)?;
            Ok(ReportLine { line, obligation })
        })
        .collect()
}
