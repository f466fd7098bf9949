// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;

use crate::error::{Result, SettlementError};
use crate::models::{TransferRecord, TransferType};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferTotals {
    pub total_transferred_to_vendor: Decimal,
    pub total_transferred_to_admin: Decimal,
    pub transfer_count: usize,
}

/// Sums recorded transfers by direction. Transfers are never matched to
/// individual appointments; one payout usually covers many of them.
pub fn match_transfers(transfers: &[TransferRecord]) -> Result<TransferTotals> {
    transfers
        .iter()
        .try_fold(TransferTotals::default(), |mut acc, t| -> Result<TransferTotals> {
            let bucket = match t.r#type {
                TransferType::PaymentToVendor => &mut acc.total_transferred_to_vendor,
                TransferType::PaymentToAdmin => &mut acc.total_transferred_to_admin,
            };
            *bucket = bucket.checked_add(t.amount).ok_or_else(|| {
                SettlementError::invalid_record(
                    t.transaction_id.as_deref().unwrap_or("transfer"),
                    "transfer totals overflow",
                )
            })?;
            acc.transfer_count += 1;
            Ok(acc)
        })
}
