// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use super::aggregate::ObligationTotals;
use super::transfers::TransferTotals;
use crate::models::{BalanceDirection, SettlementTotals};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    pub final_balance: Decimal,
    pub direction: BalanceDirection,
}

/// Net outstanding balance: what the platform still owes minus what the vendor still owes.
pub fn resolve(obligations: &ObligationTotals, transfers: &TransferTotals) -> Balance {
    let platform_outstanding =
        obligations.total_admin_owes_vendor - transfers.total_transferred_to_vendor;
    let vendor_outstanding =
        obligations.total_vendor_owes_admin - transfers.total_transferred_to_admin;
    let final_balance = platform_outstanding - vendor_outstanding;
    let direction = match final_balance.cmp(&Decimal::ZERO) {
        Ordering::Greater => BalanceDirection::AdminOwesVendor,
        Ordering::Less => BalanceDirection::VendorOwesAdmin,
        Ordering::Equal => BalanceDirection::Settled,
    };
    Balance {
        final_balance,
        direction,
    }
}

pub fn settlement_totals(
    obligations: &ObligationTotals,
    transfers: &TransferTotals,
) -> SettlementTotals {
    let balance = resolve(obligations, transfers);
    SettlementTotals {
        total_admin_owes_vendor: obligations.total_admin_owes_vendor,
        total_vendor_owes_admin: obligations.total_vendor_owes_admin,
        total_platform_fee: obligations.total_platform_fee,
        total_tax_amount: obligations.total_tax_amount,
        total_transferred_to_vendor: transfers.total_transferred_to_vendor,
        total_transferred_to_admin: transfers.total_transferred_to_admin,
        final_balance: balance.final_balance,
        balance_direction: balance.direction,
        appointment_count: obligations.appointment_count,
        line_count: obligations.line_count,
    }
}
