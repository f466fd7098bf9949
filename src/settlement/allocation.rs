// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Splits a booking's shared platform fee and service tax across its service
//! lines in proportion to each line's base amount.

use std::collections::{HashMap, hash_map::Entry};

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::error::{Result, SettlementError};
use crate::models::{AllocatedAppointmentLine, AppointmentRecord, SettlementWarning};

const RATIO_DP: u32 = 6;

#[derive(Debug, Clone, Default)]
pub struct BookingAllocation {
    pub lines: Vec<AllocatedAppointmentLine>,
    pub warning: Option<SettlementWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub lines: Vec<AllocatedAppointmentLine>,
    pub warnings: Vec<SettlementWarning>,
}

/// Groups service lines by booking id in first-seen order; lines within a
/// booking are ordered by `service_index`.
pub fn group_by_booking(records: Vec<AppointmentRecord>) -> Vec<Vec<AppointmentRecord>> {
    let mut groups: Vec<Vec<AppointmentRecord>> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    for record in records {
        match index_by_id.entry(record.id.clone()) {
            Entry::Occupied(entry) => groups[*entry.get()].push(record),
            Entry::Vacant(entry) => {
                entry.insert(groups.len());
                groups.push(vec![record]);
            }
        }
    }
    for group in &mut groups {
        group.sort_by_key(|r| r.service_index);
    }
    groups
}

/// Runs [`allocate_booking`] over every booking in `records`.
pub fn allocate(records: Vec<AppointmentRecord>, decimal_places: u32) -> Result<Allocation> {
    let mut out = Allocation::default();
    for group in group_by_booking(records) {
        let booking = allocate_booking(&group, decimal_places)?;
        out.lines.extend(booking.lines);
        out.warnings.extend(booking.warning);
    }
    Ok(out)
}

/// Allocates one booking. `lines` must all share the same booking id.
///
/// A booking counts as multi-service when it has more than one line or any
/// line says so. Single-service bookings keep their raw amounts. For
/// multi-service bookings whose base amounts add up to the booking total, fee
/// and tax are split with the largest-remainder method: every share is
/// truncated to `decimal_places`, then the leftover smallest units go one at a
/// time to the lines with the largest truncated remainders (earlier lines win
/// ties). Every share stays non-negative and the booking's fee and tax are
/// conserved exactly. Unbalanced bookings keep rounded proportional shares.
///
/// Fails with [`SettlementError::InvalidRecord`] when the amounts are too large
/// to split in decimal arithmetic.
pub fn allocate_booking(
    lines: &[AppointmentRecord],
    decimal_places: u32,
) -> Result<BookingAllocation> {
    let Some(first) = lines.first() else {
        return Ok(BookingAllocation::default());
    };
    let multi = lines.len() > 1 || lines.iter().any(|l| l.is_multi_service);
    if !multi {
        return Ok(BookingAllocation {
            lines: vec![passthrough(first)],
            warning: None,
        });
    }

    let total = first.total_booking_amount;
    let fee = first.platform_fee;
    let tax = first.service_tax;

    if total.is_zero() {
        warn!(
            booking_id = %first.id,
            lines = lines.len(),
            "multi-service booking has a zero total; fee and tax left unallocated"
        );
        return Ok(BookingAllocation {
            lines: lines
                .iter()
                .map(|l| {
                    split_line(l, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, l.base_amount)
                })
                .collect(),
            warning: Some(SettlementWarning::DegenerateAllocation {
                booking_id: first.id.clone(),
                lines: lines.len(),
            }),
        });
    }

    let overflow = || {
        SettlementError::invalid_record(
            first.id.as_str(),
            "amounts too large to allocate fee and tax",
        )
    };
    let bases: Vec<Decimal> = lines.iter().map(|l| l.base_amount).collect();
    let base_sum = checked_sum(&bases).ok_or_else(overflow)?;

    let (fees, taxes, warning) = if base_sum == total {
        let fees =
            largest_remainder_split(fee, &bases, total, decimal_places).ok_or_else(overflow)?;
        let taxes =
            largest_remainder_split(tax, &bases, total, decimal_places).ok_or_else(overflow)?;
        (fees, taxes, None)
    } else {
        warn!(
            booking_id = %first.id,
            %base_sum,
            %total,
            "service line amounts do not add up to the booking total"
        );
        let fees = rounded_split(fee, &bases, total, decimal_places).ok_or_else(overflow)?;
        let taxes = rounded_split(tax, &bases, total, decimal_places).ok_or_else(overflow)?;
        let warning = SettlementWarning::UnbalancedBooking {
            booking_id: first.id.clone(),
            base_sum,
            total_booking_amount: total,
        };
        (fees, taxes, Some(warning))
    };

    let mut allocated = Vec::with_capacity(lines.len());
    for ((l, line_fee), line_tax) in lines.iter().zip(fees).zip(taxes) {
        let ratio = l
            .base_amount
            .checked_div(total)
            .ok_or_else(overflow)?
            .round_dp(RATIO_DP);
        let final_amount = l
            .base_amount
            .checked_add(line_fee)
            .and_then(|v| v.checked_add(line_tax))
            .ok_or_else(overflow)?;
        allocated.push(split_line(l, ratio, line_fee, line_tax, final_amount));
    }

    debug!(
        booking_id = %first.id,
        lines = allocated.len(),
        %fee,
        %tax,
        "allocated multi-service booking"
    );
    Ok(BookingAllocation {
        lines: allocated,
        warning,
    })
}

fn checked_sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}

/// `amount * base / total` without overflowing when the plain product does not fit.
fn exact_share(amount: Decimal, base: Decimal, total: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(base)
        .and_then(|p| p.checked_div(total))
        .or_else(|| base.checked_div(total)?.checked_mul(amount))
}

fn rounded_split(
    amount: Decimal,
    bases: &[Decimal],
    total: Decimal,
    decimal_places: u32,
) -> Option<Vec<Decimal>> {
    bases
        .iter()
        .map(|b| {
            exact_share(amount, *b, total).map(|share| {
                share.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
            })
        })
        .collect()
}

fn largest_remainder_split(
    amount: Decimal,
    bases: &[Decimal],
    total: Decimal,
    decimal_places: u32,
) -> Option<Vec<Decimal>> {
    // rust_decimal carries at most 28 fractional digits.
    let unit = Decimal::new(1, decimal_places.min(28));
    let mut parts = Vec::with_capacity(bases.len());
    let mut remainders = Vec::with_capacity(bases.len());
    for base in bases {
        let share = exact_share(amount, *base, total)?;
        let floor = share.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero);
        remainders.push(share - floor);
        parts.push(floor);
    }

    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|a, b| remainders[*b].cmp(&remainders[*a]).then(a.cmp(b)));

    let mut leftover = amount.checked_sub(checked_sum(&parts)?)?;
    let mut next = 0;
    while leftover >= unit && next < order.len() {
        parts[order[next]] += unit;
        leftover -= unit;
        next += 1;
    }
    // An amount finer than `decimal_places` leaves a sub-unit tail.
    if !leftover.is_zero() {
        let i = order[next % order.len()];
        parts[i] = parts[i].checked_add(leftover)?;
    }
    Some(parts)
}

fn passthrough(record: &AppointmentRecord) -> AllocatedAppointmentLine {
    AllocatedAppointmentLine {
        id: record.id.clone(),
        appointment_date: record.appointment_date,
        service_name: record.service_name.clone(),
        mode: record.mode.clone(),
        status: record.status,
        base_amount: record.base_amount,
        platform_fee: record.platform_fee,
        service_tax: record.service_tax,
        final_amount: record.final_amount,
        ratio: Decimal::ONE,
        is_multi_service: record.is_multi_service,
        service_index: record.service_index,
        service_count: record.service_count,
        payment_method: record.payment_method.clone(),
    }
}

fn split_line(
    record: &AppointmentRecord,
    ratio: Decimal,
    fee: Decimal,
    tax: Decimal,
    final_amount: Decimal,
) -> AllocatedAppointmentLine {
    AllocatedAppointmentLine {
        platform_fee: fee,
        service_tax: tax,
        final_amount,
        ratio,
        is_multi_service: true,
        ..passthrough(record)
    }
}
