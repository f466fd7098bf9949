// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turns loosely-shaped upstream rows into the engine's strict records.
//!
//! Everything that reads raw appointment or transfer data (the SQLite store,
//! the CSV importer) goes through here, so fallback rules live in one place.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Result, SettlementError};
use crate::models::{AppointmentRecord, Mode, Status, TransferRecord, TransferType};
use crate::utils::parse_timestamp;

/// Largest money value accepted from a source (10^15). Sums and products of
/// amounts this size stay well inside `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAppointment {
    pub tenant_id: Option<String>,
    #[serde(alias = "id")]
    pub booking_id: String,
    #[serde(alias = "date")]
    pub appointment_date: String,
    #[serde(alias = "service")]
    pub service_name: Option<String>,
    pub mode: String,
    pub status: String,
    pub base_amount: String,
    pub total_booking_amount: Option<String>,
    pub platform_fee: Option<String>,
    pub service_tax: Option<String>,
    pub final_amount: Option<String>,
    pub total_amount: Option<String>,
    pub amount: Option<String>,
    pub is_multi_service: Option<String>,
    pub service_index: Option<String>,
    pub service_count: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTransfer {
    pub tenant_id: Option<String>,
    #[serde(alias = "transfer_type")]
    pub r#type: String,
    pub amount: String,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    #[serde(alias = "date")]
    pub payment_date: String,
}

/// Normalizes one appointment row.
///
/// Rules: fee and tax default to zero; `serviceCount` defaults to 1 and
/// `isMultiService` to `serviceCount > 1`; a single-service line without a
/// booking total uses its base amount; the booking's final amount is the
/// first of `final_amount`, `total_amount`, `amount`, otherwise
/// `total + fee + tax`. Unknown modes are kept so the engine can reject them.
pub fn normalize_appointment(raw: &RawAppointment) -> Result<AppointmentRecord> {
    let id = raw.booking_id.trim();
    if id.is_empty() {
        return Err(SettlementError::invalid_record(
            "<unknown booking>",
            "booking id is required",
        ));
    }
    let invalid = |reason: String| SettlementError::invalid_record(id, reason);

    let appointment_date = parse_day(&raw.appointment_date)
        .ok_or_else(|| invalid(format!("invalid appointment date '{}'", raw.appointment_date)))?;
    let status: Status = raw.status.parse().map_err(invalid)?;
    let mode = Mode::from(raw.mode.as_str());

    let base_amount = amount(id, "base_amount", Some(raw.base_amount.as_str()))?
        .ok_or_else(|| invalid("base_amount is required".to_string()))?;
    let platform_fee = amount(id, "platform_fee", raw.platform_fee.as_deref())?.unwrap_or_default();
    let service_tax = amount(id, "service_tax", raw.service_tax.as_deref())?.unwrap_or_default();

    let service_count = match non_empty(raw.service_count.as_deref()) {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| invalid(format!("invalid service_count '{}'", s)))?,
        None => 1,
    };
    if service_count == 0 {
        return Err(invalid("service_count must be at least 1".to_string()));
    }
    let service_index = match non_empty(raw.service_index.as_deref()) {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| invalid(format!("invalid service_index '{}'", s)))?,
        None => 0,
    };
    let is_multi_service = match non_empty(raw.is_multi_service.as_deref()) {
        Some(s) => parse_flag(s).ok_or_else(|| invalid(format!("invalid is_multi_service '{}'", s)))?,
        None => service_count > 1,
    };

    let total_booking_amount =
        match amount(id, "total_booking_amount", raw.total_booking_amount.as_deref())? {
            Some(total) => total,
            None if !is_multi_service => base_amount,
            None => {
                return Err(invalid(
                    "multi-service line is missing total_booking_amount".to_string(),
                ));
            }
        };

    let final_amount = [
        ("final_amount", raw.final_amount.as_deref()),
        ("total_amount", raw.total_amount.as_deref()),
        ("amount", raw.amount.as_deref()),
    ]
    .into_iter()
    .map(|(field, value)| amount(id, field, value))
    .find_map(|parsed| parsed.transpose())
    .transpose()?
    .unwrap_or(total_booking_amount + platform_fee + service_tax);

    Ok(AppointmentRecord {
        id: id.to_string(),
        appointment_date,
        service_name: raw.service_name.as_deref().unwrap_or("").trim().to_string(),
        mode,
        status,
        base_amount,
        total_booking_amount,
        platform_fee,
        service_tax,
        final_amount,
        is_multi_service,
        service_index,
        service_count,
        payment_method: raw.payment_method.as_deref().unwrap_or("").trim().to_string(),
    })
}

pub fn normalize_transfer(raw: &RawTransfer) -> Result<TransferRecord> {
    let transaction_id = non_empty(raw.transaction_id.as_deref()).map(str::to_string);
    let label = transaction_id
        .clone()
        .unwrap_or_else(|| format!("transfer on {}", raw.payment_date.trim()));
    let invalid = |reason: String| SettlementError::invalid_record(label.as_str(), reason);

    let r#type: TransferType = raw.r#type.parse().map_err(invalid)?;
    let amount = amount(&label, "amount", Some(raw.amount.as_str()))?
        .ok_or_else(|| invalid("amount is required".to_string()))?;
    let payment_date = parse_timestamp(&raw.payment_date)
        .map_err(|_| invalid(format!("invalid payment date '{}'", raw.payment_date)))?;

    Ok(TransferRecord {
        r#type,
        amount,
        payment_method: raw.payment_method.as_deref().unwrap_or("").trim().to_string(),
        transaction_id,
        payment_date,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn amount(record: &str, field: &str, value: Option<&str>) -> Result<Option<Decimal>> {
    let Some(s) = non_empty(value) else {
        return Ok(None);
    };
    let parsed = s.parse::<Decimal>().map_err(|_| {
        SettlementError::invalid_record(record, format!("invalid {} '{}'", field, s))
    })?;
    if parsed.is_sign_negative() && !parsed.is_zero() {
        return Err(SettlementError::invalid_record(
            record,
            format!("{} must not be negative, got {}", field, parsed),
        ));
    }
    if parsed > MAX_AMOUNT {
        return Err(SettlementError::invalid_record(
            record,
            format!("{} exceeds {}, got {}", field, MAX_AMOUNT, parsed),
        ));
    }
    Ok(Some(parsed))
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).ok().map(|ts| ts.date_naive()))
}
