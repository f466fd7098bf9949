// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where the client paid. Online bookings are collected by the platform,
/// offline bookings by the vendor at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    Online,
    Offline,
    /// Kept verbatim so the obligation step can reject it with the offending value.
    Unrecognized(String),
}

impl From<&str> for Mode {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "online" => Mode::Online,
            "offline" => Mode::Offline,
            _ => Mode::Unrecognized(raw.trim().to_string()),
        }
    }
}

impl From<String> for Mode {
    fn from(raw: String) -> Self {
        Mode::from(raw.as_str())
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Online => f.write_str("online"),
            Mode::Offline => f.write_str("offline"),
            Mode::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Completed,
    Cancelled,
    Pending,
    Confirmed,
    Scheduled,
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(Status::Completed),
            "cancelled" | "canceled" => Ok(Status::Cancelled),
            "pending" => Ok(Status::Pending),
            "confirmed" => Ok(Status::Confirmed),
            "scheduled" => Ok(Status::Scheduled),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
            Status::Pending => "pending",
            Status::Confirmed => "confirmed",
            Status::Scheduled => "scheduled",
        };
        f.write_str(s)
    }
}

/// One service line of a booking, as handed over by the booking subsystem.
///
/// `platform_fee`, `service_tax`, `final_amount` and `total_booking_amount`
/// are booking-level values repeated on every line of a multi-service booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub id: String,
    pub appointment_date: NaiveDate,
    pub service_name: String,
    pub mode: Mode,
    pub status: Status,
    pub base_amount: Decimal,
    pub total_booking_amount: Decimal,
    pub platform_fee: Decimal,
    pub service_tax: Decimal,
    pub final_amount: Decimal,
    pub is_multi_service: bool,
    pub service_index: u32,
    pub service_count: u32,
    pub payment_method: String,
}

/// A service line after the booking's fee and tax were split across its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedAppointmentLine {
    pub id: String,
    pub appointment_date: NaiveDate,
    pub service_name: String,
    pub mode: Mode,
    pub status: Status,
    pub base_amount: Decimal,
    pub platform_fee: Decimal,
    pub service_tax: Decimal,
    pub final_amount: Decimal,
    /// Share of the booking carried by this line (`base / totalBookingAmount`).
    pub ratio: Decimal,
    pub is_multi_service: bool,
    pub service_index: u32,
    pub service_count: u32,
    pub payment_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationRecord {
    pub admin_owes_vendor: Decimal,
    pub vendor_owes_admin: Decimal,
}

impl ObligationRecord {
    pub const ZERO: ObligationRecord = ObligationRecord {
        admin_owes_vendor: Decimal::ZERO,
        vendor_owes_admin: Decimal::ZERO,
    };

    pub fn is_zero(&self) -> bool {
        self.admin_owes_vendor.is_zero() && self.vendor_owes_admin.is_zero()
    }
}

/// An allocated line together with the obligation derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    #[serde(flatten)]
    pub line: AllocatedAppointmentLine,
    #[serde(flatten)]
    pub obligation: ObligationRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    PaymentToVendor,
    PaymentToAdmin,
}

impl FromStr for TransferType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "payment_to_vendor" | "to_vendor" => Ok(TransferType::PaymentToVendor),
            "payment_to_admin" | "to_admin" => Ok(TransferType::PaymentToAdmin),
            other => Err(format!("unknown transfer type '{}'", other)),
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::PaymentToVendor => f.write_str("payment_to_vendor"),
            TransferType::PaymentToAdmin => f.write_str("payment_to_admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    #[serde(rename = "type")]
    pub r#type: TransferType,
    pub amount: Decimal,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceDirection {
    AdminOwesVendor,
    VendorOwesAdmin,
    Settled,
}

impl fmt::Display for BalanceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceDirection::AdminOwesVendor => f.write_str("admin owes vendor"),
            BalanceDirection::VendorOwesAdmin => f.write_str("vendor owes admin"),
            BalanceDirection::Settled => f.write_str("settled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementTotals {
    pub total_admin_owes_vendor: Decimal,
    pub total_vendor_owes_admin: Decimal,
    pub total_platform_fee: Decimal,
    pub total_tax_amount: Decimal,
    pub total_transferred_to_vendor: Decimal,
    pub total_transferred_to_admin: Decimal,
    /// Positive when the platform still owes the vendor, negative when the vendor owes the platform.
    pub final_balance: Decimal,
    pub balance_direction: BalanceDirection,
    /// Distinct completed bookings; service lines of one booking count once.
    pub appointment_count: usize,
    pub line_count: usize,
}

/// Data-quality findings that do not abort a report but need an operator's eye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementWarning {
    /// Multi-service booking whose `totalBookingAmount` is zero; its fee and tax were not allocated.
    DegenerateAllocation { booking_id: String, lines: usize },
    /// Line base amounts do not add up to `totalBookingAmount`, so fee conservation cannot hold.
    UnbalancedBooking {
        booking_id: String,
        base_sum: Decimal,
        total_booking_amount: Decimal,
    },
}

impl SettlementWarning {
    pub fn booking_id(&self) -> &str {
        match self {
            SettlementWarning::DegenerateAllocation { booking_id, .. }
            | SettlementWarning::UnbalancedBooking { booking_id, .. } => booking_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub tenant_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub currency: String,
    pub totals: SettlementTotals,
    pub lines: Vec<ReportLine>,
    pub transfers: Vec<TransferRecord>,
    pub warnings: Vec<SettlementWarning>,
}

impl SettlementReport {
    /// Number of distinct bookings flagged for review.
    pub fn bookings_needing_review(&self) -> usize {
        let mut ids: Vec<&str> = self.warnings.iter().map(|w| w.booking_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
