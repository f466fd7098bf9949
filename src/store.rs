// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::config::SettlementConfig;
use crate::db;
use crate::models::{AppointmentRecord, TransferRecord};
use crate::normalize::{RawAppointment, RawTransfer, normalize_appointment, normalize_transfer};
use crate::sources::{AppointmentSource, TransferSource};

/// SQLite-backed appointment and transfer source.
///
/// The connection sits behind a mutex so the store can be shared with the
/// report assembler's fetch threads.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open() -> Result<Self> {
        Ok(Self::new(db::open_or_init()?))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        db::init_schema(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn with_conn<R>(&self, f: impl FnOnce(&mut Connection) -> Result<R>) -> Result<R> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))?;
        f(&mut guard)
    }

    pub fn config(&self) -> Result<SettlementConfig> {
        self.with_conn(|conn| SettlementConfig::load(conn))
    }
}

impl AppointmentSource for SqliteStore {
    fn fetch_appointments(
        &self,
        tenant_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AppointmentRecord>> {
        self.with_conn(|conn| load_appointments(conn, tenant_id, start, end))
    }
}

impl TransferSource for SqliteStore {
    fn fetch_transfers(
        &self,
        tenant_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransferRecord>> {
        self.with_conn(|conn| load_transfers(conn, tenant_id, start, end))
    }
}

pub fn load_appointments(
    conn: &Connection,
    tenant_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AppointmentRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT booking_id, appointment_date, service_name, mode, status, base_amount,
                total_booking_amount, platform_fee, service_tax, final_amount, total_amount,
                amount, is_multi_service, service_index, service_count, payment_method
         FROM appointments
         WHERE tenant_id=?1
           AND substr(appointment_date,1,10) BETWEEN date(?2,'-1 day') AND date(?3,'+1 day')
         ORDER BY appointment_date, booking_id, service_index, id",
    )?;
    let mut rows = stmt.query(params![tenant_id, start.to_string(), end.to_string()])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let raw = RawAppointment {
            tenant_id: None,
            booking_id: text(r, 0)?.unwrap_or_default(),
            appointment_date: text(r, 1)?.unwrap_or_default(),
            service_name: text(r, 2)?,
            mode: text(r, 3)?.unwrap_or_default(),
            status: text(r, 4)?.unwrap_or_default(),
            base_amount: text(r, 5)?.unwrap_or_default(),
            total_booking_amount: text(r, 6)?,
            platform_fee: text(r, 7)?,
            service_tax: text(r, 8)?,
            final_amount: text(r, 9)?,
            total_amount: text(r, 10)?,
            amount: text(r, 11)?,
            is_multi_service: text(r, 12)?,
            service_index: text(r, 13)?,
            service_count: text(r, 14)?,
            payment_method: text(r, 15)?,
        };
        let record = normalize_appointment(&raw)
            .with_context(|| format!("Normalize appointment row for tenant '{}'", tenant_id))?;
        if in_window(record.appointment_date, start, end) {
            out.push(record);
        }
    }
    debug!(tenant = tenant_id, rows = out.len(), "loaded appointments");
    Ok(out)
}

pub fn load_transfers(
    conn: &Connection,
    tenant_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TransferRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT type, amount, payment_method, transaction_id, payment_date
         FROM transfers
         WHERE tenant_id=?1
           AND substr(payment_date,1,10) BETWEEN date(?2,'-1 day') AND date(?3,'+1 day')
         ORDER BY payment_date, id",
    )?;
    let mut rows = stmt.query(params![tenant_id, start.to_string(), end.to_string()])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let raw = RawTransfer {
            tenant_id: None,
            r#type: text(r, 0)?.unwrap_or_default(),
            amount: text(r, 1)?.unwrap_or_default(),
            payment_method: text(r, 2)?,
            transaction_id: text(r, 3)?,
            payment_date: text(r, 4)?.unwrap_or_default(),
        };
        let record = normalize_transfer(&raw)
            .with_context(|| format!("Normalize transfer row for tenant '{}'", tenant_id))?;
        if in_window(record.payment_date.date_naive(), start, end) {
            out.push(record);
        }
    }
    debug!(tenant = tenant_id, rows = out.len(), "loaded transfers");
    Ok(out)
}

pub fn insert_appointment(conn: &Connection, tenant_id: &str, rec: &AppointmentRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO appointments(tenant_id, booking_id, appointment_date, service_name, mode, status,
             base_amount, total_booking_amount, platform_fee, service_tax, final_amount,
             is_multi_service, service_index, service_count, payment_method)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
        params![
            tenant_id,
            rec.id,
            rec.appointment_date.to_string(),
            rec.service_name,
            rec.mode.to_string(),
            rec.status.to_string(),
            rec.base_amount.to_string(),
            rec.total_booking_amount.to_string(),
            rec.platform_fee.to_string(),
            rec.service_tax.to_string(),
            rec.final_amount.to_string(),
            rec.is_multi_service,
            rec.service_index,
            rec.service_count,
            rec.payment_method
        ],
    )?;
    Ok(())
}

pub fn insert_transfer(conn: &Connection, tenant_id: &str, t: &TransferRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO transfers(tenant_id, type, amount, payment_method, transaction_id, payment_date)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            tenant_id,
            t.r#type.to_string(),
            t.amount.to_string(),
            t.payment_method,
            t.transaction_id,
            t.payment_date.to_rfc3339()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Stored dates keep their source offset, so SQL only narrows to the window
/// plus a day either side; the exact cut uses the normalized UTC date.
fn in_window(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    (start..=end).contains(&date)
}

/// Reads any SQLite value as text; upstream writers are not consistent about column types.
fn text(row: &Row<'_>, idx: usize) -> Result<Option<String>> {
    let v = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(
            std::str::from_utf8(t)
                .with_context(|| format!("Column {} is not valid UTF-8", idx))?
                .to_string(),
        ),
        ValueRef::Blob(_) => return Err(anyhow!("Column {} holds a blob", idx)),
    };
    Ok(v)
}
