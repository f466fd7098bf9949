// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Settleclip", "settleclip"));

/// Environment variable that points the CLI at a specific database file.
pub const DB_ENV: &str = "SETTLECLIP_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("settleclip.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates the tables the store reads from. Amounts are kept as TEXT so they
/// round-trip through `rust_decimal` without touching binary floats.
///
/// `total_amount` and `amount` are legacy spellings of the booking total some
/// upstream writers still fill instead of `final_amount`.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS appointments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id TEXT NOT NULL,
        booking_id TEXT NOT NULL,
        appointment_date TEXT NOT NULL,
        service_name TEXT NOT NULL DEFAULT '',
        mode TEXT NOT NULL,
        status TEXT NOT NULL,
        base_amount TEXT NOT NULL,
        total_booking_amount TEXT,
        platform_fee TEXT,
        service_tax TEXT,
        final_amount TEXT,
        total_amount TEXT,
        amount TEXT,
        is_multi_service INTEGER,
        service_index INTEGER,
        service_count INTEGER,
        payment_method TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_appointments_tenant_date
        ON appointments(tenant_id, appointment_date);

    CREATE TABLE IF NOT EXISTS transfers(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tenant_id TEXT NOT NULL,
        type TEXT NOT NULL,
        amount TEXT NOT NULL,
        payment_method TEXT NOT NULL DEFAULT '',
        transaction_id TEXT,
        payment_date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transfers_tenant_date
        ON transfers(tenant_id, payment_date);
    "#,
    )?;
    Ok(())
}
