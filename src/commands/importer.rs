// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, Trim};
use tracing::info;

use crate::normalize::{RawAppointment, RawTransfer, normalize_appointment, normalize_transfer};
use crate::store::{SqliteStore, insert_appointment, insert_transfer};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("appointments", sub)) => {
            let path = path_arg(sub)?;
            let n = import_appointments(store, path)?;
            println!("Imported {} appointment lines from {}", n, path);
        }
        Some(("transfers", sub)) => {
            let path = path_arg(sub)?;
            let n = import_transfers(store, path)?;
            println!("Imported {} transfers from {}", n, path);
        }
        _ => {}
    }
    Ok(())
}

fn path_arg(sub: &clap::ArgMatches) -> Result<&str> {
    Ok(sub.get_one::<String>("path").context("--path missing")?.trim())
}

fn reader(path: &str) -> Result<csv::Reader<std::fs::File>> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))
}

fn tenant_of(row: usize, tenant_id: Option<&str>) -> Result<String> {
    tenant_id
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Row {}: tenant_id is required", row))
}

/// Imports appointment lines; either every row lands or none does.
pub fn import_appointments(store: &SqliteStore, path: &str) -> Result<usize> {
    let mut rdr = reader(path)?;
    store.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut count = 0;
        for (i, result) in rdr.deserialize::<RawAppointment>().enumerate() {
            // Line 1 is the header.
            let row = i + 2;
            let raw = result.with_context(|| format!("Row {}: malformed CSV record", row))?;
            let tenant = tenant_of(row, raw.tenant_id.as_deref())?;
            let rec = normalize_appointment(&raw).with_context(|| format!("Row {}", row))?;
            insert_appointment(&tx, &tenant, &rec)?;
            count += 1;
        }
        tx.commit()?;
        info!(path, rows = count, "imported appointments");
        Ok(count)
    })
}

pub fn import_transfers(store: &SqliteStore, path: &str) -> Result<usize> {
    let mut rdr = reader(path)?;
    store.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut count = 0;
        for (i, result) in rdr.deserialize::<RawTransfer>().enumerate() {
            let row = i + 2;
            let raw = result.with_context(|| format!("Row {}: malformed CSV record", row))?;
            let tenant = tenant_of(row, raw.tenant_id.as_deref())?;
            let t = normalize_transfer(&raw).with_context(|| format!("Row {}", row))?;
            insert_transfer(&tx, &tenant, &t)?;
            count += 1;
        }
        tx.commit()?;
        info!(path, rows = count, "imported transfers");
        Ok(count)
    })
}
