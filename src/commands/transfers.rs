// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use super::window;
use crate::models::TransferRecord;
use crate::normalize::{RawTransfer, normalize_transfer};
use crate::sources::TransferSource;
use crate::store::{SqliteStore, insert_transfer};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let tenant = sub.get_one::<String>("tenant").context("--tenant missing")?.trim();
    let raw = RawTransfer {
        tenant_id: Some(tenant.to_string()),
        r#type: sub.get_one::<String>("type").cloned().unwrap_or_default(),
        amount: sub.get_one::<String>("amount").cloned().unwrap_or_default(),
        payment_method: sub.get_one::<String>("method").cloned(),
        transaction_id: sub.get_one::<String>("reference").cloned(),
        payment_date: sub.get_one::<String>("date").cloned().unwrap_or_default(),
    };
    let t = normalize_transfer(&raw)?;
    let cfg = store.config()?;
    let id = store.with_conn(|conn| insert_transfer(conn, tenant, &t))?;
    println!(
        "Recorded transfer #{}: {} {} on {} (tenant: {})",
        id,
        t.r#type,
        fmt_money(&t.amount, &cfg.currency),
        t.payment_date.format("%Y-%m-%d %H:%M:%S"),
        tenant
    );
    Ok(())
}

fn list(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(store, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let cfg = store.config()?;
        println!("{}", transfer_table(&data, &cfg.currency));
    }
    Ok(())
}

pub fn query_rows(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<Vec<TransferRecord>> {
    let w = window(sub)?;
    store.fetch_transfers(&w.tenant, w.from, w.to)
}

pub(crate) fn transfer_table(data: &[TransferRecord], ccy: &str) -> comfy_table::Table {
    let rows = data
        .iter()
        .map(|t| {
            vec![
                t.payment_date.format("%Y-%m-%d %H:%M").to_string(),
                t.r#type.to_string(),
                fmt_money(&t.amount, ccy),
                t.payment_method.clone(),
                t.transaction_id.clone().unwrap_or_default(),
            ]
        })
        .collect();
    pretty_table(&["Paid", "Type", "Amount", "Method", "Reference"], rows)
}
