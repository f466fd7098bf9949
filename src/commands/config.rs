// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use crate::config::set_setting;
use crate::store::SqliteStore;
use crate::utils::pretty_table;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => show(store)?,
        Some(("set", sub)) => set(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn show(store: &SqliteStore) -> Result<()> {
    let cfg = store.config()?;
    println!("{}", pretty_table(&["Key", "Value"], cfg.rows()));
    Ok(())
}

fn set(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let key = sub.get_one::<String>("key").context("--key missing")?.trim();
    let value = sub.get_one::<String>("value").context("--value missing")?;
    let stored = store.with_conn(|conn| set_setting(conn, key, value))?;
    println!("{} = {}", key, stored);
    Ok(())
}
