// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod config;
pub mod doctor;
pub mod importer;
pub mod reports;
pub mod transfers;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use crate::utils::parse_date;

/// Tenant and inclusive date window shared by the windowed subcommands.
pub(crate) struct Window {
    pub tenant: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub(crate) fn window(sub: &clap::ArgMatches) -> Result<Window> {
    let tenant = sub
        .get_one::<String>("tenant")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("--tenant must not be empty"))?;
    let from = sub.get_one::<String>("from").context("--from missing")?;
    let to = sub.get_one::<String>("to").context("--to missing")?;
    Ok(Window {
        tenant,
        from: parse_date(from)?,
        to: parse_date(to)?,
    })
}
