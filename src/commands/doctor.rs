// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::window;
use crate::settlement::review::{BookingIssue, review_bookings};
use crate::sources::AppointmentSource;
use crate::store::SqliteStore;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let issues = find_issues(store, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.booking_id, i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Booking", "Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn find_issues(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<Vec<BookingIssue>> {
    let w = window(sub)?;
    let records = store.fetch_appointments(&w.tenant, w.from, w.to)?;
    Ok(review_bookings(records))
}
