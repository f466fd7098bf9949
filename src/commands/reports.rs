// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use super::transfers::transfer_table;
use super::window;
use crate::models::{SettlementReport, SettlementWarning};
use crate::settlement::{LineQuery, ReportAssembler, ReportRequest};
use crate::store::SqliteStore;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("settlement", sub)) => settlement(store, sub)?,
        _ => {}
    }
    Ok(())
}

/// Runs the settlement report for the tenant and window given on the command line.
pub fn settlement_report(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<SettlementReport> {
    let w = window(sub)?;
    // Settings are read before generation; the fetch threads need the connection lock.
    let cfg = store.config()?;
    let request = ReportRequest::new(w.tenant.clone(), w.from, w.to);
    ReportAssembler::new(store, store)
        .with_config(cfg)
        .generate(&request)
        .with_context(|| format!("Settlement report for tenant '{}'", w.tenant))
}

pub fn line_query(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<LineQuery> {
    let page_size = match sub.get_one::<usize>("page-size") {
        Some(n) => *n,
        None => store.config()?.page_size,
    };
    Ok(LineQuery {
        search: sub.get_one::<String>("search").cloned(),
        page: *sub.get_one::<usize>("page").unwrap_or(&1),
        page_size,
    })
}

fn settlement(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let report = settlement_report(store, sub)?;
    let query = line_query(store, sub)?;
    let page = report.page(&query);

    if json_flag {
        return maybe_print_json(true, false, &report).map(|_| ());
    }
    if jsonl_flag {
        return maybe_print_json(false, true, &page.lines).map(|_| ());
    }

    let ccy = report.currency.as_str();
    let t = &report.totals;
    println!(
        "Settlement for {} from {} to {}",
        report.tenant_id, report.start_date, report.end_date
    );
    let summary = vec![
        vec!["Admin owes vendor".into(), fmt_money(&t.total_admin_owes_vendor, ccy)],
        vec!["Vendor owes admin".into(), fmt_money(&t.total_vendor_owes_admin, ccy)],
        vec!["Platform fees".into(), fmt_money(&t.total_platform_fee, ccy)],
        vec!["Service tax".into(), fmt_money(&t.total_tax_amount, ccy)],
        vec!["Transferred to vendor".into(), fmt_money(&t.total_transferred_to_vendor, ccy)],
        vec!["Transferred to admin".into(), fmt_money(&t.total_transferred_to_admin, ccy)],
        vec![
            "Final balance".into(),
            format!("{} ({})", fmt_money(&t.final_balance, ccy), t.balance_direction),
        ],
        vec!["Appointments".into(), t.appointment_count.to_string()],
        vec!["Service lines".into(), t.line_count.to_string()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], summary));

    if page.total_matches == 0 {
        println!("No service lines match.");
    } else {
        let rows = page
            .lines
            .iter()
            .map(|rl| {
                let l = &rl.line;
                vec![
                    l.id.clone(),
                    l.appointment_date.to_string(),
                    l.service_name.clone(),
                    l.mode.to_string(),
                    l.status.to_string(),
                    fmt_money(&l.base_amount, ccy),
                    fmt_money(&l.platform_fee, ccy),
                    fmt_money(&l.service_tax, ccy),
                    fmt_money(&rl.obligation.admin_owes_vendor, ccy),
                    fmt_money(&rl.obligation.vendor_owes_admin, ccy),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Booking", "Date", "Service", "Mode", "Status", "Base", "Fee", "Tax",
                    "Admin owes", "Vendor owes",
                ],
                rows,
            )
        );
        println!(
            "Page {} of {} ({} matching lines)",
            page.page, page.total_pages, page.total_matches
        );
    }

    if !report.transfers.is_empty() {
        println!("{}", transfer_table(&report.transfers, ccy));
    }

    let flagged = report.bookings_needing_review();
    if flagged > 0 {
        println!("⚠ {} booking(s) need review", flagged);
        let rows = report
            .warnings
            .iter()
            .map(|w| vec![w.booking_id().to_string(), describe(w)])
            .collect();
        println!("{}", pretty_table(&["Booking", "Issue"], rows));
    }
    Ok(())
}

fn describe(w: &SettlementWarning) -> String {
    match w {
        SettlementWarning::DegenerateAllocation { lines, .. } => format!(
            "booking total is zero; fee and tax not allocated across {} lines",
            lines
        ),
        SettlementWarning::UnbalancedBooking {
            base_sum,
            total_booking_amount,
            ..
        } => format!(
            "line base amounts sum to {} but booking total is {}",
            base_sum, total_booking_amount
        ),
    }
}
