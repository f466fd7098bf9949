// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::AtomicBool;

use chrono::NaiveDate;
use rusqlite::params;
use rust_decimal_macros::dec;
use settleclip::config::{SettlementConfig, set_setting};
use settleclip::models::{BalanceDirection, SettlementWarning};
use settleclip::settlement::{LineQuery, ReportAssembler, ReportRequest};
use settleclip::store::SqliteStore;
use settleclip::{SettlementError, generate_settlement_report};

struct Line<'a> {
    tenant: &'a str,
    id: &'a str,
    date: &'a str,
    service: &'a str,
    mode: &'a str,
    status: &'a str,
    base: &'a str,
    total: &'a str,
    fee: &'a str,
    tax: &'a str,
    index: u32,
    count: u32,
}

impl Default for Line<'_> {
    fn default() -> Self {
        Line {
            tenant: "salon-1",
            id: "B1",
            date: "2025-03-10",
            service: "Haircut",
            mode: "online",
            status: "completed",
            base: "1000",
            total: "1000",
            fee: "50",
            tax: "20",
            index: 0,
            count: 1,
        }
    }
}

fn add(store: &SqliteStore, l: Line<'_>) {
    store
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO appointments(tenant_id, booking_id, appointment_date, service_name, mode,
                     status, base_amount, total_booking_amount, platform_fee, service_tax,
                     service_index, service_count, payment_method)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,'upi')",
                params![
                    l.tenant, l.id, l.date, l.service, l.mode, l.status, l.base, l.total, l.fee,
                    l.tax, l.index, l.count
                ],
            )?;
            Ok(())
        })
        .unwrap();
}

fn transfer(store: &SqliteStore, kind: &str, amount: &str, date: &str) {
    store
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO transfers(tenant_id, type, amount, payment_method, payment_date)
                 VALUES ('salon-1', ?1, ?2, 'neft', ?3)",
                params![kind, amount, date],
            )?;
            Ok(())
        })
        .unwrap();
}

fn march() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
    )
}

#[test]
fn online_single_service_pays_vendor_its_net_share() {
    let store = SqliteStore::in_memory().unwrap();
    add(&store, Line::default());
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    let t = &report.totals;
    assert_eq!(t.total_admin_owes_vendor, dec!(1000));
    assert_eq!(t.total_vendor_owes_admin, dec!(0));
    assert_eq!(t.total_platform_fee, dec!(50));
    assert_eq!(t.total_tax_amount, dec!(20));
    assert_eq!(t.final_balance, dec!(1000));
    assert_eq!(t.balance_direction, BalanceDirection::AdminOwesVendor);
    assert_eq!(report.lines[0].line.final_amount, dec!(1070));
}

#[test]
fn offline_single_service_owes_platform_fee_and_tax() {
    let store = SqliteStore::in_memory().unwrap();
    add(
        &store,
        Line {
            mode: "offline",
            ..Line::default()
        },
    );
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    assert_eq!(report.totals.total_vendor_owes_admin, dec!(70));
    assert_eq!(report.totals.total_admin_owes_vendor, dec!(0));
    assert_eq!(report.totals.final_balance, dec!(-70));
    assert_eq!(report.totals.balance_direction, BalanceDirection::VendorOwesAdmin);
}

#[test]
fn multi_service_booking_splits_fee_by_base_amount() {
    let store = SqliteStore::in_memory().unwrap();
    for (index, service, base) in [(0, "Haircut", "600"), (1, "Facial", "400")] {
        add(
            &store,
            Line {
                service,
                base,
                tax: "0",
                index,
                count: 2,
                ..Line::default()
            },
        );
    }
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    let fees: Vec<_> = report.lines.iter().map(|l| l.line.platform_fee).collect();
    assert_eq!(fees, vec![dec!(30), dec!(20)]);
    assert_eq!(report.totals.total_platform_fee, dec!(50));
    assert_eq!(report.totals.total_admin_owes_vendor, dec!(1000));
    assert_eq!(report.totals.appointment_count, 1);
    assert_eq!(report.totals.line_count, 2);
    assert!(report.warnings.is_empty());
}

#[test]
fn three_way_split_conserves_fee_at_configured_precision() {
    let store = SqliteStore::in_memory().unwrap();
    for index in 0..3 {
        add(
            &store,
            Line {
                base: "100",
                total: "300",
                fee: "10",
                tax: "0",
                index,
                count: 3,
                ..Line::default()
            },
        );
    }
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    let fees: Vec<_> = report.lines.iter().map(|l| l.line.platform_fee).collect();
    assert_eq!(fees, vec![dec!(3.34), dec!(3.33), dec!(3.33)]);

    store
        .with_conn(|conn| set_setting(conn, "decimal_places", "3").map(|_| ()))
        .unwrap();
    let cfg = store.config().unwrap();
    let request = ReportRequest::new("salon-1", from, to);
    let report = ReportAssembler::new(&store, &store)
        .with_config(cfg)
        .generate(&request)
        .unwrap();
    let fees: Vec<_> = report.lines.iter().map(|l| l.line.platform_fee).collect();
    assert_eq!(fees, vec![dec!(3.334), dec!(3.333), dec!(3.333)]);
}

#[test]
fn transfers_net_against_obligations() {
    let store = SqliteStore::in_memory().unwrap();
    add(&store, Line::default());
    add(
        &store,
        Line {
            id: "B2",
            mode: "offline",
            base: "2000",
            total: "2000",
            fee: "150",
            tax: "50",
            ..Line::default()
        },
    );
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    assert_eq!(report.totals.final_balance, dec!(800));

    transfer(&store, "payment_to_vendor", "500", "2025-03-15T10:00:00Z");
    transfer(&store, "payment_to_admin", "200", "2025-03-20");
    // Outside the window.
    transfer(&store, "payment_to_vendor", "999", "2025-04-01");

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    assert_eq!(report.transfers.len(), 2);
    assert_eq!(report.totals.total_transferred_to_vendor, dec!(500));
    assert_eq!(report.totals.total_transferred_to_admin, dec!(200));
    assert_eq!(report.totals.final_balance, dec!(500));

    transfer(&store, "payment_to_vendor", "500", "2025-03-31 23:00:00");
    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    assert_eq!(report.totals.final_balance, dec!(0));
    assert_eq!(report.totals.balance_direction, BalanceDirection::Settled);
}

#[test]
fn non_completed_lines_are_listed_but_owe_nothing() {
    let store = SqliteStore::in_memory().unwrap();
    add(&store, Line::default());
    add(
        &store,
        Line {
            id: "B2",
            status: "cancelled",
            base: "500",
            total: "500",
            ..Line::default()
        },
    );
    add(
        &store,
        Line {
            id: "B3",
            status: "pending",
            mode: "voucher",
            ..Line::default()
        },
    );
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    assert_eq!(report.lines.len(), 3);
    assert!(report.lines[1].obligation.is_zero());
    assert!(report.lines[2].obligation.is_zero());
    assert_eq!(report.totals.total_admin_owes_vendor, dec!(1000));
    assert_eq!(report.totals.total_platform_fee, dec!(50));
    assert_eq!(report.totals.appointment_count, 1);
}

#[test]
fn other_tenants_and_dates_are_ignored() {
    let store = SqliteStore::in_memory().unwrap();
    add(&store, Line::default());
    add(
        &store,
        Line {
            tenant: "salon-2",
            id: "X1",
            ..Line::default()
        },
    );
    add(
        &store,
        Line {
            id: "B9",
            date: "2025-02-28",
            ..Line::default()
        },
    );
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    assert_eq!(report.lines.len(), 1);
    assert_eq!(report.lines[0].line.id, "B1");
}

#[test]
fn completed_line_with_unknown_mode_fails_the_report() {
    let store = SqliteStore::in_memory().unwrap();
    add(
        &store,
        Line {
            mode: "wallet",
            ..Line::default()
        },
    );
    let (from, to) = march();

    let err = generate_settlement_report(&store, "salon-1", from, to).unwrap_err();
    match err {
        SettlementError::InvalidMode { booking_id, mode } => {
            assert_eq!(booking_id, "B1");
            assert_eq!(mode, "wallet");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reversed_window_is_rejected() {
    let store = SqliteStore::in_memory().unwrap();
    let (from, to) = march();
    let err = generate_settlement_report(&store, "salon-1", to, from).unwrap_err();
    assert!(matches!(err, SettlementError::InvalidWindow { .. }));
}

#[test]
fn cancelled_request_produces_no_report() {
    let store = SqliteStore::in_memory().unwrap();
    add(&store, Line::default());
    let (from, to) = march();
    let cancel = AtomicBool::new(true);
    let err = ReportAssembler::new(&store, &store)
        .generate_cancellable(&ReportRequest::new("salon-1", from, to), &cancel)
        .unwrap_err();
    assert!(matches!(err, SettlementError::Cancelled));
}

#[test]
fn broken_rows_surface_as_upstream_failures() {
    let store = SqliteStore::in_memory().unwrap();
    add(
        &store,
        Line {
            base: "ten",
            ..Line::default()
        },
    );
    let (from, to) = march();
    let err = generate_settlement_report(&store, "salon-1", from, to).unwrap_err();
    match err {
        SettlementError::UpstreamFetch { what, .. } => assert_eq!(what, "appointments"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unbalanced_booking_is_flagged_for_review() {
    let store = SqliteStore::in_memory().unwrap();
    for (index, base) in [(0, "600"), (1, "300")] {
        add(
            &store,
            Line {
                base,
                index,
                count: 2,
                ..Line::default()
            },
        );
    }
    let (from, to) = march();

    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();
    assert_eq!(report.bookings_needing_review(), 1);
    assert!(matches!(
        &report.warnings[0],
        SettlementWarning::UnbalancedBooking { booking_id, .. } if booking_id == "B1"
    ));
    // Report still produced; lines keep their proportional shares.
    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.lines[0].line.platform_fee, dec!(30));
    assert_eq!(report.lines[1].line.platform_fee, dec!(15));
}

#[test]
fn paging_and_search_leave_totals_alone() {
    let store = SqliteStore::in_memory().unwrap();
    let ids = ["B1", "B2", "B3", "B4", "B5"];
    for (i, id) in ids.into_iter().enumerate() {
        add(
            &store,
            Line {
                id,
                service: if i % 2 == 0 { "Haircut" } else { "Facial" },
                ..Line::default()
            },
        );
    }
    let (from, to) = march();
    let report = generate_settlement_report(&store, "salon-1", from, to).unwrap();

    let page = report.page(&LineQuery {
        search: None,
        page: 3,
        page_size: 2,
    });
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.total_matches, 5);
    assert_eq!(page.lines.len(), 1);
    assert_eq!(page.lines[0].line.id, "B5");

    let page = report.page(&LineQuery {
        search: Some("FACIAL".into()),
        page: 1,
        page_size: SettlementConfig::default().page_size,
    });
    let found: Vec<_> = page.lines.iter().map(|l| l.line.id.as_str()).collect();
    assert_eq!(found, vec!["B2", "B4"]);
    assert_eq!(report.totals.total_admin_owes_vendor, dec!(5000));
}
