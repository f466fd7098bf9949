// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::aggregate::aggregate;
use super::allocation::allocate;
use super::balance::settlement_totals;
use super::obligation::derive_obligations;
use super::transfers::match_transfers;
use crate::config::SettlementConfig;
use crate::error::{Result, SettlementError};
use crate::models::{AppointmentRecord, ReportLine, SettlementReport, TransferRecord};
use crate::sources::{AppointmentSource, TransferSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub tenant_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportRequest {
    pub fn new(tenant_id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            start_date,
            end_date,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(SettlementError::InvalidWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

/// Fetches a tenant's appointments and transfers and turns them into a settlement report.
pub struct ReportAssembler<'a, A: ?Sized, T: ?Sized> {
    appointments: &'a A,
    transfers: &'a T,
    config: SettlementConfig,
}

impl<'a, A, T> ReportAssembler<'a, A, T>
where
    A: AppointmentSource + Sync + ?Sized,
    T: TransferSource + Sync + ?Sized,
{
    pub fn new(appointments: &'a A, transfers: &'a T) -> Self {
        Self {
            appointments,
            transfers,
            config: SettlementConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SettlementConfig) -> Self {
        self.config = config;
        self
    }

    pub fn generate(&self, request: &ReportRequest) -> Result<SettlementReport> {
        self.generate_cancellable(request, &AtomicBool::new(false))
    }

    /// Like [`generate`](Self::generate), but gives up once `cancel` is set.
    ///
    /// Both fetches run concurrently. The flag is checked before fetching and
    /// again after both fetches have joined, so a cancelled request never
    /// reaches the derivation steps.
    pub fn generate_cancellable(
        &self,
        request: &ReportRequest,
        cancel: &AtomicBool,
    ) -> Result<SettlementReport> {
        request.validate()?;
        if cancel.load(Ordering::Acquire) {
            return Err(SettlementError::Cancelled);
        }
        info!(
            tenant = %request.tenant_id,
            start = %request.start_date,
            end = %request.end_date,
            "generating settlement report"
        );

        let appointment_source = self.appointments;
        let transfer_source = self.transfers;
        let (appointments, transfers) = thread::scope(|s| {
            let pending = s.spawn(|| {
                appointment_source.fetch_appointments(
                    &request.tenant_id,
                    request.start_date,
                    request.end_date,
                )
            });
            let transfers = transfer_source.fetch_transfers(
                &request.tenant_id,
                request.start_date,
                request.end_date,
            );
            let appointments = pending
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (appointments, transfers)
        });
        let appointments =
            appointments.map_err(|err| SettlementError::upstream("appointments", err))?;
        let transfers = transfers.map_err(|err| SettlementError::upstream("transfers", err))?;

        if cancel.load(Ordering::Acquire) {
            info!(tenant = %request.tenant_id, "settlement report cancelled after fetch");
            return Err(SettlementError::Cancelled);
        }
        build_report(request, &self.config, appointments, transfers)
    }
}

/// Convenience entry point for a store that serves both appointments and transfers.
pub fn generate_settlement_report<S>(
    source: &S,
    tenant_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<SettlementReport>
where
    S: AppointmentSource + TransferSource + Sync + ?Sized,
{
    ReportAssembler::new(source, source).generate(&ReportRequest::new(
        tenant_id, start_date, end_date,
    ))
}

/// The pure half of report generation: allocation, obligations, totals and balance.
pub fn build_report(
    request: &ReportRequest,
    config: &SettlementConfig,
    appointments: Vec<AppointmentRecord>,
    transfers: Vec<TransferRecord>,
) -> Result<SettlementReport> {
    let allocation = allocate(appointments, config.decimal_places)?;
    let lines = derive_obligations(allocation.lines)?;
    let obligations = aggregate(&lines)?;
    let transfer_totals = match_transfers(&transfers)?;
    let totals = settlement_totals(&obligations, &transfer_totals);

    info!(
        tenant = %request.tenant_id,
        lines = lines.len(),
        transfers = transfer_totals.transfer_count,
        warnings = allocation.warnings.len(),
        final_balance = %totals.final_balance,
        "settlement report ready"
    );

    Ok(SettlementReport {
        tenant_id: request.tenant_id.clone(),
        start_date: request.start_date,
        end_date: request.end_date,
        currency: config.currency.clone(),
        totals,
        lines,
        transfers,
        warnings: allocation.warnings,
    })
}

/// Search and paging over a report's lines. Purely a view: it never touches totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineQuery {
    pub search: Option<String>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for LineQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            page_size: SettlementConfig::default().page_size,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePage<'a> {
    pub page: usize,
    pub page_size: usize,
    pub total_matches: usize,
    pub total_pages: usize,
    pub lines: Vec<&'a ReportLine>,
}

impl SettlementReport {
    pub fn page(&self, query: &LineQuery) -> LinePage<'_> {
        page_lines(&self.lines, query)
    }
}

pub fn page_lines<'a>(lines: &'a [ReportLine], query: &LineQuery) -> LinePage<'a> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let matching: Vec<&ReportLine> = lines
        .iter()
        .filter(|l| needle.as_deref().is_none_or(|n| line_matches(l, n)))
        .collect();

    let page_size = query.page_size.max(1);
    let page = query.page.max(1);
    let total_matches = matching.len();
    let total_pages = total_matches.div_ceil(page_size);
    let lines = matching
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    LinePage {
        page,
        page_size,
        total_matches,
        total_pages,
        lines,
    }
}

fn line_matches(entry: &ReportLine, needle: &str) -> bool {
    let l = &entry.line;
    [
        l.id.as_str(),
        l.service_name.as_str(),
        l.payment_method.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
        || l.mode.to_string().to_lowercase().contains(needle)
        || l.status.to_string().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BalanceDirection, Mode, Status, TransferType};
    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;

    struct Fixed {
        appointments: Vec<AppointmentRecord>,
        transfers: Vec<TransferRecord>,
        fetches: AtomicUsize,
    }

    impl Fixed {
        fn new(appointments: Vec<AppointmentRecord>, transfers: Vec<TransferRecord>) -> Self {
            Self {
                appointments,
                transfers,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl AppointmentSource for Fixed {
        fn fetch_appointments(
            &self,
            _tenant_id: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> anyhow::Result<Vec<AppointmentRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.appointments.clone())
        }
    }

    impl TransferSource for Fixed {
        fn fetch_transfers(
            &self,
            _tenant_id: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> anyhow::Result<Vec<TransferRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.transfers.clone())
        }
    }

    struct Broken;

    impl TransferSource for Broken {
        fn fetch_transfers(
            &self,
            _tenant_id: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> anyhow::Result<Vec<TransferRecord>> {
            Err(anyhow!("payments service unavailable"))
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn appt(id: &str, mode: Mode, status: Status) -> AppointmentRecord {
        AppointmentRecord {
            id: id.into(),
            appointment_date: day(10),
            service_name: "Manicure".into(),
            mode,
            status,
            base_amount: dec!(1000),
            total_booking_amount: dec!(1000),
            platform_fee: dec!(50),
            service_tax: dec!(20),
            final_amount: dec!(1070),
            is_multi_service: false,
            service_index: 0,
            service_count: 1,
            payment_method: "card".into(),
        }
    }

    fn request() -> ReportRequest {
        ReportRequest::new("vendor-1", day(1), day(31))
    }

    #[test]
    fn assembles_totals_from_both_sources() {
        let source = Fixed::new(
            vec![
                appt("A1", Mode::Online, Status::Completed),
                appt("A2", Mode::Offline, Status::Completed),
                appt("A3", Mode::Online, Status::Cancelled),
            ],
            vec![TransferRecord {
                r#type: TransferType::PaymentToVendor,
                amount: dec!(600),
                payment_method: "neft".into(),
                transaction_id: Some("T-1".into()),
                payment_date: Utc.with_ymd_and_hms(2025, 1, 20, 9, 30, 0).unwrap(),
            }],
        );
        let report = ReportAssembler::new(&source, &source)
            .generate(&request())
            .unwrap();
        let t = &report.totals;
        assert_eq!(t.total_admin_owes_vendor, dec!(1000));
        assert_eq!(t.total_vendor_owes_admin, dec!(70));
        assert_eq!(t.total_platform_fee, dec!(100));
        assert_eq!(t.total_tax_amount, dec!(40));
        assert_eq!(t.total_transferred_to_vendor, dec!(600));
        // (1000 - 600) - (70 - 0)
        assert_eq!(t.final_balance, dec!(330));
        assert_eq!(t.balance_direction, BalanceDirection::AdminOwesVendor);
        assert_eq!(t.appointment_count, 2);
        assert_eq!(report.lines.len(), 3);
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn upstream_failure_returns_no_report() {
        let appointments = Fixed::new(vec![appt("A1", Mode::Online, Status::Completed)], vec![]);
        let err = ReportAssembler::new(&appointments, &Broken)
            .generate(&request())
            .unwrap_err();
        match err {
            SettlementError::UpstreamFetch { what, source } => {
                assert_eq!(what, "transfers");
                assert!(source.to_string().contains("unavailable"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn invalid_mode_fails_the_whole_report() {
        let source = Fixed::new(
            vec![
                appt("A1", Mode::Online, Status::Completed),
                appt("A2", Mode::from("crypto"), Status::Completed),
            ],
            vec![],
        );
        let err = generate_settlement_report(&source, "vendor-1", day(1), day(31)).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidMode { .. }));
    }

    #[test]
    fn inverted_window_is_rejected_before_fetching() {
        let source = Fixed::new(vec![], vec![]);
        let err = ReportAssembler::new(&source, &source)
            .generate(&ReportRequest::new("vendor-1", day(20), day(2)))
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidWindow { .. }));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancelled_request_skips_fetching() {
        let source = Fixed::new(vec![appt("A1", Mode::Online, Status::Completed)], vec![]);
        let cancel = AtomicBool::new(true);
        let err = ReportAssembler::new(&source, &source)
            .generate_cancellable(&request(), &cancel)
            .unwrap_err();
        assert!(matches!(err, SettlementError::Cancelled));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn degenerate_booking_is_reported_as_warning() {
        let mut first = appt("M1", Mode::Offline, Status::Completed);
        first.is_multi_service = true;
        first.service_count = 2;
        first.base_amount = Decimal::ZERO;
        first.total_booking_amount = Decimal::ZERO;
        let mut second = first.clone();
        second.service_index = 1;
        let source = Fixed::new(vec![first, second], vec![]);
        let report = generate_settlement_report(&source, "vendor-1", day(1), day(31)).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.bookings_needing_review(), 1);
        assert!(report.totals.total_platform_fee.is_zero());
        assert!(report.totals.total_vendor_owes_admin.is_zero());
    }

    #[test]
    fn paging_and_search_leave_totals_alone() {
        let appointments: Vec<_> = (0..7)
            .map(|i| {
                let mut a = appt(&format!("A{}", i), Mode::Online, Status::Completed);
                if i % 2 == 0 {
                    a.service_name = "Pedicure".into();
                }
                a
            })
            .collect();
        let source = Fixed::new(appointments, vec![]);
        let report = generate_settlement_report(&source, "vendor-1", day(1), day(31)).unwrap();
        let before = report.totals.clone();

        let page = report.page(&LineQuery {
            search: Some("pedi".into()),
            page: 2,
            page_size: 3,
        });
        assert_eq!(page.total_matches, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.lines.len(), 1);
        assert_eq!(page.lines[0].line.id, "A6");

        let all = report.page(&LineQuery {
            search: None,
            page: 1,
            page_size: 100,
        });
        assert_eq!(all.lines.len(), 7);
        assert_eq!(report.totals, before);
        assert_eq!(before.total_admin_owes_vendor, dec!(7000));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let source = Fixed::new(vec![appt("A1", Mode::Online, Status::Completed)], vec![]);
        let report = generate_settlement_report(&source, "vendor-1", day(1), day(31)).unwrap();
        let page = report.page(&LineQuery {
            search: None,
            page: 5,
            page_size: 10,
        });
        assert!(page.lines.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
