use crate::infra::{open_data_dir, parse_date, parse_level, parse_status};
use chrono::NaiveDate;
use clap::Args;
use placement::config::AppConfig;
use placement::error::AppError;
use placement::telemetry;
use placement::workflows::placement::{
    CsvPlacementStore, Internship, InternshipFilter, InternshipLevel, InternshipStatus,
    PlacementService, ReconciliationReport, StorageError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ReconcileArgs {
    /// Directory holding the CSV records (defaults to PLACEMENT_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Directory holding the CSV records (defaults to PLACEMENT_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Only postings in this status (pending, approved, rejected, filled)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<InternshipStatus>,
    /// Only postings at this level (basic, intermediate, advanced)
    #[arg(long, value_parser = parse_level)]
    pub(crate) level: Option<InternshipLevel>,
    /// Only postings preferring this major
    #[arg(long)]
    pub(crate) major: Option<String>,
    /// Only postings from this company
    #[arg(long)]
    pub(crate) company: Option<String>,
    /// Only postings closing on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) closing_before: Option<NaiveDate>,
    /// Only visible (true) or hidden (false) postings
    #[arg(long)]
    pub(crate) visible: Option<bool>,
}

impl ReportArgs {
    fn filter(&self) -> InternshipFilter {
        InternshipFilter {
            status: self.status,
            level: self.level,
            preferred_major: self.major.clone(),
            company_name: self.company.clone(),
            closing_before: self.closing_before,
            visible: self.visible,
        }
    }
}

fn resolve_data_dir(overridden: Option<PathBuf>) -> Result<(AppConfig, PathBuf), AppError> {
    let config = AppConfig::load()?;
    let data_dir = overridden.unwrap_or_else(|| config.storage.data_dir.clone());
    Ok((config, data_dir))
}

pub(crate) fn run_reconcile(args: ReconcileArgs) -> Result<(), AppError> {
    let (config, data_dir) = resolve_data_dir(args.data_dir)?;
    telemetry::init(&config.telemetry)?;

    let report = reconcile_data_dir(&data_dir)?;
    println!("Reconciliation of {}", data_dir.display());
    for line in render_reconciliation(&report) {
        println!("{line}");
    }
    Ok(())
}

/// Load the records, which reconciles them, and write back any correction.
pub(crate) fn reconcile_data_dir(root: &Path) -> Result<ReconciliationReport, StorageError> {
    let (store, report) = CsvPlacementStore::open(root)?;
    if !report.adjustments.is_empty() {
        store.flush()?;
    }
    Ok(report)
}

pub(crate) fn render_reconciliation(report: &ReconciliationReport) -> Vec<String> {
    let mut lines = vec![format!(
        "- {} internships examined | {} adjusted | {} orphaned applications",
        report.examined,
        report.adjustments.len(),
        report.orphaned.len()
    )];

    for adjustment in &report.adjustments {
        let clamp = if adjustment.clamped {
            " (clamped to slots)"
        } else {
            ""
        };
        lines.push(format!(
            "  - internship {}: confirmed {} -> {}, status {} -> {}{clamp}",
            adjustment.internship_id,
            adjustment.previous_confirmed,
            adjustment.confirmed,
            adjustment.previous_status,
            adjustment.status
        ));
    }
    for application in &report.orphaned {
        lines.push(format!(
            "  - application {} references missing internship {}",
            application.id, application.internship_id
        ));
    }
    lines
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let filter = args.filter();
    let (config, data_dir) = resolve_data_dir(args.data_dir)?;
    let data = open_data_dir(&data_dir)?;
    let service = PlacementService::new(
        Arc::new(data.store),
        Arc::new(data.directory),
        config.policy,
    );

    let internships = service.internship_report(&filter)?;
    println!(
        "Internship report for {} ({} matching)",
        data_dir.display(),
        internships.len()
    );
    for line in render_internships(&internships) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn render_internships(internships: &[Internship]) -> Vec<String> {
    internships
        .iter()
        .map(|internship| {
            let closing = internship
                .closing_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "open-ended".to_string());
            let visibility = if internship.visible() {
                "visible"
            } else {
                "hidden"
            };
            format!(
                "- #{} {} @ {} | {} | {} | {}/{} confirmed | closes {} | {}",
                internship.id,
                internship.title,
                internship.company_name,
                internship.level,
                internship.status(),
                internship.confirmed_offers(),
                internship.slots(),
                closing,
                visibility
            )
        })
        .collect()
}
