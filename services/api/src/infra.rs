use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use placement::workflows::placement::{
    CsvDirectory, CsvPlacementStore, InternshipLevel, InternshipStatus, ReconciliationReport,
    StorageError,
};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Records and people loaded from one data directory.
pub(crate) struct DataDir {
    pub(crate) store: CsvPlacementStore,
    pub(crate) directory: CsvDirectory,
    pub(crate) report: ReconciliationReport,
}

pub(crate) fn open_data_dir(root: &Path) -> Result<DataDir, StorageError> {
    let (store, report) = CsvPlacementStore::open(root)?;
    let directory = CsvDirectory::open(root)?;
    Ok(DataDir {
        store,
        directory,
        report,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_status(raw: &str) -> Result<InternshipStatus, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" => Ok(InternshipStatus::Pending),
        "approved" => Ok(InternshipStatus::Approved),
        "rejected" => Ok(InternshipStatus::Rejected),
        "filled" => Ok(InternshipStatus::Filled),
        _ => Err(format!(
            "unknown internship status '{raw}' (expected pending, approved, rejected or filled)"
        )),
    }
}

pub(crate) fn parse_level(raw: &str) -> Result<InternshipLevel, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "basic" => Ok(InternshipLevel::Basic),
        "intermediate" => Ok(InternshipLevel::Intermediate),
        "advanced" => Ok(InternshipLevel::Advanced),
        _ => Err(format!(
            "unknown internship level '{raw}' (expected basic, intermediate or advanced)"
        )),
    }
}
