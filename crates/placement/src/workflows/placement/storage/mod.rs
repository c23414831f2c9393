//! Repository backends: an in-memory store for tests and demos, and a CSV
//! directory store for the service binary.

pub mod csv_store;
pub mod memory;

pub use csv_store::{CsvDirectory, CsvPlacementStore};
pub use memory::{InMemoryDirectory, InMemoryPlacementRepository};

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;

use super::domain::{Application, ApplicationId, Internship, InternshipId, MAX_SLOTS};
use super::reconciliation::{reconcile, ReconciliationReport};
use super::repository::ChangeSet;
use super::sequence::{IdSequence, SequenceKey};

/// Failure reading or writing persisted records.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed csv in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: ::csv::Error,
    },
    #[error("invalid record in {file}: {reason}")]
    InvalidRecord { file: &'static str, reason: String },
}

/// Full set of records held by a backend, keyed for stable ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PlacementSnapshot {
    pub(crate) internships: BTreeMap<InternshipId, Internship>,
    pub(crate) applications: BTreeMap<ApplicationId, Application>,
}

impl PlacementSnapshot {
    /// Index loaded records and run the reconciliation pass over them before
    /// any operation can observe them.
    pub(crate) fn load(
        mut internships: Vec<Internship>,
        applications: Vec<Application>,
    ) -> (Self, ReconciliationReport) {
        let report = reconcile(&mut internships, &applications);
        let snapshot = Self {
            internships: internships
                .into_iter()
                .map(|internship| (internship.id, internship))
                .collect(),
            applications: applications
                .into_iter()
                .map(|application| (application.id, application))
                .collect(),
        };
        (snapshot, report)
    }

    /// [`PlacementSnapshot::load`] for records read from disk: slot counts
    /// must lie in `1..=MAX_SLOTS` and ids must be unique per file.
    pub(crate) fn load_checked(
        internships: Vec<Internship>,
        applications: Vec<Application>,
    ) -> Result<(Self, ReconciliationReport), StorageError> {
        let mut seen = BTreeSet::new();
        for internship in &internships {
            if internship.slots() == 0 || internship.slots() > MAX_SLOTS {
                return Err(StorageError::InvalidRecord {
                    file: csv_store::INTERNSHIPS_FILE,
                    reason: format!(
                        "internship {} has {} slots (allowed 1 to {MAX_SLOTS})",
                        internship.id,
                        internship.slots()
                    ),
                });
            }
            if !seen.insert(internship.id) {
                return Err(StorageError::InvalidRecord {
                    file: csv_store::INTERNSHIPS_FILE,
                    reason: format!("internship id {} appears more than once", internship.id),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for application in &applications {
            if !seen.insert(application.id) {
                return Err(StorageError::InvalidRecord {
                    file: csv_store::APPLICATIONS_FILE,
                    reason: format!("application id {} appears more than once", application.id),
                });
            }
        }

        Ok(Self::load(internships, applications))
    }

    pub(crate) fn apply(&mut self, changes: ChangeSet) {
        let (internships, applications) = changes.into_parts();
        for internship in internships {
            self.internships.insert(internship.id, internship);
        }
        for application in applications {
            self.applications.insert(application.id, application);
        }
    }

    /// Id allocator positioned after the highest stored ids.
    pub(crate) fn sequence(&self) -> IdSequence {
        let sequence = IdSequence::new();
        if let Some(id) = self.internships.keys().next_back() {
            sequence.seed(SequenceKey::Internship, id.0);
        }
        if let Some(id) = self.applications.keys().next_back() {
            sequence.seed(SequenceKey::Application, id.0);
        }
        sequence
    }

    pub(crate) fn internship_list(&self) -> Vec<Internship> {
        self.internships.values().cloned().collect()
    }

    pub(crate) fn application_list(&self) -> Vec<Application> {
        self.applications.values().cloned().collect()
    }
}
