//! Internship placement workflow: postings with slot accounting, the student
//! application state machine, the allocation engine that drives it, and the
//! reconciliation pass run after records are loaded.

pub mod clock;
pub mod domain;
pub mod eligibility;
pub mod filter;
pub mod reconciliation;
pub mod repository;
pub mod router;
pub mod sequence;
pub mod service;
pub mod storage;
pub mod views;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationTransition, EntityKind, Internship,
    InternshipDraft, InternshipId, InternshipLevel, InternshipStatus, RepresentativeId,
    RepresentativeProfile, StaffId, StaffProfile, StudentId, StudentProfile, MAX_SLOTS,
};
pub use eligibility::{
    EligibilityPolicy, EligibilityViolation, PlacementPolicy, DEFAULT_BASIC_ONLY_THROUGH_YEAR,
    DEFAULT_MAX_ACTIVE_APPLICATIONS, DEFAULT_MAX_INTERNSHIPS_PER_REPRESENTATIVE,
};
pub use filter::InternshipFilter;
pub use reconciliation::{reconcile, ReconciliationReport, SlotAdjustment};
pub use repository::{ChangeSet, Directory, PlacementRepository, RepositoryError};
pub use router::placement_router;
pub use sequence::{IdSequence, SequenceKey};
pub use service::{
    AcceptedOffer, CompanyDecision, PlacementError, PlacementService, ResultCode,
};
pub use storage::{
    CsvDirectory, CsvPlacementStore, InMemoryDirectory, InMemoryPlacementRepository,
    StorageError,
};
pub use views::{AcceptedOfferView, ApplicationView, InternshipView, OperationOutcome};
