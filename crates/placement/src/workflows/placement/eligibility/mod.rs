mod config;
mod rules;

pub use config::{
    PlacementPolicy, DEFAULT_BASIC_ONLY_THROUGH_YEAR, DEFAULT_MAX_ACTIVE_APPLICATIONS,
    DEFAULT_MAX_INTERNSHIPS_PER_REPRESENTATIVE,
};

use chrono::NaiveDate;

use super::domain::{
    Application, ApplicationId, Internship, InternshipDraft, InternshipId, InternshipLevel,
    InternshipStatus, RepresentativeId, RepresentativeProfile, StudentProfile,
};

/// Business rule a request broke. Every variant surfaces as a policy violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityViolation {
    #[error("internship {internship_id} is not accepting applications (status {status}, visible {visible})")]
    NotAcceptingApplications {
        internship_id: InternshipId,
        status: InternshipStatus,
        visible: bool,
    },
    #[error("internship {internship_id} has no free slots ({confirmed}/{slots} confirmed)")]
    NoAvailableSlots {
        internship_id: InternshipId,
        confirmed: u8,
        slots: u8,
    },
    #[error("internship {internship_id} is not open for applications on {today}")]
    OutsideApplicationWindow {
        internship_id: InternshipId,
        today: NaiveDate,
    },
    #[error("year {year_of_study} students may only apply to Basic internships, not {level}")]
    LevelRestricted {
        year_of_study: u8,
        level: InternshipLevel,
    },
    #[error("major {major} does not match preferred major {preferred_major}")]
    MajorMismatch {
        major: String,
        preferred_major: String,
    },
    #[error("student already has {active} active applications (limit {limit})")]
    ActiveApplicationLimit { active: usize, limit: usize },
    #[error("application {existing} to internship {internship_id} is still open")]
    DuplicateApplication {
        internship_id: InternshipId,
        existing: ApplicationId,
    },
    #[error("student already accepted the offer on application {existing}")]
    AcceptedOfferExists { existing: ApplicationId },
    #[error("internship title must not be empty")]
    MissingTitle,
    #[error("slots must be between 1 and {max}, got {requested}")]
    SlotLimit { requested: u8, max: u8 },
    #[error("slots cannot drop below the {confirmed} confirmed offers")]
    SlotsBelowConfirmed { requested: u8, confirmed: u8 },
    #[error("closing date {closing} precedes opening date {opening}")]
    InvalidDateRange {
        opening: NaiveDate,
        closing: NaiveDate,
    },
    #[error("representative {representative_id} is awaiting staff approval")]
    RepresentativeNotApproved { representative_id: RepresentativeId },
    #[error("representative already owns {owned} internships (limit {limit})")]
    InternshipQuota { owned: usize, limit: usize },
    #[error("internship is {status}; only approved internships can change visibility")]
    VisibilityLocked { status: InternshipStatus },
}

/// Stateless checks over students, postings and their applications.
#[derive(Debug, Clone, Default)]
pub struct EligibilityPolicy {
    policy: PlacementPolicy,
}

impl EligibilityPolicy {
    pub fn new(policy: PlacementPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PlacementPolicy {
        &self.policy
    }

    /// Posting-side gate: approved, visible and with a free slot.
    pub fn check_listing(&self, internship: &Internship) -> Result<(), EligibilityViolation> {
        rules::listing_open(internship)?;
        rules::has_free_slot(internship)
    }

    /// Student-side gate, evaluated after the listing: application window, level,
    /// major, active limit and duplicates. `existing` holds every application
    /// the student has made.
    pub fn check_candidate(
        &self,
        student: &StudentProfile,
        internship: &Internship,
        existing: &[Application],
        today: NaiveDate,
    ) -> Result<(), EligibilityViolation> {
        rules::within_window(internship, today)?;
        rules::level_permitted(student, internship, &self.policy)?;
        rules::major_matches(student, internship)?;
        rules::under_active_limit(existing, &self.policy)?;
        rules::not_duplicate(existing, internship)
    }

    /// Whether a posting belongs in a student's browse list, ignoring their
    /// own application history.
    pub fn is_browsable(
        &self,
        student: &StudentProfile,
        internship: &Internship,
        today: NaiveDate,
    ) -> bool {
        self.check_listing(internship).is_ok()
            && rules::within_window(internship, today).is_ok()
            && rules::level_permitted(student, internship, &self.policy).is_ok()
            && rules::major_matches(student, internship).is_ok()
    }

    /// Only staff-approved representatives author or edit postings.
    pub fn check_author(
        &self,
        representative: &RepresentativeProfile,
    ) -> Result<(), EligibilityViolation> {
        if representative.approved {
            return Ok(());
        }

        Err(EligibilityViolation::RepresentativeNotApproved {
            representative_id: representative.id.clone(),
        })
    }

    pub fn check_draft(&self, draft: &InternshipDraft) -> Result<(), EligibilityViolation> {
        rules::draft_valid(draft)
    }

    pub fn check_revision(
        &self,
        internship: &Internship,
        draft: &InternshipDraft,
    ) -> Result<(), EligibilityViolation> {
        rules::draft_valid(draft)?;
        if draft.slots < internship.confirmed_offers() {
            return Err(EligibilityViolation::SlotsBelowConfirmed {
                requested: draft.slots,
                confirmed: internship.confirmed_offers(),
            });
        }
        Ok(())
    }

    pub fn check_quota(&self, owned: usize) -> Result<(), EligibilityViolation> {
        if owned < self.policy.max_internships_per_representative {
            return Ok(());
        }

        Err(EligibilityViolation::InternshipQuota {
            owned,
            limit: self.policy.max_internships_per_representative,
        })
    }
}
