use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on the seats a single internship may advertise.
pub const MAX_SLOTS: u8 = 10;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! actor_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of an internship posting; immutable once allocated.
    InternshipId
);
numeric_id!(
    /// Identifier of a student application.
    ApplicationId
);
actor_id!(StudentId);
actor_id!(
    /// Company representative; owns the internships they author.
    RepresentativeId
);
actor_id!(
    /// Career center staff member.
    StaffId
);

/// Record kinds referenced by lookups and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Internship,
    Application,
    Student,
    Representative,
    Staff,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Internship => "internship",
            Self::Application => "application",
            Self::Student => "student",
            Self::Representative => "representative",
            Self::Staff => "staff member",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipLevel {
    Basic,
    Intermediate,
    Advanced,
}

impl InternshipLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for InternshipLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Approval status of an internship posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipStatus {
    Pending,
    Approved,
    Rejected,
    Filled,
}

impl InternshipStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Filled => "filled",
        }
    }
}

impl fmt::Display for InternshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status of a student application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    PendingWithdrawn,
    SuccessfulPending,
    SuccessfulAccepted,
    SuccessfulRejected,
    SuccessfulWithdrawn,
    Unsuccessful,
}

/// Events that move an application between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationTransition {
    CompanyOffer,
    CompanyReject,
    /// The student accepted a different offer.
    PeerAccepted,
    StudentAccept,
    StudentReject,
    WithdrawalApproved,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingWithdrawn => "pending_withdrawn",
            Self::SuccessfulPending => "successful_pending",
            Self::SuccessfulAccepted => "successful_accepted",
            Self::SuccessfulRejected => "successful_rejected",
            Self::SuccessfulWithdrawn => "successful_withdrawn",
            Self::Unsuccessful => "unsuccessful",
        }
    }

    /// Statuses counted against the per-student application limit.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::Pending
                | Self::SuccessfulPending
                | Self::SuccessfulAccepted
                | Self::SuccessfulRejected
        )
    }

    /// An application in one of these statuses still occupies its internship
    /// for the purpose of duplicate detection.
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::SuccessfulPending | Self::SuccessfulAccepted
        )
    }

    pub const fn is_withdrawn(self) -> bool {
        matches!(self, Self::PendingWithdrawn | Self::SuccessfulWithdrawn)
    }

    /// The single transition table for applications. `None` means the event
    /// is not legal from this status.
    pub const fn after(self, transition: ApplicationTransition) -> Option<Self> {
        use ApplicationStatus as S;
        use ApplicationTransition as T;

        match (self, transition) {
            // Decided applications stay decided; only a confirmed seat may be re-processed.
            (S::Pending | S::SuccessfulAccepted, T::CompanyOffer) => Some(S::SuccessfulPending),
            (S::Pending | S::SuccessfulAccepted, T::CompanyReject) => Some(S::Unsuccessful),
            (S::Pending, T::PeerAccepted) => Some(S::PendingWithdrawn),
            (S::SuccessfulPending | S::SuccessfulRejected, T::PeerAccepted) => {
                Some(S::SuccessfulWithdrawn)
            }
            (S::SuccessfulPending, T::StudentAccept) => Some(S::SuccessfulAccepted),
            (S::SuccessfulPending, T::StudentReject) => Some(S::SuccessfulRejected),
            (_, T::WithdrawalApproved) => Some(S::SuccessfulWithdrawn),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive fields a representative supplies when creating or editing a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternshipDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub level: InternshipLevel,
    pub preferred_major: String,
    #[serde(default)]
    pub opening_date: Option<NaiveDate>,
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    pub slots: u8,
}

/// An internship posting with its slot accounting.
///
/// `confirmed_offers` is derived state: it only moves through
/// [`Internship::register_confirmed_offer`], [`Internship::revoke_confirmed_offer`]
/// and the reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Internship {
    pub id: InternshipId,
    pub title: String,
    pub description: String,
    pub level: InternshipLevel,
    pub preferred_major: String,
    pub opening_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub(crate) status: InternshipStatus,
    pub company_name: String,
    pub owner_id: RepresentativeId,
    pub(crate) slots: u8,
    pub(crate) visible: bool,
    #[serde(default)]
    pub(crate) confirmed_offers: u8,
}

impl Internship {
    /// A freshly authored posting awaiting staff review.
    pub fn draft(
        id: InternshipId,
        owner: &RepresentativeProfile,
        draft: InternshipDraft,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            level: draft.level,
            preferred_major: draft.preferred_major,
            opening_date: draft.opening_date,
            closing_date: draft.closing_date,
            status: InternshipStatus::Pending,
            company_name: owner.company_name.clone(),
            owner_id: owner.id.clone(),
            slots: draft.slots,
            visible: false,
            confirmed_offers: 0,
        }
    }

    pub fn status(&self) -> InternshipStatus {
        self.status
    }

    pub fn slots(&self) -> u8 {
        self.slots
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn confirmed_offers(&self) -> u8 {
        self.confirmed_offers
    }

    pub fn available_slots(&self) -> u8 {
        self.slots.saturating_sub(self.confirmed_offers)
    }

    pub fn is_owned_by(&self, representative: &RepresentativeId) -> bool {
        &self.owner_id == representative
    }

    pub fn has_available_slots(&self) -> bool {
        self.confirmed_offers < self.slots
    }

    /// Claim a seat. Returns `false` without touching anything when already full.
    pub fn register_confirmed_offer(&mut self) -> bool {
        if self.confirmed_offers >= self.slots {
            return false;
        }

        self.confirmed_offers += 1;
        if self.confirmed_offers >= self.slots && self.status == InternshipStatus::Approved {
            self.status = InternshipStatus::Filled;
        }
        true
    }

    /// Release a seat. Returns `false` when no seat was held.
    pub fn revoke_confirmed_offer(&mut self) -> bool {
        if self.confirmed_offers == 0 {
            return false;
        }

        self.confirmed_offers -= 1;
        if self.status == InternshipStatus::Filled && self.confirmed_offers < self.slots {
            self.status = InternshipStatus::Approved;
        }
        true
    }

    /// Callers check `status == Approved` first.
    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.opening_date.map_or(true, |opening| date >= opening)
            && self.closing_date.map_or(true, |closing| date <= closing)
    }

    pub fn is_accepting_applications(&self) -> bool {
        self.status == InternshipStatus::Approved && self.visible
    }

    /// Overwrite the derived seat count, clamped to capacity, and flip
    /// `Approved`/`Filled` to match. Reserved for reconciliation.
    pub(crate) fn restore_confirmed_offers(&mut self, count: usize) -> bool {
        let clamped = count.min(usize::from(self.slots));
        self.confirmed_offers = u8::try_from(clamped).unwrap_or(self.slots);
        self.sync_fill_status();
        clamped < count
    }

    pub(crate) fn approve(&mut self) {
        self.status = InternshipStatus::Approved;
        self.sync_fill_status();
        self.visible = self.status == InternshipStatus::Approved;
    }

    pub(crate) fn reject(&mut self) {
        self.status = InternshipStatus::Rejected;
        self.visible = false;
    }

    /// Replace the descriptive fields and send the posting back for review.
    pub(crate) fn revise(&mut self, draft: InternshipDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.level = draft.level;
        self.preferred_major = draft.preferred_major;
        self.opening_date = draft.opening_date;
        self.closing_date = draft.closing_date;
        self.slots = draft.slots;
        self.status = InternshipStatus::Pending;
        self.visible = false;
    }

    fn sync_fill_status(&mut self) {
        match self.status {
            InternshipStatus::Approved if self.confirmed_offers >= self.slots => {
                self.status = InternshipStatus::Filled;
            }
            InternshipStatus::Filled if self.confirmed_offers < self.slots => {
                self.status = InternshipStatus::Approved;
            }
            _ => {}
        }
    }
}

/// A student's application to one internship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    pub(crate) status: ApplicationStatus,
    #[serde(default)]
    pub(crate) withdrawal_requested: bool,
}

impl Application {
    pub fn submitted(id: ApplicationId, student_id: StudentId, internship_id: InternshipId) -> Self {
        Self {
            id,
            student_id,
            internship_id,
            status: ApplicationStatus::Pending,
            withdrawal_requested: false,
        }
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn withdrawal_requested(&self) -> bool {
        self.withdrawal_requested
    }

    pub fn belongs_to(&self, student: &StudentId) -> bool {
        &self.student_id == student
    }

    /// Apply a transition from the table, clearing any withdrawal request.
    /// Returns the previous status, or `None` if the move is illegal.
    pub(crate) fn transition(
        &mut self,
        transition: ApplicationTransition,
    ) -> Option<ApplicationStatus> {
        let next = self.status.after(transition)?;
        let previous = self.status;
        self.status = next;
        self.withdrawal_requested = false;
        Some(previous)
    }

    pub(crate) fn request_withdrawal(&mut self) {
        self.withdrawal_requested = true;
    }

    pub(crate) fn clear_withdrawal_request(&mut self) {
        self.withdrawal_requested = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub name: String,
    pub year_of_study: u8,
    pub major: String,
}

/// Company account. Postings can only be authored once staff approve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeProfile {
    pub id: RepresentativeId,
    pub name: String,
    pub company_name: String,
    #[serde(default)]
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffProfile {
    pub id: StaffId,
    pub name: String,
    #[serde(default)]
    pub department: String,
}
