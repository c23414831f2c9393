use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationTransition, EntityKind, Internship,
    InternshipDraft, InternshipId, InternshipStatus, RepresentativeId, RepresentativeProfile,
    StaffId, StaffProfile, StudentId, StudentProfile,
};
use super::eligibility::{EligibilityPolicy, EligibilityViolation, PlacementPolicy};
use super::filter::InternshipFilter;
use super::reconciliation::{reconcile, ReconciliationReport};
use super::repository::{ChangeSet, Directory, PlacementRepository, RepositoryError};

/// Verdict a representative hands down on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyDecision {
    Offer,
    Reject,
}

impl CompanyDecision {
    fn transition(self) -> ApplicationTransition {
        match self {
            Self::Offer => ApplicationTransition::CompanyOffer,
            Self::Reject => ApplicationTransition::CompanyReject,
        }
    }
}

/// Result of a successful acceptance: the accepted application, the
/// internship with its seat claimed, and every sibling application the
/// cascade withdrew.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedOffer {
    pub application: Application,
    pub internship: Internship,
    pub withdrawn: Vec<Application>,
}

/// Outcome category reported for every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    Ok,
    NotFound,
    NotOwner,
    InvalidState,
    CapacityExceeded,
    PolicyViolation,
    StorageFailure,
}

/// Error raised by the placement service.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },
    #[error("{actor} does not own {entity} {id}")]
    NotOwner {
        actor: String,
        entity: EntityKind,
        id: String,
    },
    #[error("cannot {action} {entity} {id} while it is {state}")]
    InvalidState {
        entity: EntityKind,
        id: String,
        state: &'static str,
        action: &'static str,
    },
    #[error("internship {id} has no available slots ({confirmed}/{slots} confirmed)")]
    CapacityExceeded {
        id: InternshipId,
        confirmed: u8,
        slots: u8,
    },
    #[error(transparent)]
    PolicyViolation(#[from] EligibilityViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PlacementError {
    pub fn code(&self) -> ResultCode {
        match self {
            Self::NotFound { .. } => ResultCode::NotFound,
            Self::NotOwner { .. } => ResultCode::NotOwner,
            Self::InvalidState { .. } => ResultCode::InvalidState,
            Self::CapacityExceeded { .. } => ResultCode::CapacityExceeded,
            Self::PolicyViolation(_) => ResultCode::PolicyViolation,
            Self::Repository(_) => ResultCode::StorageFailure,
        }
    }

    fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    fn not_owner(actor: impl ToString, entity: EntityKind, id: impl ToString) -> Self {
        Self::NotOwner {
            actor: actor.to_string(),
            entity,
            id: id.to_string(),
        }
    }

    fn application_state(application: &Application, action: &'static str) -> Self {
        Self::InvalidState {
            entity: EntityKind::Application,
            id: application.id.to_string(),
            state: application.status().label(),
            action,
        }
    }

    fn internship_state(internship: &Internship, action: &'static str) -> Self {
        Self::InvalidState {
            entity: EntityKind::Internship,
            id: internship.id.to_string(),
            state: internship.status().label(),
            action,
        }
    }

    fn capacity(internship: &Internship) -> Self {
        Self::CapacityExceeded {
            id: internship.id,
            confirmed: internship.confirmed_offers(),
            slots: internship.slots(),
        }
    }
}

/// Allocation engine over a repository and a people directory.
///
/// Every mutating call holds the operation gate from its first read to its
/// commit, so two requests can never race on one internship's seats or one
/// student's acceptances.
pub struct PlacementService<R, D> {
    repository: Arc<R>,
    directory: Arc<D>,
    eligibility: EligibilityPolicy,
    clock: Arc<dyn Clock>,
    gate: Mutex<()>,
}

impl<R, D> PlacementService<R, D>
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<D>, policy: PlacementPolicy) -> Self {
        Self::with_clock(repository, directory, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        directory: Arc<D>,
        policy: PlacementPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            directory,
            eligibility: EligibilityPolicy::new(policy),
            clock,
            gate: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &PlacementPolicy {
        self.eligibility.policy()
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Student applies to an internship; the new application starts `Pending`.
    pub fn apply(
        &self,
        student_id: &StudentId,
        internship_id: InternshipId,
    ) -> Result<Application, PlacementError> {
        let _gate = self.lock();
        let student = self.load_student(student_id)?;
        let internship = self.load_internship(internship_id)?;

        self.eligibility.check_listing(&internship)?;
        let existing = self.repository.applications_for_student(student_id)?;
        self.eligibility
            .check_candidate(&student, &internship, &existing, self.clock.today())?;

        let id = self.repository.next_application_id()?;
        let application = Application::submitted(id, student.id.clone(), internship.id);
        self.repository.save_application(application.clone())?;

        info!(
            application_id = %application.id,
            student_id = %student.id,
            internship_id = %internship.id,
            "application submitted"
        );
        Ok(application)
    }

    /// Representative offers or rejects an application on one of their postings.
    pub fn company_decision(
        &self,
        representative_id: &RepresentativeId,
        application_id: ApplicationId,
        decision: CompanyDecision,
    ) -> Result<Application, PlacementError> {
        let _gate = self.lock();
        let mut application = self.load_application(application_id)?;
        let mut internship = self.load_internship(application.internship_id)?;

        if !internship.is_owned_by(representative_id) {
            return Err(PlacementError::not_owner(
                representative_id,
                EntityKind::Internship,
                internship.id,
            ));
        }

        let transition = decision.transition();
        if application.status().after(transition).is_none() {
            return Err(PlacementError::application_state(&application, "decide on"));
        }

        if decision == CompanyDecision::Offer && !internship.has_available_slots() {
            return Err(PlacementError::capacity(&internship));
        }

        let previous = application
            .transition(transition)
            .ok_or_else(|| PlacementError::application_state(&application, "decide on"))?;

        let mut changes = ChangeSet::new();
        if previous == ApplicationStatus::SuccessfulAccepted {
            if internship.revoke_confirmed_offer() {
                debug!(internship_id = %internship.id, "confirmed offer revoked on re-decision");
            }
            changes = changes.with_internship(internship.clone());
        }
        changes.push_application(application.clone());
        self.repository.commit(changes)?;

        info!(
            application_id = %application.id,
            representative_id = %representative_id,
            from = previous.label(),
            to = application.status().label(),
            "company decision recorded"
        );
        Ok(application)
    }

    /// Student accepts an outstanding offer. Claims a seat and withdraws the
    /// student's other active applications in the same commit.
    pub fn accept_offer(
        &self,
        student_id: &StudentId,
        application_id: ApplicationId,
    ) -> Result<AcceptedOffer, PlacementError> {
        let _gate = self.lock();
        let mut application = self.load_owned_application(student_id, application_id)?;

        if application
            .status()
            .after(ApplicationTransition::StudentAccept)
            .is_none()
        {
            return Err(PlacementError::application_state(&application, "accept"));
        }

        let siblings = self.repository.applications_for_student(student_id)?;
        if let Some(accepted) = siblings.iter().find(|other| {
            other.id != application.id && other.status() == ApplicationStatus::SuccessfulAccepted
        }) {
            return Err(EligibilityViolation::AcceptedOfferExists {
                existing: accepted.id,
            }
            .into());
        }

        let mut internship = self.load_internship(application.internship_id)?;
        if !internship.has_available_slots() {
            return Err(PlacementError::capacity(&internship));
        }

        application
            .transition(ApplicationTransition::StudentAccept)
            .ok_or_else(|| PlacementError::application_state(&application, "accept"))?;
        internship.register_confirmed_offer();

        let mut withdrawn = Vec::new();
        for mut other in siblings {
            if other.id == application.id || !other.status().is_active() {
                continue;
            }
            if other.transition(ApplicationTransition::PeerAccepted).is_some() {
                withdrawn.push(other);
            }
        }

        let mut changes = ChangeSet::new()
            .with_internship(internship.clone())
            .with_application(application.clone());
        for other in &withdrawn {
            changes.push_application(other.clone());
        }
        self.repository.commit(changes)?;

        info!(
            application_id = %application.id,
            student_id = %student_id,
            internship_id = %internship.id,
            confirmed = internship.confirmed_offers(),
            withdrawn = withdrawn.len(),
            "offer accepted"
        );
        Ok(AcceptedOffer {
            application,
            internship,
            withdrawn,
        })
    }

    /// Student declines an outstanding offer. No seat was held, so slots are untouched.
    pub fn reject_offer(
        &self,
        student_id: &StudentId,
        application_id: ApplicationId,
    ) -> Result<Application, PlacementError> {
        let _gate = self.lock();
        let mut application = self.load_owned_application(student_id, application_id)?;

        application
            .transition(ApplicationTransition::StudentReject)
            .ok_or_else(|| PlacementError::application_state(&application, "reject"))?;
        self.repository.save_application(application.clone())?;

        info!(application_id = %application.id, student_id = %student_id, "offer rejected");
        Ok(application)
    }

    /// Student asks staff to release an accepted seat. Status is unchanged
    /// until staff decide.
    pub fn request_withdrawal(
        &self,
        student_id: &StudentId,
        application_id: ApplicationId,
    ) -> Result<Application, PlacementError> {
        let _gate = self.lock();
        let mut application = self.load_owned_application(student_id, application_id)?;

        if application.status() != ApplicationStatus::SuccessfulAccepted
            || application.withdrawal_requested()
        {
            return Err(PlacementError::application_state(
                &application,
                "request withdrawal of",
            ));
        }

        application.request_withdrawal();
        self.repository.save_application(application.clone())?;

        info!(application_id = %application.id, student_id = %student_id, "withdrawal requested");
        Ok(application)
    }

    /// Staff approve or deny a pending withdrawal request. The request flag is
    /// cleared either way.
    pub fn decide_withdrawal(
        &self,
        staff_id: &StaffId,
        application_id: ApplicationId,
        approve: bool,
    ) -> Result<Application, PlacementError> {
        let _gate = self.lock();
        self.load_staff(staff_id)?;
        let mut application = self.load_application(application_id)?;

        if !application.withdrawal_requested() {
            return Err(PlacementError::application_state(
                &application,
                "decide withdrawal of",
            ));
        }

        if !approve {
            application.clear_withdrawal_request();
            self.repository.save_application(application.clone())?;
            info!(application_id = %application.id, staff_id = %staff_id, "withdrawal denied");
            return Ok(application);
        }

        let previous = application
            .transition(ApplicationTransition::WithdrawalApproved)
            .ok_or_else(|| PlacementError::application_state(&application, "withdraw"))?;

        let mut changes = ChangeSet::new();
        if previous == ApplicationStatus::SuccessfulAccepted {
            match self.repository.fetch_internship(application.internship_id)? {
                Some(mut internship) => {
                    internship.revoke_confirmed_offer();
                    changes = changes.with_internship(internship);
                }
                None => warn!(
                    application_id = %application.id,
                    internship_id = %application.internship_id,
                    "withdrawn application references an unknown internship"
                ),
            }
        }
        changes.push_application(application.clone());
        self.repository.commit(changes)?;

        info!(
            application_id = %application.id,
            staff_id = %staff_id,
            from = previous.label(),
            "withdrawal approved"
        );
        Ok(application)
    }

    /// Recompute confirmed seats across the whole repository and persist any
    /// internship whose stored count drifted.
    pub fn reconcile(&self) -> Result<ReconciliationReport, PlacementError> {
        let _gate = self.lock();
        let mut internships = self.repository.internships()?;
        let applications = self.repository.applications()?;
        let report = reconcile(&mut internships, &applications);

        let adjusted = report.adjusted_ids();
        if !adjusted.is_empty() {
            let mut changes = ChangeSet::new();
            for internship in internships {
                if adjusted.contains(&internship.id) {
                    changes = changes.with_internship(internship);
                }
            }
            self.repository.commit(changes)?;
        }

        Ok(report)
    }

    /// Representative authors a new posting; it awaits staff review, hidden.
    pub fn create_internship(
        &self,
        representative_id: &RepresentativeId,
        draft: InternshipDraft,
    ) -> Result<Internship, PlacementError> {
        let _gate = self.lock();
        let representative = self.load_representative(representative_id)?;
        self.eligibility.check_author(&representative)?;
        self.eligibility.check_draft(&draft)?;
        let owned = self
            .repository
            .internships_for_representative(representative_id)?
            .len();
        self.eligibility.check_quota(owned)?;

        let id = self.repository.next_internship_id()?;
        let internship = Internship::draft(id, &representative, draft);
        self.repository.save_internship(internship.clone())?;

        info!(
            internship_id = %internship.id,
            representative_id = %representative_id,
            slots = internship.slots(),
            "internship created"
        );
        Ok(internship)
    }

    /// Representative edits a posting, which returns it to review. Confirmed
    /// seats are kept; a filled posting cannot be edited.
    pub fn update_internship(
        &self,
        representative_id: &RepresentativeId,
        internship_id: InternshipId,
        draft: InternshipDraft,
    ) -> Result<Internship, PlacementError> {
        let _gate = self.lock();
        let representative = self.load_representative(representative_id)?;
        self.eligibility.check_author(&representative)?;
        let mut internship = self.load_owned_internship(representative_id, internship_id)?;

        if internship.status() == InternshipStatus::Filled {
            return Err(PlacementError::internship_state(&internship, "edit"));
        }
        self.eligibility.check_revision(&internship, &draft)?;

        internship.revise(draft);
        self.repository.save_internship(internship.clone())?;

        info!(internship_id = %internship.id, representative_id = %representative_id, "internship revised");
        Ok(internship)
    }

    /// Staff approve or reject a posting awaiting review.
    pub fn review_internship(
        &self,
        staff_id: &StaffId,
        internship_id: InternshipId,
        approve: bool,
    ) -> Result<Internship, PlacementError> {
        let _gate = self.lock();
        self.load_staff(staff_id)?;
        let mut internship = self.load_internship(internship_id)?;

        if internship.status() != InternshipStatus::Pending {
            return Err(PlacementError::internship_state(&internship, "review"));
        }

        if approve {
            internship.approve();
        } else {
            internship.reject();
        }
        self.repository.save_internship(internship.clone())?;

        info!(
            internship_id = %internship.id,
            staff_id = %staff_id,
            status = internship.status().label(),
            "internship reviewed"
        );
        Ok(internship)
    }

    /// Staff approve or reject a representative account. Rejection also
    /// revokes an earlier approval.
    pub fn review_representative(
        &self,
        staff_id: &StaffId,
        representative_id: &RepresentativeId,
        approve: bool,
    ) -> Result<RepresentativeProfile, PlacementError> {
        let _gate = self.lock();
        self.load_staff(staff_id)?;
        let mut representative = self.load_representative(representative_id)?;

        representative.approved = approve;
        self.directory.save_representative(representative.clone())?;

        info!(
            representative_id = %representative.id,
            staff_id = %staff_id,
            approved = approve,
            "representative reviewed"
        );
        Ok(representative)
    }

    /// Representative accounts still waiting for staff approval.
    pub fn pending_representatives(&self) -> Result<Vec<RepresentativeProfile>, PlacementError> {
        Ok(self
            .directory
            .representatives()?
            .into_iter()
            .filter(|representative| !representative.approved)
            .collect())
    }

    /// Representative shows or hides an approved posting.
    pub fn toggle_visibility(
        &self,
        representative_id: &RepresentativeId,
        internship_id: InternshipId,
    ) -> Result<Internship, PlacementError> {
        let _gate = self.lock();
        let mut internship = self.load_owned_internship(representative_id, internship_id)?;

        if internship.status() != InternshipStatus::Approved {
            return Err(EligibilityViolation::VisibilityLocked {
                status: internship.status(),
            }
            .into());
        }

        internship.toggle_visibility();
        self.repository.save_internship(internship.clone())?;

        info!(
            internship_id = %internship.id,
            visible = internship.visible(),
            "internship visibility toggled"
        );
        Ok(internship)
    }

    /// Postings the student could apply to today, narrowed by `filter` and
    /// sorted by title.
    pub fn browse_internships(
        &self,
        student_id: &StudentId,
        filter: &InternshipFilter,
    ) -> Result<Vec<Internship>, PlacementError> {
        let student = self.load_student(student_id)?;
        let today = self.clock.today();
        let candidates = self
            .repository
            .internships()?
            .into_iter()
            .filter(|internship| self.eligibility.is_browsable(&student, internship, today))
            .collect();
        Ok(filter.apply(candidates))
    }

    /// Every posting matching `filter`, sorted by title.
    pub fn internship_report(
        &self,
        filter: &InternshipFilter,
    ) -> Result<Vec<Internship>, PlacementError> {
        Ok(filter.apply(self.repository.internships()?))
    }

    pub fn internships_for_representative(
        &self,
        representative_id: &RepresentativeId,
    ) -> Result<Vec<Internship>, PlacementError> {
        self.load_representative(representative_id)?;
        let internships = self
            .repository
            .internships_for_representative(representative_id)?;
        Ok(InternshipFilter::default().apply(internships))
    }

    pub fn applications_for_internship(
        &self,
        representative_id: &RepresentativeId,
        internship_id: InternshipId,
    ) -> Result<Vec<Application>, PlacementError> {
        let internship = self.load_owned_internship(representative_id, internship_id)?;
        Ok(self.repository.applications_for_internship(internship.id)?)
    }

    pub fn applications_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Application>, PlacementError> {
        self.load_student(student_id)?;
        Ok(self.repository.applications_for_student(student_id)?)
    }

    /// Applications with an outstanding withdrawal request, for staff review.
    pub fn pending_withdrawals(&self) -> Result<Vec<Application>, PlacementError> {
        Ok(self
            .repository
            .applications()?
            .into_iter()
            .filter(Application::withdrawal_requested)
            .collect())
    }

    pub fn application(&self, application_id: ApplicationId) -> Result<Application, PlacementError> {
        self.load_application(application_id)
    }

    pub fn internship(&self, internship_id: InternshipId) -> Result<Internship, PlacementError> {
        self.load_internship(internship_id)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_internship(&self, id: InternshipId) -> Result<Internship, PlacementError> {
        self.repository
            .fetch_internship(id)?
            .ok_or_else(|| PlacementError::not_found(EntityKind::Internship, id))
    }

    fn load_owned_internship(
        &self,
        representative_id: &RepresentativeId,
        id: InternshipId,
    ) -> Result<Internship, PlacementError> {
        let internship = self.load_internship(id)?;
        if !internship.is_owned_by(representative_id) {
            return Err(PlacementError::not_owner(
                representative_id,
                EntityKind::Internship,
                id,
            ));
        }
        Ok(internship)
    }

    fn load_application(&self, id: ApplicationId) -> Result<Application, PlacementError> {
        self.repository
            .fetch_application(id)?
            .ok_or_else(|| PlacementError::not_found(EntityKind::Application, id))
    }

    fn load_owned_application(
        &self,
        student_id: &StudentId,
        id: ApplicationId,
    ) -> Result<Application, PlacementError> {
        let application = self.load_application(id)?;
        if !application.belongs_to(student_id) {
            return Err(PlacementError::not_owner(
                student_id,
                EntityKind::Application,
                id,
            ));
        }
        Ok(application)
    }

    fn load_student(&self, id: &StudentId) -> Result<StudentProfile, PlacementError> {
        self.directory
            .student(id)?
            .ok_or_else(|| PlacementError::not_found(EntityKind::Student, id))
    }

    fn load_representative(
        &self,
        id: &RepresentativeId,
    ) -> Result<RepresentativeProfile, PlacementError> {
        self.directory
            .representative(id)?
            .ok_or_else(|| PlacementError::not_found(EntityKind::Representative, id))
    }

    fn load_staff(&self, id: &StaffId) -> Result<StaffProfile, PlacementError> {
        self.directory
            .staff(id)?
            .ok_or_else(|| PlacementError::not_found(EntityKind::Staff, id))
    }
}
