use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::super::domain::{
    Application, ApplicationId, Internship, InternshipId, RepresentativeId,
    RepresentativeProfile, StaffId, StaffProfile, StudentId, StudentProfile,
};
use super::super::reconciliation::ReconciliationReport;
use super::super::repository::{ChangeSet, Directory, PlacementRepository, RepositoryError};
use super::super::sequence::IdSequence;
use super::PlacementSnapshot;

/// Process-local repository. Commits swap records under one lock, so a
/// change set is either fully visible or not at all.
#[derive(Debug, Default)]
pub struct InMemoryPlacementRepository {
    state: Mutex<PlacementSnapshot>,
    sequence: IdSequence,
}

impl InMemoryPlacementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load records, reconciling seat counts before returning.
    pub fn from_records(
        internships: Vec<Internship>,
        applications: Vec<Application>,
    ) -> (Self, ReconciliationReport) {
        let (snapshot, report) = PlacementSnapshot::load(internships, applications);
        let sequence = snapshot.sequence();
        let repository = Self {
            state: Mutex::new(snapshot),
            sequence,
        };
        (repository, report)
    }

    pub fn record_counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.internships.len(), state.applications.len())
    }

    fn lock(&self) -> MutexGuard<'_, PlacementSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlacementRepository for InMemoryPlacementRepository {
    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        Ok(self.lock().internships.get(&id).cloned())
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock().applications.get(&id).cloned())
    }

    fn internships(&self) -> Result<Vec<Internship>, RepositoryError> {
        Ok(self.lock().internship_list())
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.lock().application_list())
    }

    fn next_internship_id(&self) -> Result<InternshipId, RepositoryError> {
        self.sequence.next_internship_id()
    }

    fn next_application_id(&self) -> Result<ApplicationId, RepositoryError> {
        self.sequence.next_application_id()
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError> {
        self.lock().apply(changes);
        Ok(())
    }
}

/// Directory of people held in maps, built up front. Representative
/// accounts stay writable for approval.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    students: HashMap<StudentId, StudentProfile>,
    representatives: Mutex<HashMap<RepresentativeId, RepresentativeProfile>>,
    staff: HashMap<StaffId, StaffProfile>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_student(mut self, profile: StudentProfile) -> Self {
        self.students.insert(profile.id.clone(), profile);
        self
    }

    pub fn with_representative(mut self, profile: RepresentativeProfile) -> Self {
        self.representatives
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.id.clone(), profile);
        self
    }

    pub fn with_staff(mut self, profile: StaffProfile) -> Self {
        self.staff.insert(profile.id.clone(), profile);
        self
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.students.len(),
            self.lock_representatives().len(),
            self.staff.len(),
        )
    }

    fn lock_representatives(
        &self,
    ) -> MutexGuard<'_, HashMap<RepresentativeId, RepresentativeProfile>> {
        self.representatives
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Directory for InMemoryDirectory {
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        Ok(self.students.get(id).cloned())
    }

    fn representative(
        &self,
        id: &RepresentativeId,
    ) -> Result<Option<RepresentativeProfile>, RepositoryError> {
        Ok(self.lock_representatives().get(id).cloned())
    }

    fn representatives(&self) -> Result<Vec<RepresentativeProfile>, RepositoryError> {
        let mut profiles: Vec<_> = self.lock_representatives().values().cloned().collect();
        profiles.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(profiles)
    }

    fn save_representative(&self, profile: RepresentativeProfile) -> Result<(), RepositoryError> {
        self.lock_representatives().insert(profile.id.clone(), profile);
        Ok(())
    }

    fn staff(&self, id: &StaffId) -> Result<Option<StaffProfile>, RepositoryError> {
        Ok(self.staff.get(id).cloned())
    }
}
