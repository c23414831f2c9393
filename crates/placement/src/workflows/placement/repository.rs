use super::domain::{
    Application, ApplicationId, EntityKind, Internship, InternshipId, RepresentativeId,
    RepresentativeProfile, StaffId, StaffProfile, StudentId, StudentProfile,
};
use super::storage::StorageError;

/// Records touched by one engine operation. A repository persists every
/// record in the set or none of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    internships: Vec<Internship>,
    applications: Vec<Application>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_internship(mut self, internship: Internship) -> Self {
        self.internships.push(internship);
        self
    }

    pub fn with_application(mut self, application: Application) -> Self {
        self.applications.push(application);
        self
    }

    pub fn push_application(&mut self, application: Application) {
        self.applications.push(application);
    }

    pub fn internships(&self) -> &[Internship] {
        &self.internships
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn is_empty(&self) -> bool {
        self.internships.is_empty() && self.applications.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Internship>, Vec<Application>) {
        (self.internships, self.applications)
    }
}

/// Storage abstraction for internships and applications so the engine can be
/// exercised against any backend.
pub trait PlacementRepository: Send + Sync {
    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError>;
    fn fetch_application(&self, id: ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn internships(&self) -> Result<Vec<Internship>, RepositoryError>;
    fn applications(&self) -> Result<Vec<Application>, RepositoryError>;
    fn next_internship_id(&self) -> Result<InternshipId, RepositoryError>;
    fn next_application_id(&self) -> Result<ApplicationId, RepositoryError>;
    fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError>;

    fn applications_for_student(
        &self,
        student: &StudentId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .applications()?
            .into_iter()
            .filter(|application| application.belongs_to(student))
            .collect())
    }

    fn applications_for_internship(
        &self,
        internship: InternshipId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .applications()?
            .into_iter()
            .filter(|application| application.internship_id == internship)
            .collect())
    }

    fn internships_for_representative(
        &self,
        representative: &RepresentativeId,
    ) -> Result<Vec<Internship>, RepositoryError> {
        Ok(self
            .internships()?
            .into_iter()
            .filter(|internship| internship.is_owned_by(representative))
            .collect())
    }

    fn save_internship(&self, internship: Internship) -> Result<(), RepositoryError> {
        self.commit(ChangeSet::new().with_internship(internship))
    }

    fn save_application(&self, application: Application) -> Result<(), RepositoryError> {
        self.commit(ChangeSet::new().with_application(application))
    }
}

/// Lookup of the people acting on the system. Representatives are the
/// only accounts the engine changes, through staff approval.
pub trait Directory: Send + Sync {
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError>;
    fn representative(
        &self,
        id: &RepresentativeId,
    ) -> Result<Option<RepresentativeProfile>, RepositoryError>;
    fn representatives(&self) -> Result<Vec<RepresentativeProfile>, RepositoryError>;
    fn save_representative(&self, profile: RepresentativeProfile) -> Result<(), RepositoryError>;
    fn staff(&self, id: &StaffId) -> Result<Option<StaffProfile>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("no {0} ids left to allocate")]
    IdsExhausted(EntityKind),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
