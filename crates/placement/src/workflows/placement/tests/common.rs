use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::placement::clock::FixedClock;
use crate::workflows::placement::domain::{
    Application, ApplicationId, ApplicationStatus, Internship, InternshipId, InternshipLevel,
    InternshipStatus, RepresentativeId, RepresentativeProfile, StaffId, StaffProfile, StudentId,
    StudentProfile,
};
use crate::workflows::placement::eligibility::PlacementPolicy;
use crate::workflows::placement::repository::{
    ChangeSet, PlacementRepository, RepositoryError,
};
use crate::workflows::placement::service::PlacementService;
use crate::workflows::placement::storage::{InMemoryDirectory, InMemoryPlacementRepository};

pub(super) type MemoryService = PlacementService<InMemoryPlacementRepository, InMemoryDirectory>;

pub(super) const ACME_REP: &str = "rep-acme";
pub(super) const GLOBEX_REP: &str = "rep-globex";
pub(super) const INITECH_REP: &str = "rep-initech";
pub(super) const STAFF: &str = "staff-kim";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn student_id(id: &str) -> StudentId {
    StudentId::new(id)
}

pub(super) fn acme() -> RepresentativeId {
    RepresentativeId::new(ACME_REP)
}

pub(super) fn globex() -> RepresentativeId {
    RepresentativeId::new(GLOBEX_REP)
}

/// Registered but not yet approved by staff.
pub(super) fn initech() -> RepresentativeId {
    RepresentativeId::new(INITECH_REP)
}

pub(super) fn staff() -> StaffId {
    StaffId::new(STAFF)
}

pub(super) fn student(id: &str, year_of_study: u8, major: &str) -> StudentProfile {
    StudentProfile {
        id: student_id(id),
        name: format!("Student {id}"),
        year_of_study,
        major: major.to_string(),
    }
}

/// Seniors in Computer Science unless the id says otherwise.
pub(super) fn directory() -> InMemoryDirectory {
    let mut directory = InMemoryDirectory::new()
        .with_representative(RepresentativeProfile {
            id: acme(),
            name: "Ada Park".to_string(),
            company_name: "Acme Robotics".to_string(),
            approved: true,
        })
        .with_representative(RepresentativeProfile {
            id: globex(),
            name: "Lee Moreno".to_string(),
            company_name: "Globex".to_string(),
            approved: true,
        })
        .with_representative(RepresentativeProfile {
            id: initech(),
            name: "Sam Ortiz".to_string(),
            company_name: "Initech".to_string(),
            approved: false,
        })
        .with_staff(StaffProfile {
            id: staff(),
            name: "Kim Tan".to_string(),
            department: "Career Office".to_string(),
        })
        .with_student(student("fresher", 1, "Computer Science"))
        .with_student(student("biologist", 3, "Biology"));

    for id in ["alice", "bob", "cara", "dev", "eli"] {
        directory = directory.with_student(student(id, 3, "Computer Science"));
    }
    directory
}

/// Approved, visible Computer Science posting owned by Acme.
pub(super) fn internship(id: u32, slots: u8) -> Internship {
    Internship {
        id: InternshipId(id),
        title: format!("Platform Intern {id}"),
        description: "Build internal tooling".to_string(),
        level: InternshipLevel::Intermediate,
        preferred_major: "Computer Science".to_string(),
        opening_date: Some(date(2025, 1, 1)),
        closing_date: Some(date(2025, 6, 30)),
        status: InternshipStatus::Approved,
        company_name: "Acme Robotics".to_string(),
        owner_id: acme(),
        slots,
        visible: true,
        confirmed_offers: 0,
    }
}

pub(super) fn application(
    id: u32,
    student: &str,
    internship: u32,
    status: ApplicationStatus,
) -> Application {
    Application {
        id: ApplicationId(id),
        student_id: student_id(student),
        internship_id: InternshipId(internship),
        status,
        withdrawal_requested: false,
    }
}

pub(super) fn build_service(
    internships: Vec<Internship>,
    applications: Vec<Application>,
) -> (Arc<MemoryService>, Arc<InMemoryPlacementRepository>) {
    let (repository, _) = InMemoryPlacementRepository::from_records(internships, applications);
    let repository = Arc::new(repository);
    let service = Arc::new(PlacementService::with_clock(
        repository.clone(),
        Arc::new(directory()),
        PlacementPolicy::default(),
        Arc::new(FixedClock(today())),
    ));
    (service, repository)
}

pub(super) fn stored_application(
    repository: &InMemoryPlacementRepository,
    id: u32,
) -> Application {
    repository
        .fetch_application(ApplicationId(id))
        .expect("repository readable")
        .expect("application stored")
}

pub(super) fn stored_internship(repository: &InMemoryPlacementRepository, id: u32) -> Internship {
    repository
        .fetch_internship(InternshipId(id))
        .expect("repository readable")
        .expect("internship stored")
}

/// Serves one internship and application but refuses every write.
pub(super) struct ReadOnlyRepository {
    pub(super) internship: Internship,
    pub(super) application: Application,
}

impl PlacementRepository for ReadOnlyRepository {
    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        Ok((self.internship.id == id).then(|| self.internship.clone()))
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok((self.application.id == id).then(|| self.application.clone()))
    }

    fn internships(&self) -> Result<Vec<Internship>, RepositoryError> {
        Ok(vec![self.internship.clone()])
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(vec![self.application.clone()])
    }

    fn next_internship_id(&self) -> Result<InternshipId, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn next_application_id(&self) -> Result<ApplicationId, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn commit(&self, _changes: ChangeSet) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
