//! End-to-end placement scenarios driven through the public service facade,
//! from posting creation through acceptance, withdrawal and reload.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use placement::workflows::placement::{
        Application, ApplicationId, CompanyDecision, Directory, FixedClock, InMemoryDirectory,
        InMemoryPlacementRepository, Internship, InternshipDraft, InternshipLevel,
        PlacementPolicy, PlacementRepository, PlacementService, RepresentativeId,
        RepresentativeProfile, StaffId, StaffProfile, StudentId, StudentProfile,
    };

    pub(super) const STUDENTS: [&str; 4] = ["alice", "bob", "cara", "dev"];

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
    }

    pub(super) fn rep() -> RepresentativeId {
        RepresentativeId::new("rep-acme")
    }

    pub(super) fn staff() -> StaffId {
        StaffId::new("staff-kim")
    }

    pub(super) fn student(id: &str) -> StudentId {
        StudentId::new(id)
    }

    pub(super) fn directory() -> InMemoryDirectory {
        let mut directory = InMemoryDirectory::new()
            .with_representative(RepresentativeProfile {
                id: rep(),
                name: "Ada Park".to_string(),
                company_name: "Acme Robotics".to_string(),
                approved: true,
            })
            .with_staff(StaffProfile {
                id: staff(),
                name: "Kim Tan".to_string(),
                department: "Career Office".to_string(),
            });
        for id in STUDENTS {
            directory = directory.with_student(StudentProfile {
                id: student(id),
                name: id.to_uppercase(),
                year_of_study: 3,
                major: "Computer Science".to_string(),
            });
        }
        directory
    }

    pub(super) fn draft(title: &str, slots: u8) -> InternshipDraft {
        InternshipDraft {
            title: title.to_string(),
            description: "Cross-team rotation".to_string(),
            level: InternshipLevel::Intermediate,
            preferred_major: "computer science".to_string(),
            opening_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            closing_date: NaiveDate::from_ymd_opt(2025, 5, 31),
            slots,
        }
    }

    pub(super) fn service<R, D>(repository: Arc<R>, directory: D) -> PlacementService<R, D>
    where
        R: PlacementRepository + 'static,
        D: Directory + 'static,
    {
        PlacementService::with_clock(
            repository,
            Arc::new(directory),
            PlacementPolicy::default(),
            Arc::new(FixedClock(today())),
        )
    }

    pub(super) fn memory_service() -> PlacementService<InMemoryPlacementRepository, InMemoryDirectory>
    {
        service(Arc::new(InMemoryPlacementRepository::new()), directory())
    }

    /// Create and approve a posting owned by the Acme representative.
    pub(super) fn published<R, D>(service: &PlacementService<R, D>, title: &str, slots: u8) -> Internship
    where
        R: PlacementRepository + 'static,
        D: Directory + 'static,
    {
        let created = service
            .create_internship(&rep(), draft(title, slots))
            .expect("create internship");
        service
            .review_internship(&staff(), created.id, true)
            .expect("approve internship")
    }

    /// Apply and receive an offer in one step.
    pub(super) fn offered<R, D>(
        service: &PlacementService<R, D>,
        student_id: &str,
        internship: &Internship,
    ) -> ApplicationId
    where
        R: PlacementRepository + 'static,
        D: Directory + 'static,
    {
        let application: Application = service
            .apply(&student(student_id), internship.id)
            .expect("apply");
        service
            .company_decision(&rep(), application.id, CompanyDecision::Offer)
            .expect("offer")
            .id
    }
}

use std::sync::Arc;

use common::*;
use placement::workflows::placement::{
    ApplicationStatus, CsvDirectory, CsvPlacementStore, InternshipStatus, PlacementRepository,
    ResultCode,
};

#[test]
fn single_seat_cannot_be_claimed_twice() {
    let service = memory_service();
    let internship = published(&service, "Robotics Intern", 1);
    let first = offered(&service, "alice", &internship);
    let second = offered(&service, "bob", &internship);

    let accepted = service
        .accept_offer(&student("alice"), first)
        .expect("first acceptance");
    assert_eq!(accepted.internship.confirmed_offers(), 1);
    assert_eq!(accepted.internship.status(), InternshipStatus::Filled);

    let err = service
        .accept_offer(&student("bob"), second)
        .expect_err("seat already taken");
    assert_eq!(err.code(), ResultCode::CapacityExceeded);

    let internship = service.internship(internship.id).expect("internship");
    assert_eq!(internship.confirmed_offers(), 1);
}

#[test]
fn fourth_active_application_is_refused() {
    let service = memory_service();
    let postings: Vec<_> = (1..=4)
        .map(|index| published(&service, &format!("Intern {index}"), 2))
        .collect();

    for posting in &postings[..3] {
        service
            .apply(&student("alice"), posting.id)
            .expect("within limit");
    }

    let err = service
        .apply(&student("alice"), postings[3].id)
        .expect_err("limit reached");
    assert_eq!(err.code(), ResultCode::PolicyViolation);
    assert_eq!(
        service
            .applications_for_student(&student("alice"))
            .expect("applications")
            .len(),
        3
    );
}

#[test]
fn acceptance_withdraws_sibling_applications() {
    let service = memory_service();
    let chosen = published(&service, "Chosen", 2);
    let waiting = published(&service, "Waiting", 2);
    let backup = published(&service, "Backup", 2);

    let accepted_id = offered(&service, "alice", &chosen);
    let pending = service
        .apply(&student("alice"), waiting.id)
        .expect("pending application");
    let backup_offer = offered(&service, "alice", &backup);

    let outcome = service
        .accept_offer(&student("alice"), accepted_id)
        .expect("accept");
    assert_eq!(outcome.withdrawn.len(), 2);

    let pending = service.application(pending.id).expect("pending");
    assert_eq!(pending.status(), ApplicationStatus::PendingWithdrawn);
    assert!(!pending.withdrawal_requested());

    let backup = service.application(backup_offer).expect("backup");
    assert_eq!(backup.status(), ApplicationStatus::SuccessfulWithdrawn);
    assert!(!backup.withdrawal_requested());
}

#[test]
fn approved_withdrawal_reopens_filled_posting() {
    let service = memory_service();
    let internship = published(&service, "Analytics Intern", 3);

    let mut alice_application = None;
    for id in ["alice", "bob", "cara"] {
        let application = offered(&service, id, &internship);
        service
            .accept_offer(&student(id), application)
            .expect("accept");
        if id == "alice" {
            alice_application = Some(application);
        }
    }
    let alice_application = alice_application.expect("alice accepted");
    let filled = service.internship(internship.id).expect("internship");
    assert_eq!(filled.confirmed_offers(), 3);
    assert_eq!(filled.status(), InternshipStatus::Filled);

    service
        .request_withdrawal(&student("alice"), alice_application)
        .expect("request");
    assert_eq!(service.pending_withdrawals().expect("pending").len(), 1);

    let withdrawn = service
        .decide_withdrawal(&staff(), alice_application, true)
        .expect("approve");
    assert_eq!(withdrawn.status(), ApplicationStatus::SuccessfulWithdrawn);

    let reopened = service.internship(internship.id).expect("internship");
    assert_eq!(reopened.confirmed_offers(), 2);
    assert_eq!(reopened.status(), InternshipStatus::Approved);
}

#[test]
fn csv_store_round_trips_through_reload() {
    let dir = std::env::temp_dir().join(format!("placement-workflow-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let (internships, applications) = {
        let (store, _) = CsvPlacementStore::open(&dir).expect("open");
        let service = service(Arc::new(store), directory());
        let internship = published(&service, "Round Trip Intern", 2);
        let application = offered(&service, "alice", &internship);
        service
            .accept_offer(&student("alice"), application)
            .expect("accept");
        service
            .request_withdrawal(&student("alice"), application)
            .expect("request");
        service.apply(&student("bob"), internship.id).expect("apply");

        let repository = service.repository();
        (
            repository.internships().expect("internships"),
            repository.applications().expect("applications"),
        )
    };

    let (reloaded, report) = CsvPlacementStore::open(&dir).expect("reopen");
    assert!(report.is_clean());
    assert_eq!(reloaded.internships().expect("internships"), internships);
    assert_eq!(reloaded.applications().expect("applications"), applications);

    let people = CsvDirectory::open(&dir).expect("empty directory");
    assert_eq!(people.counts(), (0, 0, 0));

    let _ = std::fs::remove_dir_all(&dir);
}
