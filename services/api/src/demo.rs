use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use placement::error::AppError;
use placement::workflows::placement::{
    ApplicationId, CompanyDecision, FixedClock, InMemoryDirectory, InMemoryPlacementRepository,
    Internship, InternshipDraft, InternshipLevel, PlacementError, PlacementPolicy,
    PlacementService, RepresentativeId, RepresentativeProfile, StaffId, StaffProfile, StudentId,
    StudentProfile,
};
use std::fmt::Display;
use std::sync::Arc;

type DemoService = PlacementService<InMemoryPlacementRepository, InMemoryDirectory>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the demo date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

const REPRESENTATIVE: &str = "rep-ada";
const STAFF: &str = "staff-kim";
const STUDENTS: [(&str, &str, u8); 3] = [
    ("stu-alice", "Alice Ng", 3),
    ("stu-bob", "Bob Diaz", 4),
    ("stu-cara", "Cara Wu", 1),
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let service = demo_service(today);
    let representative = RepresentativeId::new(REPRESENTATIVE);
    let staff = StaffId::new(STAFF);
    let alice = StudentId::new(STUDENTS[0].0);
    let bob = StudentId::new(STUDENTS[1].0);
    let cara = StudentId::new(STUDENTS[2].0);

    println!("Internship placement demo ({today})");

    println!("\nPostings");
    let robotics = publish(&service, &representative, &staff, draft("Robotics Intern", 1, today))?;
    let analytics = publish(&service, &representative, &staff, draft("Analytics Intern", 2, today))?;
    for internship in service.internships_for_representative(&representative)? {
        println!("- {}", describe(&internship));
    }

    println!("\nApplications");
    let alice_robotics = service.apply(&alice, robotics.id)?.id;
    let bob_robotics = service.apply(&bob, robotics.id)?.id;
    let alice_analytics = service.apply(&alice, analytics.id)?.id;
    println!("- alice applied to #{} and #{}", robotics.id, analytics.id);
    println!("- bob applied to #{}", robotics.id);
    report(
        "cara (year 1) applies to an intermediate posting",
        service.apply(&cara, robotics.id).map(|app| app.id),
    );

    println!("\nOffers");
    for application in [alice_robotics, bob_robotics] {
        service.company_decision(&representative, application, CompanyDecision::Offer)?;
        println!("- offer sent on application {application}");
    }

    println!("\nAcceptance race for the single robotics seat");
    let accepted = service.accept_offer(&alice, alice_robotics)?;
    println!(
        "- alice accepted; robotics now {} ({}/{} confirmed), {} sibling application(s) withdrawn",
        accepted.internship.status(),
        accepted.internship.confirmed_offers(),
        accepted.internship.slots(),
        accepted.withdrawn.len()
    );
    println!(
        "- alice's analytics application is now {}",
        service.application(alice_analytics)?.status()
    );
    report(
        "bob accepts the same seat",
        service.accept_offer(&bob, bob_robotics).map(|offer| offer.application.id),
    );

    println!("\nWithdrawal");
    service.request_withdrawal(&alice, alice_robotics)?;
    println!(
        "- alice requested withdrawal; {} request(s) awaiting staff",
        service.pending_withdrawals()?.len()
    );
    service.decide_withdrawal(&staff, alice_robotics, true)?;
    let reopened = service.internship(robotics.id)?;
    println!("- staff approved; robotics back to {}", describe(&reopened));
    report(
        "bob accepts the reopened seat",
        service.accept_offer(&bob, bob_robotics).map(|offer| offer.application.id),
    );

    println!("\nReconciliation");
    let reconciliation = service.reconcile()?;
    println!(
        "- {} internships examined, {} adjusted",
        reconciliation.examined,
        reconciliation.adjustments.len()
    );

    Ok(())
}

fn demo_service(today: NaiveDate) -> DemoService {
    let directory = STUDENTS.iter().fold(
        InMemoryDirectory::new()
            .with_representative(RepresentativeProfile {
                id: RepresentativeId::new(REPRESENTATIVE),
                name: "Ada Park".to_string(),
                company_name: "Acme Robotics".to_string(),
                approved: true,
            })
            .with_staff(StaffProfile {
                id: StaffId::new(STAFF),
                name: "Kim Tan".to_string(),
                department: "Career Office".to_string(),
            }),
        |directory, (id, name, year)| {
            directory.with_student(StudentProfile {
                id: StudentId::new(*id),
                name: name.to_string(),
                year_of_study: *year,
                major: "Computer Science".to_string(),
            })
        },
    );

    PlacementService::with_clock(
        Arc::new(InMemoryPlacementRepository::new()),
        Arc::new(directory),
        PlacementPolicy::default(),
        Arc::new(FixedClock(today)),
    )
}

fn draft(title: &str, slots: u8, today: NaiveDate) -> InternshipDraft {
    InternshipDraft {
        title: title.to_string(),
        description: format!("{title} rotation with the platform team"),
        level: InternshipLevel::Intermediate,
        preferred_major: "Computer Science".to_string(),
        opening_date: Some(today - Duration::days(7)),
        closing_date: Some(today + Duration::days(30)),
        slots,
    }
}

fn publish(
    service: &DemoService,
    representative: &RepresentativeId,
    staff: &StaffId,
    draft: InternshipDraft,
) -> Result<Internship, PlacementError> {
    let created = service.create_internship(representative, draft)?;
    service.review_internship(staff, created.id, true)
}

fn describe(internship: &Internship) -> String {
    format!(
        "#{} {} | {} | {}/{} confirmed",
        internship.id,
        internship.title,
        internship.status(),
        internship.confirmed_offers(),
        internship.slots()
    )
}

fn report<T: Display>(label: &str, result: Result<T, PlacementError>) {
    match result {
        Ok(value) => println!("- {label}: ok ({value})"),
        Err(err) => println!("- {label}: refused, {err}"),
    }
}
