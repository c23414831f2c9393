use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::Duration;
use tower::ServiceExt;

use crate::workflows::placement::clock::FixedClock;
use crate::workflows::placement::domain::{
    Application, ApplicationId, ApplicationStatus, Internship, InternshipId,
};
use crate::workflows::placement::eligibility::PlacementPolicy;
use crate::workflows::placement::repository::{ChangeSet, PlacementRepository, RepositoryError};
use crate::workflows::placement::router::{self, placement_router, StudentActionRequest};
use crate::workflows::placement::service::PlacementService;
use crate::workflows::placement::storage::InMemoryPlacementRepository;

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn apply_route_returns_created_application() {
    let (service, _) = build_service(vec![internship(1, 2)], Vec::new());
    let router = placement_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/internships/1/applications",
            json!({ "student_id": "alice" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["code"], json!("ok"));
    assert_eq!(body["data"]["status"], json!("PENDING"));
    assert_eq!(body["data"]["internship_id"], json!(1));
}

#[tokio::test]
async fn apply_route_maps_policy_violation_to_unprocessable() {
    let (service, _) = build_service(vec![internship(1, 2)], Vec::new());
    let router = placement_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/internships/1/applications",
            json!({ "student_id": "biologist" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("policy_violation"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let (service, _) = build_service(Vec::new(), Vec::new());
    let router = placement_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/applications/404")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["code"], json!("not_found"));
}

#[tokio::test]
async fn decision_route_rejects_foreign_representative() {
    let (service, _) = build_service(
        vec![internship(1, 2)],
        vec![application(1, "alice", 1, ApplicationStatus::Pending)],
    );
    let router = placement_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/applications/1/decision",
            json!({ "representative_id": GLOBEX_REP, "decision": "offer" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn accept_route_reports_cascade() {
    let (service, _) = build_service(
        vec![internship(1, 1), internship(2, 2)],
        vec![
            application(1, "alice", 1, ApplicationStatus::SuccessfulPending),
            application(2, "alice", 2, ApplicationStatus::Pending),
        ],
    );
    let router = placement_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/applications/1/accept",
            json!({ "student_id": "alice" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["data"]["application"]["status"], json!("SUCCESSFUL_ACCEPTED"));
    assert_eq!(body["data"]["internship"]["status"], json!("FILLED"));
    assert_eq!(body["data"]["internship"]["available_slots"], json!(0));
    assert_eq!(body["data"]["withdrawn"][0]["status"], json!("PENDING_WITHDRAWN"));
}

#[tokio::test]
async fn accept_handler_maps_capacity_to_conflict() {
    let (service, _) = build_service(
        vec![internship(1, 1)],
        vec![
            application(1, "alice", 1, ApplicationStatus::SuccessfulAccepted),
            application(2, "bob", 1, ApplicationStatus::SuccessfulPending),
        ],
    );

    let response = router::accept_handler(
        State(service),
        Path(2),
        axum::Json(StudentActionRequest {
            student_id: student_id("bob"),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["code"], json!("capacity_exceeded"));
}

#[tokio::test]
async fn withdrawal_round_trip_over_http() {
    let (service, repository) = build_service(
        vec![internship(1, 1)],
        vec![application(1, "alice", 1, ApplicationStatus::SuccessfulAccepted)],
    );
    let router = placement_router(service);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/applications/1/withdrawal",
            json!({ "student_id": "alice" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(post_json(
            "/api/v1/applications/1/withdrawal/decision",
            json!({ "staff_id": STAFF, "approve": true }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        stored_application(&repository, 1).status(),
        ApplicationStatus::SuccessfulWithdrawn
    );
    assert_eq!(stored_internship(&repository, 1).confirmed_offers(), 0);
}

#[tokio::test]
async fn create_and_review_internship_routes() {
    let (service, _) = build_service(Vec::new(), Vec::new());
    let router = placement_router(service);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/internships",
            json!({
                "representative_id": ACME_REP,
                "title": "Firmware Intern",
                "level": "BASIC",
                "preferred_major": "Electrical Engineering",
                "opening_date": "2025-02-01",
                "closing_date": "2025-04-30",
                "slots": 2
            }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["data"]["status"], json!("PENDING"));
    let id = body["data"]["internship_id"].as_u64().expect("numeric id");

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/internships/{id}/review"),
            json!({ "staff_id": STAFF, "approve": true }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["data"]["status"], json!("APPROVED"));
    assert_eq!(body["data"]["visible"], json!(true));

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/internships/{id}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn representative_review_routes() {
    let (service, _) = build_service(Vec::new(), Vec::new());
    let router = placement_router(service);

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/representatives/pending")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["data"][0]["id"], json!(INITECH_REP));
    assert_eq!(body["data"][0]["approved"], json!(false));

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/representatives/{INITECH_REP}/review"),
            json!({ "staff_id": STAFF, "approve": true }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["data"]["approved"], json!(true));

    let response = router
        .oneshot(
            Request::get("/api/v1/representatives/pending")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    let body = read_json_body(response).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn storage_failure_is_internal_error() {
    let repository = Arc::new(ReadOnlyRepository {
        internship: internship(1, 2),
        application: application(1, "alice", 1, ApplicationStatus::SuccessfulPending),
    });
    let service = Arc::new(PlacementService::new(
        repository,
        Arc::new(directory()),
        PlacementPolicy::default(),
    ));
    let router = placement_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/applications/1/reject",
            json!({ "student_id": "alice" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert_eq!(body["code"], json!("storage_failure"));
}

#[tokio::test]
async fn reconcile_route_returns_report() {
    let (service, _) = build_service(vec![internship(1, 2)], Vec::new());
    let router = placement_router(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/reconcile")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["data"]["examined"], json!(1));
    assert_eq!(body["data"]["adjustments"], json!([]));
}

/// Holds every commit until the test releases it.
struct HeldCommitRepository {
    inner: InMemoryPlacementRepository,
    entered: AtomicBool,
    release: Mutex<mpsc::Receiver<()>>,
}

impl PlacementRepository for HeldCommitRepository {
    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        self.inner.fetch_internship(id)
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn internships(&self) -> Result<Vec<Internship>, RepositoryError> {
        self.inner.internships()
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications()
    }

    fn next_internship_id(&self) -> Result<InternshipId, RepositoryError> {
        self.inner.next_internship_id()
    }

    fn next_application_id(&self) -> Result<ApplicationId, RepositoryError> {
        self.inner.next_application_id()
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError> {
        self.entered.store(true, Ordering::SeqCst);
        let release = self.release.lock().unwrap_or_else(PoisonError::into_inner);
        release
            .recv_timeout(Duration::from_secs(2))
            .map_err(|_| RepositoryError::Unavailable("commit never released".to_string()))?;
        self.inner.commit(changes)
    }
}

#[tokio::test]
async fn slow_commit_does_not_stall_the_runtime() {
    let (inner, _) = InMemoryPlacementRepository::from_records(vec![internship(1, 2)], Vec::new());
    let (release, held) = mpsc::channel();
    let repository = Arc::new(HeldCommitRepository {
        inner,
        entered: AtomicBool::new(false),
        release: Mutex::new(held),
    });
    let service = Arc::new(PlacementService::with_clock(
        repository.clone(),
        Arc::new(directory()),
        PlacementPolicy::default(),
        Arc::new(FixedClock(today())),
    ));
    let router = placement_router(service);

    let request = tokio::spawn(router.oneshot(post_json(
        "/api/v1/internships/1/applications",
        json!({ "student_id": "alice" }),
    )));
    while !repository.entered.load(Ordering::SeqCst) {
        tokio::task::yield_now().await;
    }
    release.send(()).expect("commit waiting");

    let response = request
        .await
        .expect("request task")
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(repository.inner.applications().expect("readable").len(), 1);
}
