use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::domain::{
    ApplicationId, InternshipDraft, InternshipId, RepresentativeId, StaffId, StudentId,
};
use super::repository::{Directory, PlacementRepository, RepositoryError};
use super::service::{CompanyDecision, PlacementError, PlacementService, ResultCode};
use super::views::{AcceptedOfferView, ApplicationView, InternshipView, OperationOutcome};

type SharedService<R, D> = Arc<PlacementService<R, D>>;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInternshipRequest {
    pub representative_id: RepresentativeId,
    #[serde(flatten)]
    pub draft: InternshipDraft,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub staff_id: StaffId,
    pub approve: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityRequest {
    pub representative_id: RepresentativeId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRequest {
    pub student_id: StudentId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    pub representative_id: RepresentativeId,
    pub decision: CompanyDecision,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentActionRequest {
    pub student_id: StudentId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalDecisionRequest {
    pub staff_id: StaffId,
    pub approve: bool,
}

/// Router builder exposing the allocation engine over HTTP.
pub fn placement_router<R, D>(service: SharedService<R, D>) -> Router
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    Router::new()
        .route("/api/v1/internships", post(create_internship_handler::<R, D>))
        .route(
            "/api/v1/internships/:internship_id",
            get(internship_handler::<R, D>),
        )
        .route(
            "/api/v1/internships/:internship_id/review",
            post(review_handler::<R, D>),
        )
        .route(
            "/api/v1/internships/:internship_id/visibility",
            post(visibility_handler::<R, D>),
        )
        .route(
            "/api/v1/internships/:internship_id/applications",
            post(apply_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/decision",
            post(decision_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/accept",
            post(accept_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/withdrawal",
            post(withdrawal_request_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/withdrawal/decision",
            post(withdrawal_decision_handler::<R, D>),
        )
        .route(
            "/api/v1/representatives/pending",
            get(pending_representatives_handler::<R, D>),
        )
        .route(
            "/api/v1/representatives/:representative_id/review",
            post(representative_review_handler::<R, D>),
        )
        .route("/api/v1/reconcile", post(reconcile_handler::<R, D>))
        .with_state(service)
}

pub(crate) fn status_for(code: ResultCode) -> StatusCode {
    match code {
        ResultCode::Ok => StatusCode::OK,
        ResultCode::NotFound => StatusCode::NOT_FOUND,
        ResultCode::NotOwner => StatusCode::FORBIDDEN,
        ResultCode::InvalidState | ResultCode::CapacityExceeded => StatusCode::CONFLICT,
        ResultCode::PolicyViolation => StatusCode::UNPROCESSABLE_ENTITY,
        ResultCode::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run a service call on the blocking pool; commits may hit the disk.
async fn run_blocking<T, F>(operation: F) -> Result<T, PlacementError>
where
    F: FnOnce() -> Result<T, PlacementError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .unwrap_or_else(|err| {
            Err(PlacementError::Repository(RepositoryError::Unavailable(format!(
                "placement worker stopped: {err}"
            ))))
        })
}

fn respond<T, V>(
    result: Result<T, PlacementError>,
    success: StatusCode,
    message: &str,
    view: impl FnOnce(T) -> V,
) -> Response
where
    V: Serialize,
{
    match result {
        Ok(value) => {
            let outcome = OperationOutcome::ok(message, view(value));
            (success, axum::Json(outcome)).into_response()
        }
        Err(err) => {
            if err.code() == ResultCode::StorageFailure {
                error!(error = %err, "placement operation failed in storage");
            }
            let outcome = OperationOutcome::<V>::failure(&err);
            (status_for(outcome.code), axum::Json(outcome)).into_response()
        }
    }
}

pub(crate) async fn create_internship_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    axum::Json(request): axum::Json<CreateInternshipRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.create_internship(&request.representative_id, request.draft)
    })
    .await;
    respond(
        result,
        StatusCode::CREATED,
        "internship created",
        |internship| InternshipView::from(&internship),
    )
}

pub(crate) async fn internship_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(internship_id): Path<u32>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.internship(InternshipId(internship_id))
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "internship found",
        |internship| InternshipView::from(&internship),
    )
}

pub(crate) async fn review_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(internship_id): Path<u32>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.review_internship(&request.staff_id, InternshipId(internship_id), request.approve)
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "internship reviewed",
        |internship| InternshipView::from(&internship),
    )
}

pub(crate) async fn visibility_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(internship_id): Path<u32>,
    axum::Json(request): axum::Json<VisibilityRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.toggle_visibility(&request.representative_id, InternshipId(internship_id))
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "visibility toggled",
        |internship| InternshipView::from(&internship),
    )
}

pub(crate) async fn apply_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(internship_id): Path<u32>,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.apply(&request.student_id, InternshipId(internship_id))
    })
    .await;
    respond(
        result,
        StatusCode::CREATED,
        "application submitted",
        |application| ApplicationView::from(&application),
    )
}

pub(crate) async fn application_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(application_id): Path<u32>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.application(ApplicationId(application_id))
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "application found",
        |application| ApplicationView::from(&application),
    )
}

pub(crate) async fn decision_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(application_id): Path<u32>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.company_decision(
            &request.representative_id,
            ApplicationId(application_id),
            request.decision,
        )
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "decision recorded",
        |application| ApplicationView::from(&application),
    )
}

pub(crate) async fn accept_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(application_id): Path<u32>,
    axum::Json(request): axum::Json<StudentActionRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.accept_offer(&request.student_id, ApplicationId(application_id))
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "offer accepted",
        |accepted| AcceptedOfferView::from(&accepted),
    )
}

pub(crate) async fn reject_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(application_id): Path<u32>,
    axum::Json(request): axum::Json<StudentActionRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.reject_offer(&request.student_id, ApplicationId(application_id))
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "offer rejected",
        |application| ApplicationView::from(&application),
    )
}

pub(crate) async fn withdrawal_request_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(application_id): Path<u32>,
    axum::Json(request): axum::Json<StudentActionRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.request_withdrawal(&request.student_id, ApplicationId(application_id))
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "withdrawal requested",
        |application| ApplicationView::from(&application),
    )
}

pub(crate) async fn withdrawal_decision_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(application_id): Path<u32>,
    axum::Json(request): axum::Json<WithdrawalDecisionRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.decide_withdrawal(&request.staff_id, ApplicationId(application_id), request.approve)
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "withdrawal decided",
        |application| ApplicationView::from(&application),
    )
}

pub(crate) async fn representative_review_handler<R, D>(
    State(service): State<SharedService<R, D>>,
    Path(representative_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    let result = run_blocking(move || {
        service.review_representative(
            &request.staff_id,
            &RepresentativeId::new(representative_id),
            request.approve,
        )
    })
    .await;
    respond(
        result,
        StatusCode::OK,
        "representative reviewed",
        std::convert::identity,
    )
}

pub(crate) async fn pending_representatives_handler<R, D>(
    State(service): State<SharedService<R, D>>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    respond(
        run_blocking(move || service.pending_representatives()).await,
        StatusCode::OK,
        "pending representatives",
        std::convert::identity,
    )
}

pub(crate) async fn reconcile_handler<R, D>(
    State(service): State<SharedService<R, D>>,
) -> Response
where
    R: PlacementRepository + 'static,
    D: Directory + 'static,
{
    respond(
        run_blocking(move || service.reconcile()).await,
        StatusCode::OK,
        "reconciliation complete",
        std::convert::identity,
    )
}
