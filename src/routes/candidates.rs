use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::candidate_dto::{
        CreateCandidateRequest, CreateCandidateResponse, DuplicateCandidateResponse, IntakeQuery,
        ListCandidatesQuery, ListCandidatesResponse, ListFilters, Pagination, ReviewCandidateRequest,
    },
    error::Result,
    models::candidate::CandidateWithEmails,
    services::intake_service::IntakeOutcome,
    utils::time,
    AppState,
};

pub async fn create_candidate(
    State(state): State<AppState>,
    Query(query): Query<IntakeQuery>,
    Json(payload): Json<CreateCandidateRequest>,
) -> Result<Response> {
    payload.validate()?;
    let silent = query.is_silent();
    let candidate = payload.into_new_candidate(time::now());

    let response = match state.intake_service.submit(candidate, silent).await? {
        IntakeOutcome::Created { id, notification } => {
            if !silent && !notification.is_applied() {
                tracing::warn!(candidate_id = %id, ?notification, "candidate stored without a reviewer alert");
            }
            (
                StatusCode::CREATED,
                Json(CreateCandidateResponse {
                    success: true,
                    id,
                    silent,
                }),
            )
                .into_response()
        }
        IntakeOutcome::Duplicate(id) => (
            StatusCode::CONFLICT,
            Json(DuplicateCandidateResponse {
                error: "Candidate already exists".to_string(),
                id,
            }),
        )
            .into_response(),
    };
    Ok(response)
}

pub async fn list_candidates(
    State(state): State<AppState>,
    Query(query): Query<ListCandidatesQuery>,
) -> Result<Json<ListCandidatesResponse>> {
    let filter = query.to_filter(time::now().date_naive())?;
    let page = state.store.list_candidates(&filter).await?;
    let cities = state.store.distinct_cities().await?;

    Ok(Json(ListCandidatesResponse {
        candidates: page.candidates,
        pagination: Pagination::new(query.page(), query.limit(), page.total),
        filters: ListFilters { cities },
    }))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateWithEmails>> {
    Ok(Json(state.review_service.get_candidate(id).await?))
}

pub async fn review_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewCandidateRequest>,
) -> Result<Json<CandidateWithEmails>> {
    let (changes, reviewer) = payload.into_changes()?;
    let outcome = state
        .review_service
        .review_candidate(id, changes, reviewer)
        .await?;
    tracing::debug!(
        candidate_id = %id,
        transition = ?outcome.transition,
        contact_sync = ?outcome.contact_sync,
        notification = ?outcome.notification,
        "review request handled"
    );
    Ok(Json(outcome.candidate))
}
