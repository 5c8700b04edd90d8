//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`SchedulingService`](crate::scheduling::SchedulingService).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;

use super::dto::{
    ArchiveRequest, BulkAssignRequest, BulkAssignResponse, CreateDateGroupRequest,
    ForceCloseRequest, GenerateCodeRequest, HealthResponse, RegisterRequest,
    RegistrationListQuery, RegistrationListResponse, RescheduleRequest, SessionListQuery,
    SessionListResponse, SetCapacityRequest, TargetDto,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{
    DateGroup, Registration, RegistrationId, RegistrationWindow, Session, SessionKey, SessionPeriod,
};
use crate::scheduling::{
    ArchiveResult, Assignment, ClosureReport, Mutation, RescheduleResult, SchedulingSnapshot,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn session_key(date: NaiveDate, period: &str) -> Result<SessionKey, AppError> {
    let period: SessionPeriod = period.parse().map_err(AppError::BadRequest)?;
    Ok(SessionKey::new(date, period))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match state.service.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        repository,
    }))
}

// =============================================================================
// Window
// =============================================================================

/// GET /v1/window
///
/// The window as observed today, with auto-close applied.
pub async fn get_window(State(state): State<AppState>) -> HandlerResult<RegistrationWindow> {
    Ok(Json(state.service.get_window().await?))
}

/// PUT /v1/window
pub async fn set_window(
    State(state): State<AppState>,
    Json(window): Json<RegistrationWindow>,
) -> HandlerResult<Mutation<RegistrationWindow>> {
    Ok(Json(state.service.set_window(window).await?))
}

// =============================================================================
// Sessions
// =============================================================================

/// GET /v1/sessions?start=&end=
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> HandlerResult<SessionListResponse> {
    let date_groups = state.service.list_sessions(query.range()).await?;
    let total = date_groups.len();
    Ok(Json(SessionListResponse { date_groups, total }))
}

/// POST /v1/sessions
///
/// Creates the morning and afternoon sessions of one date.
pub async fn create_date_group(
    State(state): State<AppState>,
    Json(request): Json<CreateDateGroupRequest>,
) -> Result<(StatusCode, Json<Mutation<DateGroup>>), AppError> {
    let created = state
        .service
        .create_date_group(request.date, request.capacity, request.times)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /v1/sessions/{date}/{period}/capacity
pub async fn set_session_capacity(
    State(state): State<AppState>,
    Path((date, period)): Path<(NaiveDate, String)>,
    Json(request): Json<SetCapacityRequest>,
) -> HandlerResult<Mutation<Session>> {
    let key = session_key(date, &period)?;
    Ok(Json(state.service.set_session_capacity(key, request.capacity).await?))
}

/// POST /v1/sessions/{date}/{period}/close
pub async fn close_session(
    State(state): State<AppState>,
    Path((date, period)): Path<(NaiveDate, String)>,
) -> HandlerResult<Mutation<Session>> {
    let key = session_key(date, &period)?;
    Ok(Json(state.service.close_session(key).await?))
}

/// POST /v1/sessions/{date}/{period}/reopen
pub async fn reopen_session(
    State(state): State<AppState>,
    Path((date, period)): Path<(NaiveDate, String)>,
) -> HandlerResult<Mutation<Session>> {
    let key = session_key(date, &period)?;
    Ok(Json(state.service.reopen_session(key).await?))
}

/// POST /v1/sessions/{date}/code
pub async fn generate_session_code(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(request): Json<GenerateCodeRequest>,
) -> HandlerResult<Mutation<String>> {
    Ok(Json(
        state
            .service
            .generate_session_code(date, &request.exam_ref)
            .await?,
    ))
}

// =============================================================================
// Date-level operations
// =============================================================================

/// POST /v1/dates/{date}/force-close
pub async fn force_close(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    body: Option<Json<ForceCloseRequest>>,
) -> HandlerResult<Mutation<ClosureReport>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let target = request.reschedule_target.map(SessionKey::from);
    Ok(Json(state.service.force_close(date, target).await?))
}

/// POST /v1/reschedule
pub async fn reschedule(
    State(state): State<AppState>,
    Json(request): Json<RescheduleRequest>,
) -> HandlerResult<Mutation<RescheduleResult>> {
    let target = SessionKey::new(request.to_date, request.to_period);
    Ok(Json(state.service.reschedule(request.from_date, target).await?))
}

// =============================================================================
// Registrations
// =============================================================================

/// GET /v1/registrations?status=&assigned_date=&include_archived=
pub async fn list_registrations(
    State(state): State<AppState>,
    Query(query): Query<RegistrationListQuery>,
) -> HandlerResult<RegistrationListResponse> {
    let filter = query.filter().map_err(AppError::BadRequest)?;
    let registrations = state.service.list_registrations(&filter).await?;
    let total = registrations.len();
    Ok(Json(RegistrationListResponse {
        registrations,
        total,
    }))
}

/// POST /v1/registrations
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Mutation<Registration>>), AppError> {
    let created = state
        .service
        .register(&request.examinee_ref, request.registration_date)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/registrations/{id}
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Registration> {
    Ok(Json(state.service.get_registration(RegistrationId::new(id)).await?))
}

/// POST /v1/registrations/{id}/assign
///
/// Places the registration in the earliest eligible session.
pub async fn assign_registration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Mutation<Assignment>> {
    Ok(Json(
        state
            .service
            .assign_registration(RegistrationId::new(id))
            .await?,
    ))
}

/// POST /v1/registrations/{id}/manual-assign
pub async fn manual_assign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(target): Json<TargetDto>,
) -> HandlerResult<Mutation<Assignment>> {
    Ok(Json(
        state
            .service
            .manual_assign(RegistrationId::new(id), target.into())
            .await?,
    ))
}

/// POST /v1/registrations/{id}/complete
pub async fn complete_registration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Mutation<Registration>> {
    Ok(Json(
        state
            .service
            .complete_registration(RegistrationId::new(id))
            .await?,
    ))
}

/// POST /v1/registrations/{id}/cancel
pub async fn cancel_registration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Mutation<Registration>> {
    Ok(Json(
        state
            .service
            .cancel_registration(RegistrationId::new(id))
            .await?,
    ))
}

/// POST /v1/registrations/bulk-assign
///
/// Per-item failures are reported in the body; the request itself succeeds.
pub async fn bulk_assign(
    State(state): State<AppState>,
    Json(request): Json<BulkAssignRequest>,
) -> HandlerResult<BulkAssignResponse> {
    let target = SessionKey::new(request.date, request.period);
    let outcome = state.service.bulk_assign(&request.ids, target).await?;
    Ok(Json(outcome.into()))
}

/// POST /v1/registrations/archive
pub async fn archive_terminal(
    State(state): State<AppState>,
    body: Option<Json<ArchiveRequest>>,
) -> HandlerResult<Mutation<ArchiveResult>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let selection = request.selection().map_err(AppError::BadRequest)?;
    Ok(Json(state.service.archive_terminal(&selection).await?))
}

// =============================================================================
// Sync
// =============================================================================

/// GET /v1/snapshot
///
/// Full state for callers refreshing a local projection.
pub async fn snapshot(State(state): State<AppState>) -> HandlerResult<SchedulingSnapshot> {
    Ok(Json(state.service.snapshot().await?))
}
