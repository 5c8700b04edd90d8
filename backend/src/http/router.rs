//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Window
        .route("/window", get(handlers::get_window).put(handlers::set_window))
        // Sessions
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_date_group),
        )
        .route(
            "/sessions/{date}/{period}/capacity",
            put(handlers::set_session_capacity),
        )
        .route("/sessions/{date}/{period}/close", post(handlers::close_session))
        .route("/sessions/{date}/{period}/reopen", post(handlers::reopen_session))
        .route("/sessions/{date}/code", post(handlers::generate_session_code))
        // Date-level batch operations
        .route("/dates/{date}/force-close", post(handlers::force_close))
        .route("/reschedule", post(handlers::reschedule))
        // Registrations
        .route(
            "/registrations",
            get(handlers::list_registrations).post(handlers::register),
        )
        .route("/registrations/bulk-assign", post(handlers::bulk_assign))
        .route("/registrations/archive", post(handlers::archive_terminal))
        .route("/registrations/{id}", get(handlers::get_registration))
        .route("/registrations/{id}/assign", post(handlers::assign_registration))
        .route("/registrations/{id}/manual-assign", post(handlers::manual_assign))
        .route("/registrations/{id}/complete", post(handlers::complete_registration))
        .route("/registrations/{id}/cancel", post(handlers::cancel_registration))
        // Sync
        .route("/snapshot", get(handlers::snapshot));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::repo_config::SchedulingSettings;
    use crate::db::repositories::LocalRepository;
    use crate::scheduling::SchedulingService;

    fn app() -> Router {
        let repo = Arc::new(LocalRepository::new());
        let service = SchedulingService::with_system_clock(repo, SchedulingSettings::default());
        create_router(AppState::new(Arc::new(service)))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_period_is_bad_request() {
        let response = app()
            .oneshot(
                Request::post("/v1/sessions/2030-01-10/evening/close")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_registration_is_not_found() {
        let response = app()
            .oneshot(Request::get("/v1/registrations/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
