//! HTTP routing and the JSON response envelope

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Failure that still carries a payload, e.g. partial progress
    pub fn error_with(message: impl Into<String>, data: T) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Success with a custom message
    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/user/current", get(handlers::auth::current_user))
        // Config routes
        .route("/config", get(handlers::config::get_config))
        // Dashboard
        .route("/dashboard/stats", get(handlers::dashboard::get_stats))
        // Department routes
        .route("/department/add", post(handlers::department::add_department))
        .route("/department/query", get(handlers::department::get_departments))
        .route("/department/tree", get(handlers::department::get_department_tree))
        // Asset routes
        .route("/asset/create", post(handlers::asset::create_asset))
        .route("/asset/list", get(handlers::asset::list_assets))
        .route("/asset/delete", post(handlers::asset::delete_asset_by_id))
        .route(
            "/asset/import",
            post(handlers::import::import_assets)
                .layer(DefaultBodyLimit::max(state.config.max_upload_size)),
        )
        .route("/asset/:code", get(handlers::asset::get_asset))
        .route("/asset/:code/update", post(handlers::asset::update_asset))
        .route("/asset/:code/delete", post(handlers::asset::delete_asset))
        .route("/asset/:code/qr", get(handlers::asset::asset_qr))
        .route("/asset/:code/label", get(handlers::asset::asset_label))
        .fallback(fallback);

    // Static file service for the frontend, falling back to index.html for SPA routing
    let static_dir = state.config.static_dir.clone();
    let index_file = static_dir.join("index.html");
    let serve_dir = ServeDir::new(&static_dir).not_found_service(ServeFile::new(&index_file));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Not Found")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope() {
        let body = serde_json::to_value(ApiResponse::<()>::error("삭제 권한이 없습니다.")).unwrap();
        assert_eq!(body["code"], false);
        assert_eq!(body["message"], "삭제 권한이 없습니다.");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_error_with_payload() {
        let body = serde_json::to_value(ApiResponse::error_with("stopped", 3)).unwrap();
        assert_eq!(body["code"], false);
        assert_eq!(body["data"], 3);
    }

    #[tokio::test]
    async fn test_fallback_is_not_found() {
        let (status, Json(body)) = fallback().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.code);
    }
}
