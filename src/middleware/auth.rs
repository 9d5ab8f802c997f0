//! Authentication middleware
//!
//! Validates the session cookie and attaches the acting user to the request

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;
use std::ops::Deref;

use crate::assets::Scope;
use crate::auth::{verify_token, SESSION_COOKIE};
use crate::entity::user::{self, Role};
use crate::state::AppState;

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub DatabaseConnection);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extension to store current user in request
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub employee_id: String,
    pub role: Role,
    /// Department label of the user
    pub department: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Visibility scope for listings and the dashboard
    pub fn scope(&self) -> Scope {
        Scope::for_user(self.role, &self.department)
    }
}

impl From<user::Model> for CurrentUser {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            role: model.role(),
            employee_id: model.employee_id,
            department: model.department,
        }
    }
}

/// Paths that don't require authentication
fn is_public_path(path: &str) -> bool {
    // Non-API routes are static files
    if !path.starts_with("/api") {
        return true;
    }

    matches!(path, "/api/login" | "/api/logout" | "/api/health")
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": reason}))).into_response()
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(DbConn(state.db.clone()));

    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return unauthorized("unauthorized");
    };

    let claims = match verify_token(&token, &state.config.auth) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected session token: {}", e);
            return unauthorized("invalid_session");
        }
    };

    // Re-read the user so role and department changes apply immediately
    match user::Entity::find_by_id(claims.sub).one(&state.db).await {
        Ok(Some(user_model)) => {
            request.extensions_mut().insert(CurrentUser::from(user_model));
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!("User not found in database: {}", claims.employee_id);
            unauthorized("invalid_session")
        }
        Err(e) => {
            tracing::error!("Database error during auth: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
                .into_response()
        }
    }
}
