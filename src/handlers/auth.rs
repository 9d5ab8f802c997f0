//! Authentication handlers
//!
//! Implements login, logout, and current user endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::auth::{issue_token, verify_password, SESSION_COOKIE};
use crate::entity::user;
use crate::middleware::{CurrentUser, DbConn};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Login request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub password: String,
}

/// Current user response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: i64,
    pub employee_id: String,
    pub role: String,
    pub department: String,
}

fn login_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Response {
    if req.employee_id.trim().is_empty() || req.password.is_empty() {
        return login_error(StatusCode::BAD_REQUEST, "사번과 비밀번호를 입력해주세요.");
    }

    let user_result = user::Entity::find()
        .filter(user::Column::EmployeeId.eq(req.employee_id.trim()))
        .one(&*db)
        .await;

    let db_user = match user_result {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Login failed: user not found - {}", req.employee_id);
            return login_error(StatusCode::BAD_REQUEST, "존재하지 않는 사용자입니다.");
        }
        Err(e) => {
            tracing::error!("Database error during login: {}", e);
            return login_error(StatusCode::INTERNAL_SERVER_ERROR, "로그인 중 오류가 발생했습니다.");
        }
    };

    if !verify_password(&req.password, &db_user.password) {
        tracing::warn!("Login failed: wrong password - {}", req.employee_id);
        return login_error(StatusCode::BAD_REQUEST, "비밀번호가 일치하지 않습니다.");
    }

    let token = match issue_token(&db_user, &state.config.auth) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to issue session token: {}", e);
            return login_error(StatusCode::INTERNAL_SERVER_ERROR, "로그인 중 오류가 발생했습니다.");
        }
    };

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.auth.cookie_secure)
        .same_site(SameSite::Lax);

    tracing::info!("User logged in: {}", db_user.employee_id);

    (jar.add(cookie), Json(ApiResponse::success_msg("login success"))).into_response()
}

/// POST /api/logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build(SESSION_COOKIE).path("/");
    (jar.remove(removal), Json(ApiResponse::success_msg("logout success")))
}

/// GET /api/user/current
pub async fn current_user(
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<CurrentUserResponse>> {
    Json(ApiResponse::success(CurrentUserResponse {
        id: user.id,
        employee_id: user.employee_id,
        role: user.role.as_str().to_string(),
        department: user.department,
    }))
}
