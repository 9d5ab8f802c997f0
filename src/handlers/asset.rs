//! Asset handlers
//!
//! Registration, listing, detail, edit, soft delete and labels

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::assets::{self, AssetChanges, NewAsset};
use crate::entity::asset::{self, AssetStatus};
use crate::entity::department;
use crate::error::{AppError, AppResult, FieldError, OptionExt};
use crate::label;
use crate::middleware::{CurrentUser, DbConn};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Create asset request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAssetRequest {
    pub asset_name: Option<String>,
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
    pub manager_id: Option<String>,
    pub manager_name: Option<String>,
    pub description: Option<String>,
    pub qr_url: Option<String>,
    pub status: Option<String>,
    /// Department label; defaults to the acting user's department
    pub department: Option<String>,
}

/// Update asset request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAssetRequest {
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
    pub manager_id: Option<String>,
    pub manager_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Required text fields and their messages
const REQUIRED_FIELDS: [(&str, &str); 5] = [
    ("assetName", "자산명을 입력해주세요."),
    ("ownerId", "소유자 사번을 입력해주세요."),
    ("ownerName", "소유자 성명을 입력해주세요."),
    ("managerId", "관리자 사번을 입력해주세요."),
    ("managerName", "관리자 성명을 입력해주세요."),
];

const INVALID_STATUS: &str = "올바르지 않은 상태입니다.";

fn message_for(field: &str) -> &'static str {
    REQUIRED_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, msg)| *msg)
        .unwrap_or("값을 입력해주세요.")
}

fn parse_status(value: Option<&str>, errors: &mut Vec<FieldError>) -> Option<AssetStatus> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    let status = AssetStatus::parse(value);
    if status.is_none() {
        errors.push(FieldError::new("status", INVALID_STATUS));
    }
    status
}

impl CreateAssetRequest {
    /// Check required fields and build the insert payload
    pub fn validate(self, default_department: &str) -> Result<NewAsset, Vec<FieldError>> {
        let mut errors = Vec::new();

        let mut required = |field: &str, value: Option<String>| -> String {
            let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
            if value.is_empty() {
                errors.push(FieldError::new(field, message_for(field)));
            }
            value
        };
        let asset_name = required("assetName", self.asset_name);
        let owner_id = required("ownerId", self.owner_id);
        let owner_name = required("ownerName", self.owner_name);
        let manager_id = required("managerId", self.manager_id);
        let manager_name = required("managerName", self.manager_name);

        let status = parse_status(self.status.as_deref(), &mut errors).unwrap_or_default();

        if !errors.is_empty() {
            return Err(errors);
        }

        let department = self
            .department
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_department.to_string());

        Ok(NewAsset {
            asset_name,
            owner_id,
            owner_name,
            manager_id,
            manager_name,
            description: self.description,
            qr_url: self.qr_url,
            status,
            department: Some(department),
        })
    }
}

impl UpdateAssetRequest {
    pub fn validate(self) -> Result<AssetChanges, Vec<FieldError>> {
        let mut errors = Vec::new();

        let mut optional = |field: &str, value: Option<String>| -> Option<String> {
            let value = value?.trim().to_string();
            if value.is_empty() {
                errors.push(FieldError::new(field, message_for(field)));
            }
            Some(value)
        };
        let owner_id = optional("ownerId", self.owner_id);
        let owner_name = optional("ownerName", self.owner_name);
        let manager_id = optional("managerId", self.manager_id);
        let manager_name = optional("managerName", self.manager_name);

        let status = parse_status(self.status.as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AssetChanges {
            owner_id,
            owner_name,
            manager_id,
            manager_name,
            description: self.description,
            status,
        })
    }
}

/// Department summary embedded in asset responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub id: i64,
    pub name: String,
    pub path: String,
}

impl From<department::Model> for DepartmentSummary {
    fn from(m: department::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            path: m.path,
        }
    }
}

/// Asset response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub id: i64,
    pub asset_code: String,
    pub asset_name: String,
    pub owner_id: String,
    pub owner_name: String,
    pub manager_id: String,
    pub manager_name: String,
    pub description: Option<String>,
    pub qr_url: Option<String>,
    pub status: String,
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentSummary>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl AssetResponse {
    pub fn with_department(m: asset::Model, dept: Option<department::Model>) -> Self {
        Self {
            id: m.id,
            asset_code: m.asset_code,
            asset_name: m.asset_name,
            owner_id: m.owner_id,
            owner_name: m.owner_name,
            manager_id: m.manager_id,
            manager_name: m.manager_name,
            description: m.description,
            qr_url: m.qr_url,
            status: m.status,
            department_id: m.department_id,
            department: dept.map(DepartmentSummary::from),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<asset::Model> for AssetResponse {
    fn from(m: asset::Model) -> Self {
        Self::with_department(m, None)
    }
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

/// POST /api/asset/create
pub async fn create_asset(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateAssetRequest>,
) -> Response {
    let new_asset = match req.validate(&user.department) {
        Ok(new_asset) => new_asset,
        Err(fields) => return AppError::InvalidFields(fields).into_response(),
    };

    let today = chrono::Local::now().date_naive();
    match assets::create_asset(&db, new_asset, today, &state.config.public_url).await {
        Ok(model) => Json(ApiResponse::success(AssetResponse::from(model))).into_response(),
        Err(e) => {
            tracing::error!("Failed to create asset: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!("자산 등록 실패: {}", e))),
            )
                .into_response()
        }
    }
}

/// GET /api/asset/list
pub async fn list_assets(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<AssetResponse>>>> {
    let rows = assets::list_assets(&db, &user.scope()).await?;
    tracing::debug!("Listed {} assets for {}", rows.len(), user.employee_id);

    let data = rows
        .into_iter()
        .map(|(a, d)| AssetResponse::with_department(a, d))
        .collect();
    Ok(Json(ApiResponse::success(data)))
}

/// GET /api/asset/:code
pub async fn get_asset(
    Extension(db): Extension<DbConn>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<AssetResponse>>> {
    let (asset, dept) = assets::find_by_code(&db, &code)
        .await?
        .ok_or_not_found("Asset not found")?;
    Ok(Json(ApiResponse::success(AssetResponse::with_department(asset, dept))))
}

/// POST /api/asset/:code/update
pub async fn update_asset(
    Extension(db): Extension<DbConn>,
    Path(code): Path<String>,
    Json(req): Json<UpdateAssetRequest>,
) -> AppResult<Json<ApiResponse<AssetResponse>>> {
    let changes = req.validate().map_err(AppError::InvalidFields)?;
    let model = assets::update_asset(&db, &code, changes).await?;
    Ok(Json(ApiResponse::success(AssetResponse::from(model))))
}

/// POST /api/asset/:code/delete
pub async fn delete_asset(
    Extension(db): Extension<DbConn>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    assets::soft_delete_by_code(&db, &code).await?;
    Ok(Json(ApiResponse::success_msg("success")))
}

/// POST /api/asset/delete?id=
///
/// Administrators only; others get 403 with the envelope message.
pub async fn delete_asset_by_id(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<IdQuery>,
) -> AppResult<Response> {
    if !user.is_admin() {
        tracing::warn!("{} tried to delete asset id {}", user.employee_id, query.id);
        return Ok((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error("삭제 권한이 없습니다.")),
        )
            .into_response());
    }
    assets::soft_delete_by_id(&db, query.id).await?;
    Ok(Json(ApiResponse::success_msg("success")).into_response())
}

/// QR target of a live asset: its stored URL, else its page under the public URL
async fn qr_target(state: &AppState, db: &DbConn, code: &str) -> AppResult<(asset::Model, String)> {
    let (asset, _) = assets::find_by_code(db, code)
        .await?
        .ok_or_not_found("Asset not found")?;
    let target = asset
        .qr_url
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| state.config.asset_page_url(code))
        .unwrap_or_else(|| format!("/assets/{}", code));
    Ok((asset, target))
}

fn svg_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml; charset=utf-8")], body).into_response()
}

/// GET /api/asset/:code/qr
pub async fn asset_qr(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Path(code): Path<String>,
) -> AppResult<Response> {
    let (_, target) = qr_target(&state, &db, &code).await?;
    Ok(svg_response(label::qr_svg(&target, 128)?))
}

/// GET /api/asset/:code/label
pub async fn asset_label(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Path(code): Path<String>,
) -> AppResult<Response> {
    let (asset, target) = qr_target(&state, &db, &code).await?;
    Ok(svg_response(label::label_svg(
        &asset.asset_code,
        &asset.owner_name,
        &target,
    )?))
}
