//! Department handlers
//!
//! Departments are created by resolving labels; there is no rename or delete.

use axum::{response::Json, Extension};
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::department_path::{canonical_path, find_by_path, DepartmentResolver};
use crate::entity::department::{self, DepartmentTree};
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::{CurrentUser, DbConn};
use crate::routes::ApiResponse;

/// Ensure-path request
#[derive(Debug, Deserialize)]
pub struct AddDepartmentRequest {
    /// Department label, e.g. "본사 경영지원본부 인사팀"
    pub path: String,
}

/// Department response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub depth: i32,
    pub parent_id: Option<i64>,
}

impl From<department::Model> for DepartmentResponse {
    fn from(m: department::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            path: m.path,
            depth: m.depth,
            parent_id: m.parent_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDepartmentResponse {
    pub department: DepartmentResponse,
    pub created: usize,
}

/// POST /api/department/add
pub async fn add_department(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddDepartmentRequest>,
) -> AppResult<Json<ApiResponse<AddDepartmentResponse>>> {
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let path = canonical_path(&req.path)
        .ok_or_else(|| AppError::Validation("부서명을 입력해주세요.".to_string()))?;

    let mut resolver = DepartmentResolver::new();
    resolver.resolve(&*db, &req.path).await?;

    let leaf = find_by_path(&*db, &path)
        .await?
        .ok_or_not_found("Department not found")?;

    tracing::info!(
        "{} ensured department {} ({} created)",
        user.employee_id,
        leaf.path,
        resolver.created()
    );

    Ok(Json(ApiResponse::success(AddDepartmentResponse {
        department: DepartmentResponse::from(leaf),
        created: resolver.created(),
    })))
}

/// GET /api/department/query
pub async fn get_departments(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<DepartmentResponse>>>> {
    let depts = department::Entity::find()
        .order_by_asc(department::Column::Path)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(
        depts.into_iter().map(DepartmentResponse::from).collect(),
    )))
}

/// GET /api/department/tree
pub async fn get_department_tree(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<DepartmentTree>>>> {
    let depts = department::Entity::find().all(&*db).await?;
    Ok(Json(ApiResponse::success(DepartmentTree::build(depts))))
}
