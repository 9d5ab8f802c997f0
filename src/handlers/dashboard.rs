//! Dashboard handlers

use axum::{response::Json, Extension};
use serde::Serialize;

use crate::assets::{self, ManagerCount, StatusCount};
use crate::error::AppResult;
use crate::handlers::asset::AssetResponse;
use crate::middleware::{CurrentUser, DbConn};
use crate::routes::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_count: u64,
    pub status_counts: Vec<StatusCount>,
    pub recent_assets: Vec<AssetResponse>,
    pub assets_by_manager: Vec<ManagerCount>,
}

/// GET /api/dashboard/stats
pub async fn get_stats(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<DashboardResponse>>> {
    let stats = assets::dashboard_stats(&db, &user.scope()).await?;
    tracing::debug!("Dashboard for {}: {} assets", user.employee_id, stats.total_count);

    Ok(Json(ApiResponse::success(DashboardResponse {
        total_count: stats.total_count,
        status_counts: stats.status_counts,
        recent_assets: stats.recent_assets.into_iter().map(AssetResponse::from).collect(),
        assets_by_manager: stats.assets_by_manager,
    })))
}
