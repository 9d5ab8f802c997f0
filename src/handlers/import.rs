//! Spreadsheet import handler

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};

use crate::error::AppError;
use crate::import::{self, ImportSummary};
use crate::middleware::{CurrentUser, DbConn};
use crate::routes::ApiResponse;

/// Multipart field holding the workbook
const FILE_FIELD: &str = "file";

/// Failure before any row was touched
fn rejected(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

/// POST /api/asset/import
///
/// Replies with the import counters in `data`; a batch that stopped part way
/// carries the counters of the rows already committed.
pub async fn import_assets(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Response {
    let mut bytes = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(FILE_FIELD) {
                    continue;
                }
                match field.bytes().await {
                    Ok(data) => bytes = Some(data.to_vec()),
                    Err(e) => {
                        tracing::warn!("Failed to read upload: {}", e);
                        return rejected(e.status(), e.body_text());
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed multipart body: {}", e);
                return rejected(e.status(), e.body_text());
            }
        }
    }

    let Some(bytes) = bytes.filter(|b| !b.is_empty()) else {
        return rejected(StatusCode::BAD_REQUEST, "파일이 없습니다.");
    };

    let rows = match import::read_workbook(bytes) {
        Ok(rows) => rows,
        Err(AppError::Spreadsheet(msg)) => return rejected(StatusCode::BAD_REQUEST, msg),
        Err(e) => return rejected(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    if rows.is_empty() {
        return rejected(StatusCode::BAD_REQUEST, "데이터가 없습니다.");
    }

    tracing::info!("{} importing {} rows", user.employee_id, rows.len());

    match import::import_rows(&db, &rows).await {
        Ok(summary) => {
            let message = summary.message();
            Json(ApiResponse::<ImportSummary>::success_with(message, summary)).into_response()
        }
        Err(failed) => {
            tracing::error!("Import stopped: {}", failed);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error_with(
                    format!("업로드 처리 중 오류가 발생했습니다: {}", failed.error),
                    failed.summary,
                )),
            )
                .into_response()
        }
    }
}
