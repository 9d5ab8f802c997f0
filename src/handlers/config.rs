//! Configuration handlers
//!
//! Returns public configuration settings to the frontend

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// Public configuration response
#[derive(Debug, Serialize)]
pub struct PublicConfig {
    /// Maximum spreadsheet upload size in bytes
    #[serde(rename = "maxUploadSize")]
    pub max_upload_size: usize,
    /// Base URL encoded in asset QR codes
    #[serde(rename = "publicUrl")]
    pub public_url: String,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(PublicConfig {
        max_upload_size: state.config.max_upload_size,
        public_url: state.config.public_url.clone(),
    })
}
