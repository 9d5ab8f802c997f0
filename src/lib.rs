//! AssetDesk - IT asset tracking service
//!
//! Registers assets under daily sequential codes, files them into a department
//! hierarchy, imports them in bulk from spreadsheets and prints QR labels.

pub mod assets;
pub mod auth;
pub mod config;
pub mod db;
pub mod department_path;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod import;
pub mod label;
pub mod middleware;
pub mod routes;
pub mod sequence;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
