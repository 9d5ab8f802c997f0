//! Request handlers module

pub mod asset;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod department;
pub mod import;
