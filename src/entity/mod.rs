//! Entity module - SeaORM entity definitions
//!
//! One module per database table

pub mod asset;
pub mod asset_sequence;
pub mod department;
pub mod user;
