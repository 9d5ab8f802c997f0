//! Asset entity - tracked physical items
//!
//! Table: asset. Rows are never physically removed; `deleted_at` marks a soft delete.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Asset status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetStatus {
    /// In use
    Active,
    /// Not in use
    Inactive,
    /// Under repair
    Repair,
    /// Discarded
    Discarded,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 4] = [
        AssetStatus::Active,
        AssetStatus::Inactive,
        AssetStatus::Repair,
        AssetStatus::Discarded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Active => "ACTIVE",
            AssetStatus::Inactive => "INACTIVE",
            AssetStatus::Repair => "REPAIR",
            AssetStatus::Discarded => "DISCARDED",
        }
    }

    /// Parse a status name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }
}

impl Default for AssetStatus {
    fn default() -> Self {
        AssetStatus::Active
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Human-readable code, immutable once assigned
    #[sea_orm(column_type = "String(Some(32))", unique)]
    pub asset_code: String,

    #[sea_orm(column_type = "String(Some(128))")]
    pub asset_name: String,

    /// Owner employee id (loose reference, not enforced)
    #[sea_orm(column_type = "String(Some(32))")]
    pub owner_id: String,

    #[sea_orm(column_type = "String(Some(64))")]
    pub owner_name: String,

    /// Manager employee id (loose reference, not enforced)
    #[sea_orm(column_type = "String(Some(32))")]
    pub manager_id: String,

    #[sea_orm(column_type = "String(Some(64))")]
    pub manager_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "String(Some(512))", nullable)]
    pub qr_url: Option<String>,

    /// One of ACTIVE, INACTIVE, REPAIR, DISCARDED
    #[sea_orm(column_type = "String(Some(16))")]
    pub status: String,

    /// Leaf department
    #[sea_orm(nullable)]
    pub department_id: Option<i64>,

    /// Soft delete marker
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn status(&self) -> AssetStatus {
        AssetStatus::parse(&self.status).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(AssetStatus::parse("ACTIVE"), Some(AssetStatus::Active));
        assert_eq!(AssetStatus::parse(" repair "), Some(AssetStatus::Repair));
        assert_eq!(AssetStatus::parse("LOST"), None);
        assert_eq!(AssetStatus::Discarded.to_string(), "DISCARDED");
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&AssetStatus::Inactive).unwrap();
        assert_eq!(json, "\"INACTIVE\"");
    }
}
