//! User entity - staff accounts
//!
//! Table: app_user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Employee => "EMPLOYEE",
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("ADMIN") {
            Role::Admin
        } else {
            Role::Employee
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Employee id, used as the login name
    #[sea_orm(column_type = "String(Some(32))", unique)]
    pub employee_id: String,

    /// bcrypt hash
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password: String,

    /// Department label (free text, e.g. "IT Team" or "본사 경영지원본부 인사팀")
    #[sea_orm(column_type = "String(Some(256))")]
    pub department: String,

    /// ADMIN or EMPLOYEE
    #[sea_orm(column_type = "String(Some(16))")]
    pub role: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn role(&self) -> Role {
        Role::from(self.role.as_str())
    }
}
