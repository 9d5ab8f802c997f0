//! Asset store operations
//!
//! Registration, listing, edits, soft deletes and dashboard aggregates. Every
//! listing and aggregate excludes soft-deleted rows and honours the caller's
//! visibility [`Scope`].

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set, TransactionTrait,
};
use serde::Serialize;

use crate::department_path::{canonical_path, DepartmentResolver};
use crate::entity::asset::{self, AssetStatus};
use crate::entity::department;
use crate::entity::user::Role;
use crate::error::{AppError, AppResult};
use crate::label;
use crate::sequence;

/// Number of rows in the dashboard's recent and per-manager lists
const DASHBOARD_TOP_N: u64 = 5;

/// Which assets a caller may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every asset (administrators)
    All,
    /// Assets attached to the department with this label
    Department(String),
}

impl Scope {
    pub fn for_user(role: Role, department: &str) -> Self {
        match role {
            Role::Admin => Scope::All,
            Role::Employee => Scope::Department(department.to_string()),
        }
    }

    /// Match a department row by canonical path, or by plain name for single-segment labels
    fn department_condition(label: &str) -> Condition {
        let label = label.trim();
        let path = canonical_path(label).unwrap_or_default();
        Condition::any()
            .add(department::Column::Path.eq(path))
            .add(department::Column::Name.eq(label))
    }
}

/// Fields of a new asset; the code is allocated on insert
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    pub asset_name: String,
    pub owner_id: String,
    pub owner_name: String,
    pub manager_id: String,
    pub manager_name: String,
    pub description: Option<String>,
    pub qr_url: Option<String>,
    pub status: AssetStatus,
    /// Department label to resolve
    pub department: Option<String>,
}

/// Partial edit; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct AssetChanges {
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
    pub manager_id: Option<String>,
    pub manager_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<AssetStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_count: u64,
    pub status_counts: Vec<StatusCount>,
    pub recent_assets: Vec<asset::Model>,
    pub assets_by_manager: Vec<ManagerCount>,
}

/// Register an asset.
///
/// Code allocation, department resolution and the insert share one transaction:
/// either all of them commit or none do. A missing `qr_url` defaults to the asset
/// page under `public_url` when one is configured.
pub async fn create_asset(
    db: &DatabaseConnection,
    new: NewAsset,
    today: NaiveDate,
    public_url: &str,
) -> AppResult<asset::Model> {
    let txn = db.begin().await?;

    let code = sequence::next_asset_code(&txn, today).await?;

    let department_id = match new.department.as_deref() {
        Some(label) => DepartmentResolver::new().resolve(&txn, label).await?,
        None => None,
    };

    let qr_url = new
        .qr_url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| label::page_url(public_url, &code));

    let now = Utc::now();
    let model = asset::ActiveModel {
        asset_code: Set(code),
        asset_name: Set(new.asset_name),
        owner_id: Set(new.owner_id),
        owner_name: Set(new.owner_name),
        manager_id: Set(new.manager_id),
        manager_name: Set(new.manager_name),
        description: Set(new.description.filter(|d| !d.is_empty())),
        qr_url: Set(qr_url),
        status: Set(new.status.as_str().to_string()),
        department_id: Set(department_id),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!("Registered asset {} ({})", model.asset_code, model.asset_name);
    Ok(model)
}

/// Non-deleted assets with their department, newest first
pub async fn list_assets(
    db: &DatabaseConnection,
    scope: &Scope,
) -> AppResult<Vec<(asset::Model, Option<department::Model>)>> {
    let mut query = asset::Entity::find()
        .find_also_related(department::Entity)
        .filter(asset::Column::DeletedAt.is_null());

    if let Scope::Department(label) = scope {
        query = query.filter(Scope::department_condition(label));
    }

    let rows = query
        .order_by_desc(asset::Column::CreatedAt)
        .order_by_desc(asset::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

/// Non-deleted asset by code, with its department
pub async fn find_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> AppResult<Option<(asset::Model, Option<department::Model>)>> {
    let row = asset::Entity::find()
        .find_also_related(department::Entity)
        .filter(asset::Column::AssetCode.eq(code))
        .filter(asset::Column::DeletedAt.is_null())
        .one(db)
        .await?;
    Ok(row)
}

/// Asset by code, soft-deleted rows included
pub async fn find_by_code_including_deleted(
    db: &DatabaseConnection,
    code: &str,
) -> AppResult<Option<asset::Model>> {
    let row = asset::Entity::find()
        .filter(asset::Column::AssetCode.eq(code))
        .one(db)
        .await?;
    Ok(row)
}

/// Apply a partial edit to a live asset. The code never changes.
pub async fn update_asset(
    db: &DatabaseConnection,
    code: &str,
    changes: AssetChanges,
) -> AppResult<asset::Model> {
    let existing = find_by_code_including_deleted(db, code)
        .await?
        .filter(|a| !a.is_deleted())
        .ok_or_else(|| AppError::NotFound(format!("asset {}", code)))?;

    let mut model: asset::ActiveModel = existing.into();
    if let Some(v) = changes.owner_id {
        model.owner_id = Set(v);
    }
    if let Some(v) = changes.owner_name {
        model.owner_name = Set(v);
    }
    if let Some(v) = changes.manager_id {
        model.manager_id = Set(v);
    }
    if let Some(v) = changes.manager_name {
        model.manager_name = Set(v);
    }
    if let Some(v) = changes.description {
        model.description = Set(Some(v).filter(|d| !d.is_empty()));
    }
    if let Some(v) = changes.status {
        model.status = Set(v.as_str().to_string());
    }
    model.updated_at = Set(Utc::now());

    Ok(model.update(db).await?)
}

/// Soft-delete by code. Deleting an already deleted asset keeps its first timestamp.
pub async fn soft_delete_by_code(db: &DatabaseConnection, code: &str) -> AppResult<()> {
    let existing = find_by_code_including_deleted(db, code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("asset {}", code)))?;
    mark_deleted(db, existing).await
}

/// Soft-delete by row id
pub async fn soft_delete_by_id(db: &DatabaseConnection, id: i64) -> AppResult<()> {
    let existing = asset::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("asset id {}", id)))?;
    mark_deleted(db, existing).await
}

async fn mark_deleted(db: &DatabaseConnection, existing: asset::Model) -> AppResult<()> {
    if existing.is_deleted() {
        return Ok(());
    }
    let code = existing.asset_code.clone();
    let now = Utc::now();
    let mut model: asset::ActiveModel = existing.into();
    model.deleted_at = Set(Some(now));
    model.updated_at = Set(now);
    model.update(db).await?;
    tracing::info!("Soft-deleted asset {}", code);
    Ok(())
}

/// Live assets visible in `scope`, joined to their department when filtering
fn scoped(scope: &Scope) -> Select<asset::Entity> {
    let query = asset::Entity::find().filter(asset::Column::DeletedAt.is_null());
    match scope {
        Scope::All => query,
        Scope::Department(label) => query
            .join(JoinType::InnerJoin, asset::Relation::Department.def())
            .filter(Scope::department_condition(label)),
    }
}

/// Dashboard aggregates; the four queries run concurrently
pub async fn dashboard_stats(db: &DatabaseConnection, scope: &Scope) -> AppResult<DashboardStats> {
    let total = scoped(scope).count(db);

    let by_status = scoped(scope)
        .select_only()
        .column(asset::Column::Status)
        .column_as(asset::Column::Id.count(), "count")
        .group_by(asset::Column::Status)
        .into_tuple::<(String, i64)>()
        .all(db);

    let recent = scoped(scope)
        .order_by_desc(asset::Column::CreatedAt)
        .order_by_desc(asset::Column::Id)
        .limit(DASHBOARD_TOP_N)
        .all(db);

    let by_manager = scoped(scope)
        .select_only()
        .column(asset::Column::ManagerName)
        .column_as(asset::Column::Id.count(), "count")
        .group_by(asset::Column::ManagerName)
        .order_by_desc(asset::Column::Id.count())
        .order_by_asc(asset::Column::ManagerName)
        .limit(DASHBOARD_TOP_N)
        .into_tuple::<(String, i64)>()
        .all(db);

    let (total_count, by_status, recent_assets, by_manager) =
        futures::try_join!(total, by_status, recent, by_manager)?;

    let mut status_counts: Vec<StatusCount> = by_status
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    status_counts.sort_by_key(|s| {
        AssetStatus::parse(&s.status)
            .and_then(|st| AssetStatus::ALL.iter().position(|x| *x == st))
            .unwrap_or(AssetStatus::ALL.len())
    });

    Ok(DashboardStats {
        total_count,
        status_counts,
        recent_assets,
        assets_by_manager: by_manager
            .into_iter()
            .map(|(name, count)| ManagerCount { name, count })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_for_user() {
        assert_eq!(Scope::for_user(Role::Admin, "본사 IT팀"), Scope::All);
        assert_eq!(
            Scope::for_user(Role::Employee, "본사 영업팀"),
            Scope::Department("본사 영업팀".to_string())
        );
    }
}
