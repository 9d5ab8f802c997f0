use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbBackend, DbErr, EntityTrait, QueryFilter, Schema, Set, Statement,
};
use std::time::Duration;
use tracing::info;

use crate::auth;
use crate::config::DatabaseConfig;
use crate::department_path::DepartmentResolver;
use crate::entity::{asset, asset_sequence, department, user};
use crate::error::{AppError, AppResult};

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    if config.is_sqlite() {
        info!("Connecting to sqlite database: {}", config.path);
    } else {
        info!("Connecting to database: {}:{}/{}", config.host, config.port, config.name);
    }

    let db = connect(config).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Open a connection pool without migrating
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.connection_url());
    opt.max_connections(config.max_connections.max(1))
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    // Every connection to ":memory:" is a separate database.
    if config.path == ":memory:" && config.is_sqlite() {
        opt.max_connections(1).min_connections(1);
    }

    Database::connect(opt).await
}

/// Create any missing tables
pub async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    // Referenced tables first
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(department::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(asset_sequence::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(asset::Entity)).await?;

    info!("Auto-migration completed successfully");
    Ok(())
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();

    let sql = backend.build(&stmt);

    db.execute(Statement::from_string(backend, sql.to_string())).await?;

    Ok(())
}

/// Default accounts created by `-seed`: (employee id, password, department, role)
const SEED_USERS: [(&str, &str, &str, user::Role); 2] = [
    ("admin", "admin123", "본사 IT팀", user::Role::Admin),
    ("emp01", "emp123", "본사 영업팀", user::Role::Employee),
];

/// Create the default departments and accounts if they are missing
pub async fn seed_defaults(db: &DatabaseConnection) -> AppResult<()> {
    let mut resolver = DepartmentResolver::new();

    for (employee_id, password, dept, role) in SEED_USERS {
        resolver.resolve(db, dept).await?;

        let existing = user::Entity::find()
            .filter(user::Column::EmployeeId.eq(employee_id))
            .one(db)
            .await?;
        if existing.is_some() {
            info!("User exists: {}", employee_id);
            continue;
        }

        let hash = auth::hash_password(password)
            .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))?;
        let now = chrono::Utc::now();
        user::ActiveModel {
            employee_id: Set(employee_id.to_string()),
            password: Set(hash),
            department: Set(dept.to_string()),
            role: Set(role.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Created user: {}", employee_id);
    }

    info!("Seeding completed, {} departments created", resolver.created());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_repeatable() {
        let db = connect(&DatabaseConfig::sqlite_memory()).await.unwrap();
        auto_migrate(&db).await.unwrap();
        tokio_test::assert_ok!(auto_migrate(&db).await);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = init_database(&DatabaseConfig::sqlite_memory()).await.unwrap();
        seed_defaults(&db).await.unwrap();
        seed_defaults(&db).await.unwrap();

        let users = user::Entity::find().all(&db).await.unwrap();
        assert_eq!(users.len(), 2);
        // 본사, 본사/IT팀, 본사/영업팀
        let depts = department::Entity::find().all(&db).await.unwrap();
        assert_eq!(depts.len(), 3);
    }
}
