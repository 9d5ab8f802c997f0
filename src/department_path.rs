//! Department path resolution
//!
//! Turns a free-text label such as `"본사 경영지원본부 인사팀"` into a chain of
//! department rows (`본사`, `본사/경영지원본부`, `본사/경영지원본부/인사팀`), creating
//! the missing levels, and yields the id of the leaf.
//!
//! Every level is a find-or-create keyed by the unique `path` column. The insert uses
//! `ON CONFLICT (path) DO NOTHING` and is always followed by a re-read, so a caller that
//! loses a race simply picks up the row the winner created.

use std::collections::HashMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr};

use crate::entity::department::{self, PATH_SEPARATOR};
use crate::error::{AppError, AppResult};

/// Find-or-create attempts per level before giving up
const MAX_ATTEMPTS: usize = 3;

/// Split a department label into its segments.
///
/// Whitespace and the path separator both delimit segments; empty pieces are dropped.
pub fn split_segments(label: &str) -> Vec<&str> {
    label
        .split(|c: char| c.is_whitespace() || PATH_SEPARATOR.contains(c))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Canonical path for a label, or None when the label has no segments
pub fn canonical_path(label: &str) -> Option<String> {
    let segments = split_segments(label);
    if segments.is_empty() {
        None
    } else {
        Some(segments.join(PATH_SEPARATOR))
    }
}

/// Look up a department by its exact path
pub async fn find_by_path<C>(conn: &C, path: &str) -> Result<Option<department::Model>, DbErr>
where
    C: ConnectionTrait,
{
    department::Entity::find()
        .filter(department::Column::Path.eq(path))
        .one(conn)
        .await
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Resolves department labels to leaf ids.
///
/// The memo maps paths to ids and is only filled after a row has been read or written,
/// so it never disagrees with the store. Keep one resolver per import batch; it is not
/// meant to outlive it.
#[derive(Debug, Default)]
pub struct DepartmentResolver {
    cache: HashMap<String, i64>,
    created: usize,
}

impl DepartmentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of department rows this resolver inserted
    pub fn created(&self) -> usize {
        self.created
    }

    /// Cached id for a path, if it was seen by this resolver
    pub fn cached(&self, path: &str) -> Option<i64> {
        self.cache.get(path).copied()
    }

    /// Ensure every level of `label` exists and return the leaf id.
    ///
    /// Returns `Ok(None)` for an empty or all-whitespace label.
    pub async fn resolve<C>(&mut self, conn: &C, label: &str) -> AppResult<Option<i64>>
    where
        C: ConnectionTrait,
    {
        let segments = split_segments(label);
        let mut path = String::new();
        let mut parent_id: Option<i64> = None;

        for (depth, name) in segments.into_iter().enumerate() {
            if !path.is_empty() {
                path.push_str(PATH_SEPARATOR);
            }
            path.push_str(name);

            let id = match self.cache.get(&path) {
                Some(&id) => id,
                None => {
                    let id = self
                        .find_or_create(conn, name, &path, depth as i32, parent_id)
                        .await?;
                    self.cache.insert(path.clone(), id);
                    id
                }
            };
            parent_id = Some(id);
        }

        Ok(parent_id)
    }

    async fn find_or_create<C>(
        &mut self,
        conn: &C,
        name: &str,
        path: &str,
        depth: i32,
        parent_id: Option<i64>,
    ) -> AppResult<i64>
    where
        C: ConnectionTrait,
    {
        for _ in 0..MAX_ATTEMPTS {
            if let Some(existing) = find_by_path(conn, path).await? {
                return Ok(existing.id);
            }

            let node = department::ActiveModel {
                name: Set(name.to_string()),
                path: Set(path.to_string()),
                depth: Set(depth),
                parent_id: Set(parent_id),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            };

            let inserted = department::Entity::insert(node)
                .on_conflict(
                    OnConflict::column(department::Column::Path)
                        .do_nothing()
                        .to_owned(),
                )
                .exec(conn)
                .await;

            match inserted {
                Ok(res) => {
                    if let Some(row) = find_by_path(conn, path).await? {
                        // Only count the node if this insert produced the row we read back
                        if row.id == res.last_insert_id {
                            self.created += 1;
                            tracing::debug!("Created department {} (id {})", path, row.id);
                        } else {
                            tracing::debug!("Department {} created concurrently (id {})", path, row.id);
                        }
                        return Ok(row.id);
                    }
                }
                Err(DbErr::RecordNotInserted) => {
                    tracing::debug!("Department {} created concurrently, re-reading", path);
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!("Department {} hit unique constraint, re-reading", path);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict(format!(
            "department path could not be resolved: {}",
            path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments() {
        assert_eq!(
            split_segments("본사 경영지원본부 인사팀"),
            vec!["본사", "경영지원본부", "인사팀"]
        );
        assert_eq!(split_segments("  IT\tTeam  "), vec!["IT", "Team"]);
        assert_eq!(split_segments("본사/경영지원본부 / 인사팀"), vec!["본사", "경영지원본부", "인사팀"]);
        assert!(split_segments("   ").is_empty());
        assert!(split_segments("").is_empty());
    }

    #[test]
    fn test_canonical_path() {
        assert_eq!(
            canonical_path(" 본사  경영지원본부 ").as_deref(),
            Some("본사/경영지원본부")
        );
        assert_eq!(canonical_path(" \t "), None);
    }
}
