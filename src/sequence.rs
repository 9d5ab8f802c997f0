//! Asset code sequencing
//!
//! Codes look like `A<YYMMDD><NNNNN>`: the date of registration followed by the
//! per-day counter, zero-padded to five digits. The counter lives in the
//! `asset_sequence` table, one row per date key, and is advanced with a single
//! `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` statement so concurrent callers
//! never observe the same value.

use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ConnectionTrait, EntityTrait, QueryTrait, Set};

use crate::entity::asset_sequence;
use crate::error::{AppError, AppResult};

/// Prefix of every generated asset code
pub const CODE_PREFIX: &str = "A";

/// Minimum width of the counter part
pub const COUNTER_WIDTH: usize = 5;

/// Result of one allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub date_key: String,
    pub count: i64,
    pub code: String,
}

/// Date key in `YYMMDD` form
pub fn date_key(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// Format an asset code. Counters wider than five digits are kept whole.
pub fn format_code(date_key: &str, count: i64) -> String {
    format!("{}{}{:0width$}", CODE_PREFIX, date_key, count, width = COUNTER_WIDTH)
}

/// Atomically advance the counter for `date` and return the new value.
///
/// Runs on whatever connection it is given; pass the enclosing transaction so the
/// counter and the asset row commit or roll back together.
pub async fn allocate<C>(conn: &C, date: NaiveDate) -> AppResult<Allocation>
where
    C: ConnectionTrait,
{
    let date_key = date_key(date);
    let backend = conn.get_database_backend();

    let seed = asset_sequence::ActiveModel {
        date: Set(date_key.clone()),
        current_count: Set(1),
    };
    let mut insert = asset_sequence::Entity::insert(seed)
        .on_conflict(
            OnConflict::column(asset_sequence::Column::Date)
                .value(
                    asset_sequence::Column::CurrentCount,
                    Expr::col((asset_sequence::Entity, asset_sequence::Column::CurrentCount)).add(1),
                )
                .to_owned(),
        )
        .into_query();
    insert.returning_col(asset_sequence::Column::CurrentCount);

    let row = conn
        .query_one(backend.build(&insert))
        .await
        .map_err(|e| AppError::Allocation(e.to_string()))?
        .ok_or_else(|| AppError::Allocation(format!("no counter returned for {}", date_key)))?;

    let count: i64 = row
        .try_get("", "current_count")
        .map_err(|e| AppError::Allocation(e.to_string()))?;

    let code = format_code(&date_key, count);
    tracing::debug!("Allocated asset code {} (date {}, count {})", code, date_key, count);

    Ok(Allocation { date_key, count, code })
}

/// Allocate the next asset code for `date`
pub async fn next_asset_code<C>(conn: &C, date: NaiveDate) -> AppResult<String>
where
    C: ConnectionTrait,
{
    Ok(allocate(conn, date).await?.code)
}
