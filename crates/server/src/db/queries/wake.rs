//! Wake database queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::Wake;
use crate::db::DbPool;
use crate::store::StoreResult;

/// Insert a wake for a job.
pub async fn insert_wake(pool: &DbPool, job_id: Uuid, wake_at: DateTime<Utc>) -> StoreResult<Wake> {
    let wake = sqlx::query_as::<_, Wake>(
        r#"
        INSERT INTO job_wakes (id, job_id, wake_at, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, job_id, wake_at, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(wake_at)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(wake)
}

/// Wakes due at or before `now`, oldest first.
pub async fn due_wakes(pool: &DbPool, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Wake>> {
    let wakes = sqlx::query_as::<_, Wake>(
        r#"
        SELECT id, job_id, wake_at, created_at
        FROM job_wakes
        WHERE wake_at <= $1
        ORDER BY wake_at ASC, created_at ASC
        LIMIT $2
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(wakes)
}

/// Delete a delivered wake. Deleting an already-removed wake is a no-op.
pub async fn delete_wake(pool: &DbPool, wake_id: Uuid) -> StoreResult<()> {
    sqlx::query("DELETE FROM job_wakes WHERE id = $1")
        .bind(wake_id)
        .execute(pool)
        .await?;

    Ok(())
}
