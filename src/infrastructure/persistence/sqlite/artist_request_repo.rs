//! SQLite Artist Request Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    ArtistRequestRecord, ArtistRequestRepositoryPort, RepositoryError, RequestStatus,
};
use crate::domain::normalize;

/// SQLite Artist Request Repository
pub struct SqliteArtistRequestRepository {
    pool: DbPool,
}

impl SqliteArtistRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ArtistRequestRow {
    id: String,
    artist_name: String,
    requested_by: i64,
    status: String,
    created_at: String,
}

impl TryFrom<ArtistRequestRow> for ArtistRequestRecord {
    type Error = RepositoryError;

    fn try_from(row: ArtistRequestRow) -> Result<Self, Self::Error> {
        Ok(ArtistRequestRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?,
            artist_name: row.artist_name,
            requested_by: row.requested_by,
            status: RequestStatus::parse(&row.status).ok_or_else(|| {
                RepositoryError::DatabaseError(format!("unknown request status: {}", row.status))
            })?,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

#[async_trait]
impl ArtistRequestRepositoryPort for SqliteArtistRequestRepository {
    async fn save(&self, record: &ArtistRequestRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO artist_requests
                (id, artist_name, normalized_name, requested_by, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.artist_name)
        .bind(normalize(&record.artist_name))
        .bind(record.requested_by)
        .bind(record.status.as_str())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        tracing::debug!(
            request_id = %record.id,
            artist = %record.artist_name,
            user_id = record.requested_by,
            "Artist request saved"
        );
        Ok(())
    }

    async fn find_pending(
        &self,
        requested_by: i64,
        artist_name: &str,
    ) -> Result<Option<ArtistRequestRecord>, RepositoryError> {
        let row: Option<ArtistRequestRow> = sqlx::query_as(
            r#"
            SELECT id, artist_name, requested_by, status, created_at
            FROM artist_requests
            WHERE requested_by = ? AND normalized_name = ? AND status = 'pending'
            LIMIT 1
            "#,
        )
        .bind(requested_by)
        .bind(normalize(artist_name))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(ArtistRequestRecord::try_from).transpose()
    }

    async fn find_by_user(
        &self,
        requested_by: i64,
    ) -> Result<Vec<ArtistRequestRecord>, RepositoryError> {
        let rows: Vec<ArtistRequestRow> = sqlx::query_as(
            r#"
            SELECT id, artist_name, requested_by, status, created_at
            FROM artist_requests
            WHERE requested_by = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(requested_by)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ArtistRequestRecord::try_from).collect()
    }
}
