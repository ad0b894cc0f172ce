use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;

use super::{StoreError, WorkflowStore};
use crate::workflow::{SubmissionId, WorkflowState};

/// SQLite-backed store. The compare-and-swap is a single conditional
/// `UPDATE ... WHERE version = ?`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database and optionally run migrations
    pub async fn connect(database_url: &str, auto_migrate: bool) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(sqlx::Error::from)?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn stored_version(&self, submission_id: &SubmissionId) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT version FROM workflow_states WHERE submission_id = ?1")
            .bind(submission_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get::<i64, _>("version") as u64))
    }
}

#[async_trait]
impl WorkflowStore for SqliteStore {
    async fn insert(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let document = serde_json::to_string(state)?;
        let result = sqlx::query(
            r#"
            INSERT INTO workflow_states (submission_id, version, overall_status, document, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(state.submission_id.as_str())
        .bind(state.version as i64)
        .bind(state.overall_status.to_string())
        .bind(document)
        .bind(state.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::AlreadyExists(state.submission_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, submission_id: &SubmissionId) -> Result<WorkflowState, StoreError> {
        let row = sqlx::query("SELECT document FROM workflow_states WHERE submission_id = ?1")
            .bind(submission_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(submission_id.clone()))?;

        let document: String = row.get("document");
        Ok(serde_json::from_str(&document)?)
    }

    async fn save(&self, state: &WorkflowState, expected_version: u64) -> Result<(), StoreError> {
        let document = serde_json::to_string(state)?;
        let result = sqlx::query(
            r#"
            UPDATE workflow_states
            SET version = ?1, overall_status = ?2, document = ?3, updated_at = ?4
            WHERE submission_id = ?5 AND version = ?6
            "#,
        )
        .bind(state.version as i64)
        .bind(state.overall_status.to_string())
        .bind(document)
        .bind(state.updated_at.to_rfc3339())
        .bind(state.submission_id.as_str())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.stored_version(&state.submission_id).await? {
            Some(found) => Err(StoreError::StaleWrite {
                submission_id: state.submission_id.clone(),
                expected: expected_version,
                found,
            }),
            None => Err(StoreError::NotFound(state.submission_id.clone())),
        }
    }

    async fn list(&self) -> Result<Vec<SubmissionId>, StoreError> {
        let rows = sqlx::query("SELECT submission_id FROM workflow_states ORDER BY submission_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| SubmissionId::new(row.get::<String, _>("submission_id")))
            .collect())
    }
}
