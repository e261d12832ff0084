//! Repository for the `projects` table.

use corae_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project};
use crate::repositories::SettingsRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, settings_id, token, created_at, updated_at";

/// Provides create/read operations for projects. Deletion lives in
/// [`TeardownRepo`](crate::repositories::TeardownRepo).
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert the project's settings row and the project in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let settings = SettingsRepo::insert_in(&mut *tx, &input.settings).await?;

        let query = format!(
            "INSERT INTO projects (name, description, settings_id, token)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(settings.id)
            .bind(&input.token)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(project)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }
}
