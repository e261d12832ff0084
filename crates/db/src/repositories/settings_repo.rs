//! Repository for the `settings` table.

use corae_core::settings::StudySettings;
use corae_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::settings::Settings;

const COLUMNS: &str = "id, method, capacity, coupling, ordering, bounding, granularity, \
                       axis, ceiling, floor, created_at, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    /// Insert a settings row on an open connection (usually a transaction).
    pub async fn insert_in(
        conn: &mut PgConnection,
        settings: &StudySettings,
    ) -> Result<Settings, sqlx::Error> {
        let query = format!(
            "INSERT INTO settings
                (method, capacity, coupling, ordering, bounding, granularity, axis, ceiling, floor)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Settings>(&query)
            .bind(&settings.method)
            .bind(settings.capacity)
            .bind(settings.coupling.as_str())
            .bind(settings.ordering.as_str())
            .bind(settings.bounding.as_str())
            .bind(settings.granularity)
            .bind(&settings.axis)
            .bind(&settings.ceiling)
            .bind(&settings.floor)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Settings>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE id = $1");
        sqlx::query_as::<_, Settings>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
