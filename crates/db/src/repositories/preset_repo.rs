//! Repository for the `presets` table.

use corae_core::types::DbId;
use sqlx::PgPool;

use crate::models::preset::{CreatePreset, Preset};
use crate::repositories::SettingsRepo;

const COLUMNS: &str = "id, name, description, settings_id, token, created_at, updated_at";

pub struct PresetRepo;

impl PresetRepo {
    /// Insert the preset's settings row and the preset in one transaction.
    pub async fn create(pool: &PgPool, input: &CreatePreset) -> Result<Preset, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let settings = SettingsRepo::insert_in(&mut *tx, &input.settings).await?;

        let query = format!(
            "INSERT INTO presets (name, description, settings_id, token)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let preset = sqlx::query_as::<_, Preset>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(settings.id)
            .bind(&input.token)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(preset)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Preset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presets WHERE id = $1");
        sqlx::query_as::<_, Preset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List presets alphabetically.
    pub async fn list(pool: &PgPool) -> Result<Vec<Preset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presets ORDER BY name, id");
        sqlx::query_as::<_, Preset>(&query).fetch_all(pool).await
    }
}
