//! Token lookups across every token-bearing table.

use corae_core::entity::EntityKind;
use corae_core::types::DbId;
use sqlx::PgPool;

pub struct TokenRepo;

impl TokenRepo {
    /// Whether `token` is already taken within `kind`'s namespace.
    pub async fn exists(pool: &PgPool, kind: EntityKind, token: &str) -> Result<bool, sqlx::Error> {
        // `table()` is a closed set of static names, never user input.
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE token = $1)",
            kind.table()
        );
        let (exists,): (bool,) = sqlx::query_as(&query).bind(token).fetch_one(pool).await?;
        Ok(exists)
    }

    /// Resolve `token` to the id of the `kind` row carrying it.
    pub async fn find_id(
        pool: &PgPool,
        kind: EntityKind,
        token: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let query = format!("SELECT id FROM {} WHERE token = $1", kind.table());
        let row: Option<(DbId,)> = sqlx::query_as(&query).bind(token).fetch_optional(pool).await?;
        Ok(row.map(|(id,)| id))
    }
}
