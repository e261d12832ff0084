//! Schema conventions, checked against a migrated database.
//!
//! Requires `DATABASE_URL`; run with `cargo test -p corae-db -- --ignored`.

use sqlx::PgPool;

/// All `id` columns must be bigint (entity tables) or smallint (lookup tables).
#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_all_pks_are_correct_type(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert!(
            data_type == "bigint" || data_type == "smallint",
            "Table {table}.id should be bigint or smallint, got {data_type}"
        );
    }
}

/// Every table must carry created_at and updated_at as timestamptz.
#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_all_tables_have_timestamps(pool: PgPool) {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name
         FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_type = 'BASE TABLE'
           AND table_name != '_sqlx_migrations'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (table,) in &tables {
        for col in ["created_at", "updated_at"] {
            let result: Option<(String,)> = sqlx::query_as(
                "SELECT data_type
                 FROM information_schema.columns
                 WHERE table_schema = 'public' AND table_name = $1 AND column_name = $2",
            )
            .bind(table)
            .bind(col)
            .fetch_optional(&pool)
            .await
            .unwrap();

            let (data_type,) =
                result.unwrap_or_else(|| panic!("Table {table} is missing column {col}"));
            assert_eq!(data_type, "timestamp with time zone", "{table}.{col}");
        }
    }
}

/// Deletion is orchestrated by the application, so no foreign key cascades.
#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_no_cascading_deletes(pool: PgPool) {
    let rules: Vec<(String, String)> = sqlx::query_as(
        "SELECT constraint_name, delete_rule
         FROM information_schema.referential_constraints
         WHERE constraint_schema = 'public'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rules.is_empty());
    for (constraint, rule) in &rules {
        assert_eq!(rule, "RESTRICT", "FK {constraint} must restrict deletes");
    }
}

/// Session status lookup rows match `SessionStatus` discriminants.
#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_session_status_seed(pool: PgPool) {
    use corae_db::models::status::SessionStatus;

    let rows: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM session_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![
            (SessionStatus::Active.id(), SessionStatus::Active.as_str().to_string()),
            (SessionStatus::Archived.id(), SessionStatus::Archived.as_str().to_string()),
        ]
    );
}
