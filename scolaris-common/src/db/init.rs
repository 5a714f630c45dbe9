//! Database initialization
//!
//! Every collection of the academic records store is one table. The
//! `semestres` back-reference list of Filiere, Professeur and Element
//! documents is a link table keyed on `(owner_id, semestre_id)`, which gives it
//! set semantics. Link tables deliberately carry no foreign key on
//! `semestre_id`: keeping them consistent with `semestres` is the controller's
//! job.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Lock wait applied to every pooled connection
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (creating if needed) the database file and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas set here run on every connection the pool opens
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to one connection that never expires: every SQLite in-memory
/// connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_semestres_table(pool).await?;
    create_filieres_table(pool).await?;
    create_professeurs_table(pool).await?;
    create_elements_table(pool).await?;

    // Back-reference sets
    create_link_table(pool, "filiere_semestres", "filiere_id", "filieres").await?;
    create_link_table(pool, "professeur_semestres", "professeur_id", "professeurs").await?;
    create_link_table(pool, "element_semestres", "element_id", "elements").await?;

    Ok(())
}

async fn create_semestres_table(pool: &SqlitePool) -> Result<()> {
    // elements/professeurs hold JSON arrays of ids (ordered, unconstrained)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS semestres (
            id TEXT PRIMARY KEY,
            nom_semestre TEXT NOT NULL UNIQUE,
            filiere_id TEXT,
            elements TEXT NOT NULL DEFAULT '[]',
            professeurs TEXT NOT NULL DEFAULT '[]',
            seances TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_filieres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS filieres (
            id TEXT PRIMARY KEY,
            nom_filiere TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_professeurs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS professeurs (
            id TEXT PRIMARY KEY,
            nom TEXT NOT NULL,
            prenom TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_elements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS elements (
            id TEXT PRIMARY KEY,
            nom_element TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_link_table(
    pool: &SqlitePool,
    table: &str,
    owner_column: &str,
    owner_table: &str,
) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            {owner_column} TEXT NOT NULL REFERENCES {owner_table}(id) ON DELETE CASCADE,
            semestre_id TEXT NOT NULL,
            PRIMARY KEY ({owner_column}, semestre_id)
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_semestre ON {table}(semestre_id)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}
