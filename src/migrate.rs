use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create files table. Column names are part of the read contract
    // (the length labels map onto them), so they keep their camelCase
    // spelling.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            folder TEXT NOT NULL,
            filename TEXT NOT NULL,
            fullText TEXT NOT NULL,
            halfText TEXT NOT NULL,
            smallText TEXT NOT NULL,
            bullets TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // (folder, filename) is the natural key
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_files_folder_filename ON files(folder, filename)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
