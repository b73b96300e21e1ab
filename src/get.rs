//! Variant retrieval by `(folder, filename)`.
//!
//! Maps a [`Variant`] to its stored column and returns that column's
//! value for the unique matching row. Used by both the `shelf read` CLI
//! command and the `POST /api/read` endpoint.

use sqlx::SqlitePool;

use crate::error::LibraryError;
use crate::models::Variant;

/// Look up one variant of one document.
///
/// The column name comes from the fixed [`Variant::column`] set, never
/// from user input. Duplicates cannot exist under the unique index, but
/// for pre-index data the first row in store iteration order wins.
pub async fn get_variant(
    pool: &SqlitePool,
    folder: &str,
    filename: &str,
    variant: Variant,
) -> Result<String, LibraryError> {
    let sql = format!(
        "SELECT {} FROM files WHERE folder = ? AND filename = ?",
        variant.column()
    );

    let text: Option<String> = sqlx::query_scalar(&sql)
        .bind(folder)
        .bind(filename)
        .fetch_optional(pool)
        .await?;

    text.ok_or_else(|| {
        LibraryError::NotFound(format!("no document '{}' in folder '{}'", filename, folder))
    })
}

/// CLI entry point — prints the variant text to stdout.
pub async fn run_read(
    pool: &SqlitePool,
    folder: &str,
    filename: &str,
    variant: Variant,
) -> anyhow::Result<()> {
    let text = get_variant(pool, folder, filename, variant).await?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;

    async fn seeded_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO files VALUES ('reports', 'q1.pdf', '/upload/q1.pdf', 'H', 'S', 'B')",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn each_variant_reads_its_column() {
        let pool = seeded_pool().await;
        for (variant, expected) in [
            (Variant::Full, "/upload/q1.pdf"),
            (Variant::Half, "H"),
            (Variant::Small, "S"),
            (Variant::Bullets, "B"),
        ] {
            let text = get_variant(&pool, "reports", "q1.pdf", variant).await.unwrap();
            assert_eq!(text, expected);
        }
    }

    #[tokio::test]
    async fn miss_is_not_found() {
        let pool = seeded_pool().await;
        let err = get_variant(&pool, "missing", "none.pdf", Variant::Full)
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[tokio::test]
    async fn folder_and_filename_both_match() {
        let pool = seeded_pool().await;
        let err = get_variant(&pool, "other", "q1.pdf", Variant::Half)
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }
}
