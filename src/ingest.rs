//! Ingestion pipeline orchestration.
//!
//! Coordinates the full write path: validation → text extraction →
//! summarization → blob persistence → metadata persistence. Steps run
//! strictly sequentially; each step's success is a precondition for the
//! next, so a failed model call never leaves a partial record and a
//! crash between the blob write and the row insert can orphan a blob but
//! never produce a record pointing at a missing blob. Nothing is rolled
//! back or retried here.

use sqlx::SqlitePool;
use tracing::info;

use crate::blob::{blob_key, BlobStore};
use crate::error::LibraryError;
use crate::extract;
use crate::models::{Confirmation, DocumentRecord};
use crate::summarize::Summarizer;

/// Run one document through the pipeline.
///
/// `replace_duplicates` selects the configured duplicate policy: `false`
/// surfaces a constraint violation on an existing `(folder, filename)`
/// as a storage error, `true` upserts over it.
pub async fn ingest_document(
    pool: &SqlitePool,
    blobs: &dyn BlobStore,
    summarizer: &dyn Summarizer,
    replace_duplicates: bool,
    folder: &str,
    filename: &str,
    bytes: &[u8],
) -> Result<Confirmation, LibraryError> {
    validate(folder, filename, bytes)?;

    let full_text =
        extract::extract_text(bytes).map_err(|e| LibraryError::Validation(e.to_string()))?;

    let summary = summarizer.summarize(&full_text).await?;

    let key = blob_key(filename);
    blobs.put(&key, bytes).await?;
    // Past this point a failure leaves the blob behind. The row is the
    // source of truth for listings, so the orphan is invisible to
    // readers.

    let record = DocumentRecord {
        folder: folder.to_string(),
        filename: filename.to_string(),
        full_text: if summarizer.inlines_full_text() {
            full_text
        } else {
            key
        },
        half_text: summary.half_text,
        small_text: summary.small_text,
        bullets: summary.bullets,
    };
    insert_record(pool, &record, replace_duplicates).await?;

    info!(
        folder = %record.folder,
        filename = %record.filename,
        model = summarizer.model_name(),
        "document ingested"
    );

    Ok(Confirmation {
        folder: record.folder,
        filename: record.filename,
    })
}

/// All three inputs are required; the error names every missing one.
fn validate(folder: &str, filename: &str, bytes: &[u8]) -> Result<(), LibraryError> {
    let mut missing = Vec::new();
    if folder.trim().is_empty() {
        missing.push("folder");
    }
    if filename.trim().is_empty() {
        missing.push("filename");
    }
    if bytes.is_empty() {
        missing.push("document");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LibraryError::Validation(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )))
    }
}

async fn insert_record(
    pool: &SqlitePool,
    record: &DocumentRecord,
    replace_duplicates: bool,
) -> Result<(), LibraryError> {
    let sql = if replace_duplicates {
        r#"
        INSERT INTO files (folder, filename, fullText, halfText, smallText, bullets)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(folder, filename) DO UPDATE SET
            fullText = excluded.fullText,
            halfText = excluded.halfText,
            smallText = excluded.smallText,
            bullets = excluded.bullets
        "#
    } else {
        r#"
        INSERT INTO files (folder, filename, fullText, halfText, smallText, bullets)
        VALUES (?, ?, ?, ?, ?, ?)
        "#
    };

    sqlx::query(sql)
        .bind(&record.folder)
        .bind(&record.filename)
        .bind(&record.full_text)
        .bind(&record.half_text)
        .bind(&record.small_text)
        .bind(&record.bullets)
        .execute(pool)
        .await
        .map_err(|e| LibraryError::Storage(format!("metadata insert failed: {}", e)))?;

    Ok(())
}
