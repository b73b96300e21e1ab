//! Folder enumeration.
//!
//! Produces the folder tree shown by the browsing UI: every distinct
//! folder with the filenames it contains, in store order. Used by both
//! the `shelf list` CLI command and the `GET /api/list` endpoint.

use sqlx::SqlitePool;

use crate::error::LibraryError;
use crate::models::FolderListing;

/// Enumerate distinct folders and their filenames.
///
/// Zero documents yields an empty vec. Any store error aborts the whole
/// listing; no partial result is returned.
pub async fn list_folders(pool: &SqlitePool) -> Result<Vec<FolderListing>, LibraryError> {
    let folders: Vec<String> = sqlx::query_scalar("SELECT DISTINCT folder FROM files")
        .fetch_all(pool)
        .await?;

    let mut listings = Vec::with_capacity(folders.len());
    for folder in folders {
        let files: Vec<String> = sqlx::query_scalar("SELECT filename FROM files WHERE folder = ?")
            .bind(&folder)
            .fetch_all(pool)
            .await?;
        listings.push(FolderListing { folder, files });
    }

    Ok(listings)
}

/// CLI entry point — prints the folder tree to stdout.
pub async fn run_list(pool: &SqlitePool) -> anyhow::Result<()> {
    let listings = list_folders(pool).await?;

    if listings.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    for listing in &listings {
        println!("{}/", listing.folder);
        for file in &listing.files {
            println!("  {}", file);
        }
    }

    Ok(())
}
