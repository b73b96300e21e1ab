//! Blob store abstraction and backends.
//!
//! Uploaded document bytes are stored opaquely under the key
//! `"/upload/{filename}"`, written once during ingestion and read back by
//! the blob fetch endpoint. Two backends are provided:
//!
//! - **[`FsBlobStore`]** — keys mapped to files under a configured root
//!   directory (the default).
//! - **[`S3BlobStore`]** — objects in an S3 bucket, using the S3 REST API
//!   with AWS Signature V4 authentication. Uses only pure-Rust
//!   dependencies (`hmac`, `sha2`) for signing, and supports custom
//!   endpoints for S3-compatible services (MinIO, LocalStack).
//!
//! # Environment Variables (S3 backend)
//!
//! - `AWS_ACCESS_KEY_ID` — required
//! - `AWS_SECRET_ACCESS_KEY` — required
//! - `AWS_SESSION_TOKEN` — optional (for temporary credentials)

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::config::{BlobsConfig, S3BlobConfig};
use crate::error::LibraryError;

type HmacSha256 = Hmac<Sha256>;

/// The key under which an upload's bytes are stored.
pub fn blob_key(filename: &str) -> String {
    format!("/upload/{}", filename)
}

/// Trait for blob store backends.
///
/// Implementations must be safe for concurrent use; the server shares one
/// handle across all requests.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a key, overwriting any existing entry.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), LibraryError>;

    /// Fetch the bytes for a key, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LibraryError>;
}

/// Create the appropriate [`BlobStore`] based on configuration.
pub fn create_blob_store(config: &BlobsConfig) -> anyhow::Result<Box<dyn BlobStore>> {
    match config.backend.as_str() {
        "filesystem" => Ok(Box::new(FsBlobStore::new(config.root.clone()))),
        "s3" => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("[blobs.s3] section required for s3 backend"))?;
            Ok(Box::new(S3BlobStore::new(s3.clone())?))
        }
        other => anyhow::bail!("Unknown blob backend: {}", other),
    }
}

// ============ Filesystem backend ============

/// Blob store mapping keys to files under a root directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a key to a path under the root. Keys are opaque, so every
    /// segment must be a plain name — no `.`/`..`/empty segments.
    fn resolve(&self, key: &str) -> Result<PathBuf, LibraryError> {
        let rel = key.trim_start_matches('/');
        if rel.is_empty() {
            return Err(LibraryError::Storage("empty blob key".to_string()));
        }
        let mut path = self.root.clone();
        for part in rel.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return Err(LibraryError::Storage(format!("invalid blob key: {}", key)));
            }
            path.push(part);
        }
        Ok(path)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), LibraryError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LibraryError::Storage(e.to_string()))?;
        }
        std::fs::write(&path, bytes).map_err(|e| LibraryError::Storage(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LibraryError> {
        let path = self.resolve(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LibraryError::Storage(e.to_string())),
        }
    }
}

// ============ S3 backend ============

/// AWS credentials loaded from environment variables.
struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    fn from_env() -> anyhow::Result<Self> {
        use anyhow::Context;
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .context("AWS_ACCESS_KEY_ID environment variable not set")?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

/// Blob store backed by an S3 bucket, one object per key.
pub struct S3BlobStore {
    config: S3BlobConfig,
    creds: AwsCredentials,
    client: reqwest::Client,
}

impl S3BlobStore {
    pub fn new(config: S3BlobConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            creds: AwsCredentials::from_env()?,
            client: reqwest::Client::new(),
        })
    }

    /// Scheme and host for the configured bucket, honoring a custom
    /// endpoint (MinIO, LocalStack) when present.
    fn endpoint(&self) -> (String, String) {
        if let Some(ref endpoint) = self.config.endpoint_url {
            let (scheme, rest) = match endpoint.split_once("://") {
                Some((s, rest)) => (s.to_string(), rest),
                None => ("https".to_string(), endpoint.as_str()),
            };
            (scheme, rest.trim_end_matches('/').to_string())
        } else {
            (
                "https".to_string(),
                format!(
                    "{}.s3.{}.amazonaws.com",
                    self.config.bucket, self.config.region
                ),
            )
        }
    }

    /// Issue one signed request against the object for `key`.
    async fn request(
        &self,
        method: &str,
        key: &str,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, LibraryError> {
        let (scheme, host) = self.endpoint();
        let encoded_key = key
            .trim_start_matches('/')
            .split('/')
            .map(uri_encode)
            .collect::<Vec<_>>()
            .join("/");
        let canonical_uri = format!("/{}", encoded_key);
        let url = format!("{}://{}{}", scheme, host, canonical_uri);

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let payload_hash = match &body {
            Some(bytes) => hex_sha256(bytes),
            None => hex_sha256(b""),
        };

        let mut headers = vec![
            ("host".to_string(), host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(ref token) = self.creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method, canonical_uri, canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.creds.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.creds.access_key_id, credential_scope, signed_headers, signature
        );

        let mut req_builder = match method {
            "PUT" => self.client.put(&url),
            _ => self.client.get(&url),
        };
        req_builder = req_builder
            .header("Authorization", &authorization)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date);

        if let Some(ref token) = self.creds.session_token {
            req_builder = req_builder.header("x-amz-security-token", token);
        }
        if let Some(bytes) = body {
            req_builder = req_builder.body(bytes);
        }

        req_builder.send().await.map_err(|e| {
            LibraryError::Storage(format!(
                "S3 request failed for s3://{}{}: {}",
                self.config.bucket, key, e
            ))
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), LibraryError> {
        let resp = self.request("PUT", key, Some(bytes.to_vec())).await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LibraryError::Storage(format!(
                "S3 PutObject failed (HTTP {}) for key '{}': {}",
                status,
                key,
                body.chars().take(500).collect::<String>()
            )));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LibraryError> {
        let resp = self.request("GET", key, None).await?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(LibraryError::Storage(format!(
                "S3 GetObject failed (HTTP {}) for key '{}'",
                resp.status(),
                key
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LibraryError::Storage(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }
}

// ============ AWS SigV4 Helpers ============

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute hex-encoded HMAC-SHA256.
fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986 (used in SigV4 canonical requests).
///
/// Encodes all characters except unreserved characters:
/// `A-Z a-z 0-9 - _ . ~`
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}
