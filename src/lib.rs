//! # Docshelf
//!
//! A self-hosted PDF library with model-generated summary variants.
//!
//! Docshelf stores uploaded PDF documents, derives three summarized text
//! variants of each (half-length, condensed, bullet points) through a
//! text-completion model, and serves a browsing UI with a chat box.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐
//! │  Upload  │──▶│   Pipeline     │──▶│  SQLite    │
//! │ (PDF)    │   │ Extract+Model │   │  files    │
//! └──────────┘   └──────┬────────┘   └────┬──────┘
//!                       │                 │
//!                       ▼                 ▼
//!                 ┌──────────┐      ┌──────────┐
//!                 │  Blobs   │      │   HTTP   │
//!                 │ FS / S3  │      │  + CLI   │
//!                 └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shelf init                               # create database
//! shelf ingest reports q1.pdf ./q1.pdf     # ingest one document
//! shelf list                               # browse folders
//! shelf read reports q1.pdf --variant half
//! shelf serve                              # start the HTTP server + UI
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF text extraction |
//! | [`summarize`] | Summarization provider abstraction |
//! | [`blob`] | Blob store backends (filesystem, S3) |
//! | [`ingest`] | The write-path pipeline |
//! | [`list`] | Folder enumeration |
//! | [`get`] | Variant retrieval |
//! | [`server`] | HTTP server and UI |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`error`] | Error taxonomy |

pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod get;
pub mod ingest;
pub mod list;
pub mod migrate;
pub mod models;
pub mod server;
pub mod summarize;
