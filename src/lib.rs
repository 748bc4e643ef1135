//! Papershelf Core Library
//!
//! Keeps a local collection of arXiv papers consistent: one registry row per
//! paper, the highest version seen wins, and every "should we fetch this?"
//! question goes through a single decision table.
//!
//! # Architecture
//!
//! - [`identifier`] - Parse raw ids into `(category, idNumber, version)`; classify names
//! - [`registry`] - Persisted paper registry with no-downgrade upserts
//! - [`reconcile`] - Fetch decisions from local and remote versions
//! - [`layout`] - Where a paper's artifacts live on disk
//! - [`scan`] - Discover existing paper directories and loose PDFs
//! - [`remote`] - Latest-version lookups against the arXiv API
//! - [`batch`] - Parse/reconcile/record driver for lists of ids
//! - [`db`] - Database connection and schema management

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod db;
pub mod identifier;
pub mod layout;
pub mod reconcile;
pub mod registry;
pub mod remote;
pub mod scan;
mod user_agent;

// Re-export commonly used types
pub use batch::{BatchItem, BatchPlanner, FetchedArtifacts};
pub use db::{Database, DatabaseOptions, DbError};
pub use identifier::{Identity, PaperKey, ParsedIdentifier, looks_like_identifier, parse, parse_identifier};
pub use layout::PaperLayout;
pub use reconcile::{Action, FetchPlan, Reconciler, decide};
pub use registry::{
    FilterField, ListFilter, Listing, PaperRecord, PaperRegistry, PaperRepository, RegistryEntry,
    RegistryError, StorageErrorKind, UpsertOutcome,
};
pub use remote::{ArxivVersionSource, RemoteError, RemotePaper, VersionSource};
pub use scan::{PdfImport, PdfImports, ScanError, ScannedPaper, collect_pdf_imports, scan_library};
