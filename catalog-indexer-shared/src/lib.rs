//! # Catalog Indexer Shared
//!
//! Shared types and data structures for the catalog indexer system.
//!
//! This crate holds the plain data model used across the pipeline:
//! the queue message, the persisted job record, raw payload rows, and
//! the transient product document that is bulk-written into the search
//! index. It carries no I/O dependencies so every other crate can use it.

pub mod document;
pub mod job;

pub use document::{ProductIndexDocument, ProductRaw};
pub use job::{IngestionJob, IngestionJobMessage, JobStatus, ProcessingResult, SourceType};
