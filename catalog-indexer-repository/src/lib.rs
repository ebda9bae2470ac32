//! # Catalog Indexer Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search engine. It includes the `SearchEngineClient` trait, a concrete
//! OpenSearch implementation, bulk-write accounting, the per-tenant index
//! name resolver, and the idempotent index lifecycle manager.

pub mod bulk;
pub mod errors;
pub mod index_name;
pub mod interfaces;
pub mod lifecycle;
pub mod opensearch;

pub use bulk::BulkWriteReport;
pub use errors::SearchError;
pub use index_name::{alias_for_tenant, backing_index_for_alias};
pub use interfaces::SearchEngineClient;
pub use lifecycle::IndexLifecycleManager;
pub use opensearch::OpenSearchClient;
