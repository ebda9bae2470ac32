//! # Catalog Indexer Store
//!
//! Persistence layer for ingestion jobs and raw payload rows.
//!
//! The job and raw-payload tables are owned by the admin subsystem's
//! schema; this crate only reads them and mutates job status and counts.
//! The `JobStore` trait keeps the processor testable against in-memory
//! mocks.

pub mod errors;
pub mod interfaces;
pub mod postgres;

pub use errors::StoreError;
pub use interfaces::JobStore;
pub use postgres::PgJobStore;
