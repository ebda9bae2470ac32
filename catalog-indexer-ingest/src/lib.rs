//! # Catalog Indexer Ingest
//!
//! This crate provides the ingest components for consuming job messages
//! from the broker and indexing product documents into the search engine.
//!
//! ## Architecture
//!
//! The ingest follows the Consumer-Processor-Builder pattern:
//!
//! 1. **Broker**: Kafka connection with retry and dead-letter topics
//! 2. **Consumer**: Receives job messages and routes failures
//! 3. **Processor**: Drives one job through the whole pipeline
//! 4. **Builder**: Turns raw payloads into normalized product documents
//! 5. **Embeddings**: Batch vector enrichment over HTTP

pub mod broker;
pub mod builder;
pub mod consumer;
pub mod context;
pub mod embeddings;
pub mod errors;
pub mod processor;

pub use errors::IngestError;
