//! # Bridge
//!
//! A full-text search engine library for Rust.
//!
//! The heart of the crate is the document store: schema-typed documents
//! are packed into compressed, addressable blocks inside a write-once
//! directory, and any document can later be fetched by its sequential id
//! in amortized constant time.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Strictly typed schema with JSON round-trip
//! - Block-compressed document store (identity or LZ4)
//! - Pluggable write-once directories (RAM or mmap)

pub mod analysis;
pub mod codec;
pub mod directory;
pub mod error;
pub mod schema;
pub mod store;

/// Sequential document identifier, assigned by the store writer from 0.
pub type DocId = u32;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
