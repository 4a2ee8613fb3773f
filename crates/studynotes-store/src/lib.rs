//! # studynotes-store
//!
//! Storage layer for studynotes.
//!
//! This crate provides:
//! - In-memory emulator backends (tests, demo mode)
//! - PostgreSQL backends via sqlx (items as JSONB, blobs as bytea)
//! - The backed Note Repository and Subject Directory
//! - The mock search function
//! - The content-fetch tracker for abortable text fetches
//! - The idempotent `provision` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studynotes_core::NoteRepository;
//! use studynotes_store::{BackedNoteRepository, MemoryObjectStore, MemoryTableStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tables = Arc::new(MemoryTableStore::new());
//!     let objects = Arc::new(MemoryObjectStore::new());
//!     let notes = BackedNoteRepository::new(tables, objects)
//!         .with_seed(studynotes_core::seed_notes());
//!     println!("{} notes", notes.list_all().await?.len());
//!     Ok(())
//! }
//! ```

pub mod fetch;
pub mod memory;
pub mod notes;
pub mod pg;
pub mod pool;
pub mod provision;
pub mod search_fn;
pub mod subjects;

// Re-export core types
pub use studynotes_core::*;

pub use fetch::ContentFetchTracker;
pub use memory::{MemoryObjectStore, MemoryTableStore, NoFunctionInvoker};
pub use notes::BackedNoteRepository;
pub use pg::{PgObjectStore, PgTableStore};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use provision::{provision, ProvisionReport};
pub use search_fn::MockSearchFunction;
pub use subjects::BackedSubjectDirectory;
