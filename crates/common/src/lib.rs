//! Common utilities and shared types for collexo-rs.
//!
//! This crate provides foundational components used across all collexo-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: File storage backends for uploaded submission files
//!
//! # Example
//!
//! ```no_run
//! use collexo_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID for {}: {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult, FieldErrorKind, FieldViolation};
pub use id::IdGenerator;
pub use storage::{
    LocalStorage, NoOpStorage, StorageBackend, StoredFile, file_extension, generate_storage_key,
};
