//! Core types and shared functionality for spritz.
//!
//! This crate provides:
//! - Bucketed response cache with SQLite and in-memory backends
//! - Record persistence for the cocktail catalog
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod records;

pub use cache::{CacheDb, CacheStorage, MemoryStorage, Snapshot};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use records::{Cocktail, Ingredient, RecordStore};
