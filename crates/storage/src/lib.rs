#![forbid(unsafe_code)]

pub mod repository;
pub mod seed;
pub mod sqlite;

pub use repository::{InMemoryStore, StateStore, StorageError};
pub use sqlite::{SqliteInitError, SqliteStore};
