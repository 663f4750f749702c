//! Persistence backends for the snip mapping store.

pub mod config;
pub mod file;
pub mod memory;
pub mod postgres;

pub use config::{open_backend, BackendConfig};
pub use file::FileBackend;
pub use memory::VolatileBackend;
pub use postgres::{PostgresBackend, PostgresSettings};
pub use snip_core::{Backend, Change, Relation, StorageError};
