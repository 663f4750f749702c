//! The snip mapping store.
//!
//! [`LinkStore`] owns the owner → code → URL relation, derives codes,
//! enforces duplicate and soft-delete semantics and writes every change
//! through to one [`Backend`](snip_core::Backend). Backends live in
//! `snip_storage`; core types are re-exported from `snip_core`.

pub mod config;
pub mod error;
pub mod store;
pub mod validate;

pub use config::{ConfigError, StorageBackendArg, StoreArgs};
pub use error::StoreError;
pub use snip_core::{Entry, ShortCode};
pub use store::{LinkStore, Resolution, Submission, SubmitOutcome};
