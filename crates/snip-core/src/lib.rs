//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the short code type, the code deriver, the
//! owner/code relation and the persistence backend contract shared by
//! the storage backends and the mapping store.

pub mod backend;
pub mod derive;
pub mod error;
pub mod relation;
pub mod shortcode;

pub use backend::{Backend, Change};
pub use derive::{Deriver, DigestDeriver};
pub use error::{CoreError, StorageError};
pub use relation::{Entry, Link, Relation};
pub use shortcode::ShortCode;
