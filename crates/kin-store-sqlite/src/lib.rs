//! SQLite backend for the Kin family-tree store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements both
//! [`kin_core::store::FamilyStore`] and [`kin_core::media::MediaStore`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
