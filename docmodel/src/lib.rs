//! A typed model facade over remote document stores.
//!
//! This crate is the entry point for users of docmodel. It re-exports the core types from
//! `docmodel-core` and gives access to the available backends.
//!
//! Callers work with plain string identifiers and ordinary Serde types; the [`Model`]
//! facade converts `_id` conditions to the store's tagged form where needed and maps every
//! operation onto a single backend action (or two, for `update` and `delete`).
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DataApiResult<()> {
//!     let store = DataStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.model::<User>("users");
//!
//!     let alice = users.create(User { name: "Alice".into(), age: 30 }).await?;
//!
//!     let found = users
//!         .find(FindParams::new().filter(doc! { "_id": &alice.id }))
//!         .await?;
//!     println!("found {found:?}");
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-process store for development and testing
//! - `dataapi` - Remote HTTP Data API (requires the `dataapi` feature)
//!
//! [`Model`]: model::Model

pub mod prelude;

pub use docmodel_core::{backend, document, error, id, model, params, request, store};

pub use bson;

/// In-memory storage backend.
pub mod memory {
    pub use docmodel_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// HTTP Data API storage backend.
///
/// This module is only available when the `dataapi` feature is enabled.
#[cfg(feature = "dataapi")]
pub mod dataapi {
    pub use docmodel_dataapi::{DataApiConfig, DataApiStore, DataApiStoreBuilder};
}
