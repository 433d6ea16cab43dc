//! In-memory store backend for docmodel.
//!
//! This crate provides a thread-safe, in-memory implementation of the `DataApiBackend`
//! trait. It answers the same actions as the remote Data API, with the same identifier
//! conventions, which makes it a drop-in backend for development and tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Query support** - Comparison, membership, existence and logical filter operators
//! - **Tagged identifiers** - `{ "_id": { "$oid": ... } }` filters match plain ids
//! - **Pipelines** - `$match`, `$sort`, `$skip`, `$limit`, `$project` and `$count`
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DataStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.model::<User>("users");
//!
//!     users.create(User { name: "Alice".to_string() }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
