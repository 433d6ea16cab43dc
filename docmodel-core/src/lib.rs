//! A typed model facade over remote document stores reached through an HTTP Data API.
//!
//! This crate is the core of the docmodel project and provides:
//!
//! - **Identifier codec** ([`id`]) - Conversion between plain and tagged `_id` values
//! - **Store backend abstraction** ([`backend`]) - The six actions a backend must serve
//! - **Request shapes** ([`request`]) - Requests and responses exchanged with backends
//! - **Operation parameters** ([`params`]) - Filters, projections and sorts for models
//! - **Document shapes** ([`document`]) - BSON conversion for caller-defined types
//! - **Model facade** ([`model`]) - `create`, `find`, `find_many`, `count`, `update`, `delete`
//! - **Document store** ([`store`]) - Owns a backend and hands out models
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
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
//! let store = DataStore::new(InMemoryStore::new());
//! let users = store.model::<User>("users");
//! let alice = users.create(User { name: "Alice".into() }).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_core;

pub mod backend;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod params;
pub mod request;
pub mod store;
