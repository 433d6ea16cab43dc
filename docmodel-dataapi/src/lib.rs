//! HTTP Data API backend for docmodel.
//!
//! [`DataApiStore`] implements [`DataApiBackend`](docmodel_core::backend::DataApiBackend)
//! by posting each action as JSON to a remote Data API endpoint, authenticated with an
//! `api-key` header.

#[allow(unused_extern_crates)]
extern crate self as docmodel_dataapi;

pub mod config;
pub mod store;

pub use config::DataApiConfig;
pub use store::{DataApiStore, DataApiStoreBuilder};
