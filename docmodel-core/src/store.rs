//! Owning entry point that hands out models over one backend.
//!
//! A [`DataStore`] owns a backend and lends it to any number of [`Model`]s, one per model
//! name. Models borrow the backend, so they are cheap to create per request.
//!
//! # Example
//!
//! ```ignore
//! use docmodel::store::DataStore;
//!
//! let store = DataStore::new(backend);
//! let users = store.model::<User>("users");
//! let posts = store.model::<Post>("posts");
//! ```

use bson::Document;

use crate::{
    backend::DataApiBackend,
    document::DocumentShape,
    error::DataApiResult,
    model::Model,
};

/// A document store bound to a specific backend implementation.
#[derive(Debug)]
pub struct DataStore<B: DataApiBackend> {
    backend: B,
}

impl<B: DataApiBackend> DataStore<B> {
    /// Creates a new store over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns a typed model for the given model name.
    pub fn model<'a, D: DocumentShape>(&'a self, name: &str) -> Model<&'a B, D> {
        Model::new(name, &self.backend)
    }

    /// Returns an untyped model working on raw BSON documents.
    pub fn documents<'a>(&'a self, name: &str) -> Model<&'a B, Document> {
        Model::new(name, &self.backend)
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    pub async fn shutdown(self) -> DataApiResult<()> {
        self.backend.shutdown().await
    }
}
