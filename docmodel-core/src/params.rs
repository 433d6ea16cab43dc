//! Caller-facing parameters for model operations.
//!
//! Filters, projections and sorts are plain BSON documents in the store's own query
//! language and are forwarded without validation. Every parameter set also carries an
//! `options` document for store-specific extras that should reach the store verbatim.
//!
//! ```ignore
//! use bson::doc;
//! use docmodel_core::params::FindManyParams;
//!
//! let params = FindManyParams::new()
//!     .filter(doc! { "status": "open" })
//!     .sort(doc! { "created_at": -1 })
//!     .limit(20);
//! ```

use bson::{Bson, Document};

/// Parameters for [`Model::find`](crate::model::Model::find).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindParams {
    pub filter: Option<Document>,
    pub projection: Option<Document>,
    pub options: Document,
}

impl FindParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Adds a store-specific option forwarded verbatim with the request.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Parameters for [`Model::find_many`](crate::model::Model::find_many).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyParams {
    pub filter: Option<Document>,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub options: Document,
}

impl FindManyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Adds a store-specific option forwarded verbatim with the request.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Parameters for [`Model::update`](crate::model::Model::update).
///
/// `update` is the patch applied with `$set`; it is not a full update document.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateParams {
    pub filter: Document,
    pub update: Document,
    pub upsert: Option<bool>,
    pub options: Document,
}

impl UpdateParams {
    pub fn new(filter: Document, update: Document) -> Self {
        Self {
            filter,
            update,
            upsert: None,
            options: Document::new(),
        }
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    /// Adds a store-specific option forwarded verbatim with the request.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Parameters for [`Model::delete`](crate::model::Model::delete).
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteParams {
    pub filter: Document,
    pub options: Document,
}

impl DeleteParams {
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            options: Document::new(),
        }
    }

    /// Adds a store-specific option forwarded verbatim with the request.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
