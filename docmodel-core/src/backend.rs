//! Store backend abstraction for the model facade.
//!
//! This module defines the traits that abstract over the remote document store, allowing
//! models to run against the HTTP Data API in production and an in-process store in
//! development and tests.
//!
//! # Overview
//!
//! The [`DataApiBackend`] trait exposes the six single-round-trip actions a model is
//! built from: `insert_one`, `find_one`, `find`, `aggregate`, `update_one` and
//! `delete_one`. Every action names the collection it targets; requests and responses
//! are forwarded verbatim apart from the identifier handling done by
//! [`Model`](crate::model::Model).
//!
//! # Traits
//!
//! - [`DataApiBackend`]: The core trait for store backends
//! - [`DataApiBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docmodel::backend::DataApiBackend;
//! use docmodel::request::FindOne;
//! use bson::doc;
//!
//! let found = backend
//!     .find_one(
//!         FindOne { filter: Some(doc! { "name": "Alice" }), ..Default::default() },
//!         "users",
//!     )
//!     .await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::DataApiResult,
    request::{
        Aggregate, DeleteOne, DeleteResult, Find, FindOne, InsertOne, InsertOneResult,
        UpdateOne, UpdateResult,
    },
};

/// Abstract interface for remote document store backends.
///
/// # Thread Safety
///
/// Implementations must be thread-safe. A single backend handle is shared read-only by
/// every model and every concurrent call; no action may mutate connection-level state
/// observable by another call.
///
/// # Error Handling
///
/// Transport failures surface as
/// [`DataApiError::StoreUnavailable`](crate::error::DataApiError::StoreUnavailable) and
/// refused writes as
/// [`DataApiError::WriteRejected`](crate::error::DataApiError::WriteRejected).
/// Backends never retry.
#[async_trait]
pub trait DataApiBackend: Send + Sync + Debug {
    /// Inserts a single document and reports the identifier the store assigned.
    async fn insert_one(
        &self,
        request: InsertOne,
        collection: &str,
    ) -> DataApiResult<InsertOneResult>;

    /// Returns the first document matching the request filter, or `None`.
    async fn find_one(&self, request: FindOne, collection: &str)
    -> DataApiResult<Option<Document>>;

    /// Returns every document matching the request filter, after sort, skip and limit.
    async fn find(&self, request: Find, collection: &str) -> DataApiResult<Vec<Document>>;

    /// Runs an aggregation pipeline and returns its output documents.
    async fn aggregate(&self, request: Aggregate, collection: &str)
    -> DataApiResult<Vec<Document>>;

    /// Applies an update document to the first document matching the request filter.
    async fn update_one(&self, request: UpdateOne, collection: &str)
    -> DataApiResult<UpdateResult>;

    /// Deletes the first document matching the request filter.
    async fn delete_one(&self, request: DeleteOne, collection: &str)
    -> DataApiResult<DeleteResult>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DataApiResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> DataApiBackend for &B
where
    B: DataApiBackend + ?Sized,
{
    async fn insert_one(
        &self,
        request: InsertOne,
        collection: &str,
    ) -> DataApiResult<InsertOneResult> {
        (**self).insert_one(request, collection).await
    }

    async fn find_one(
        &self,
        request: FindOne,
        collection: &str,
    ) -> DataApiResult<Option<Document>> {
        (**self).find_one(request, collection).await
    }

    async fn find(&self, request: Find, collection: &str) -> DataApiResult<Vec<Document>> {
        (**self).find(request, collection).await
    }

    async fn aggregate(
        &self,
        request: Aggregate,
        collection: &str,
    ) -> DataApiResult<Vec<Document>> {
        (**self).aggregate(request, collection).await
    }

    async fn update_one(
        &self,
        request: UpdateOne,
        collection: &str,
    ) -> DataApiResult<UpdateResult> {
        (**self).update_one(request, collection).await
    }

    async fn delete_one(
        &self,
        request: DeleteOne,
        collection: &str,
    ) -> DataApiResult<DeleteResult> {
        (**self).delete_one(request, collection).await
    }
}

#[async_trait]
impl<B> DataApiBackend for Arc<B>
where
    B: DataApiBackend + ?Sized,
{
    async fn insert_one(
        &self,
        request: InsertOne,
        collection: &str,
    ) -> DataApiResult<InsertOneResult> {
        (**self).insert_one(request, collection).await
    }

    async fn find_one(
        &self,
        request: FindOne,
        collection: &str,
    ) -> DataApiResult<Option<Document>> {
        (**self).find_one(request, collection).await
    }

    async fn find(&self, request: Find, collection: &str) -> DataApiResult<Vec<Document>> {
        (**self).find(request, collection).await
    }

    async fn aggregate(
        &self,
        request: Aggregate,
        collection: &str,
    ) -> DataApiResult<Vec<Document>> {
        (**self).aggregate(request, collection).await
    }

    async fn update_one(
        &self,
        request: UpdateOne,
        collection: &str,
    ) -> DataApiResult<UpdateResult> {
        (**self).update_one(request, collection).await
    }

    async fn delete_one(
        &self,
        request: DeleteOne,
        collection: &str,
    ) -> DataApiResult<DeleteResult> {
        (**self).delete_one(request, collection).await
    }
}

#[async_trait]
pub trait DataApiBackendBuilder {
    type Backend: DataApiBackend;

    async fn build(self) -> DataApiResult<Self::Backend>;
}
