//! In-memory storage implementation for model backends.
//!
//! This module provides a simple backend that keeps each collection as an ordered list
//! of BSON documents behind an async-safe read-write lock, answering the same six
//! actions as the remote Data API.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, oid::ObjectId};

use docmodel_core::{
    backend::{DataApiBackend, DataApiBackendBuilder},
    error::{DataApiError, DataApiResult},
    id::IdCodec,
    request::{
        Aggregate, DeleteOne, DeleteResult, Find, FindOne, InsertOne, InsertOneResult,
        UpdateOne, UpdateResult,
    },
};

use crate::evaluator::{
    DocumentEvaluator, apply_update, project_document, sort_documents, upsert_seed,
};

type CollectionList = Vec<Document>;
type StoreMap = HashMap<String, CollectionList>;


/// Thread-safe in-memory document store backend.
///
/// Identifiers are kept in their plain form under `_id`, exactly as the remote store
/// reports them on read paths. Documents inserted without an `_id` receive a fresh
/// object id in hex form.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state. Multiple
/// clones of the same instance share the same underlying data.
///
/// # Performance
///
/// Every action scans the whole collection (no indexing). It is meant for
/// development and tests, not for large datasets.
///
/// # Example
///
/// ```ignore
/// use docmodel_memory::InMemoryStore;
/// use docmodel::{backend::DataApiBackend, request::InsertOne};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let inserted = store
///     .insert_one(InsertOne { document: doc! { "name": "Alice" } }, "users")
///     .await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns a snapshot of every document currently stored in `collection`.
    pub async fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn holds_id(documents: &[Document], id: &str) -> bool {
        documents
            .iter()
            .any(|existing| matches!(existing.get(IdCodec::FIELD), Some(Bson::String(held)) if held == id))
    }

    fn position(documents: &[Document], filter: &Document) -> DataApiResult<Option<usize>> {
        for (index, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).evaluate(filter)? {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }

    fn window(documents: Vec<Document>, skip: Option<i64>, limit: Option<i64>) -> Vec<Document> {
        let skip = skip.unwrap_or(0).max(0) as usize;
        // A zero limit means no limit; a negative one is read as its magnitude.
        let limit = match limit.map(i64::unsigned_abs) {
            None | Some(0) => usize::MAX,
            Some(limit) => limit as usize,
        };

        documents
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect()
    }

    fn run_stage(documents: Vec<Document>, stage: &Document) -> DataApiResult<Vec<Document>> {
        let (name, spec) = match stage.iter().next() {
            Some(entry) if stage.len() == 1 => entry,
            _ => {
                return Err(DataApiError::StoreUnavailable(format!(
                    "pipeline stage must have exactly one field, got {stage}"
                )));
            },
        };
        let malformed = || DataApiError::StoreUnavailable(format!("malformed {name} stage: {spec}"));

        match name.as_str() {
            "$match" => DocumentEvaluator::filter_documents(
                documents.iter(),
                spec.as_document().ok_or_else(malformed)?,
            ),
            "$sort" => {
                let mut sorted = documents;
                sort_documents(&mut sorted, spec.as_document().ok_or_else(malformed)?);
                Ok(sorted)
            },
            "$skip" => Ok(Self::window(documents, Some(Self::stage_number(spec).ok_or_else(malformed)?), None)),
            "$limit" => Ok(Self::window(documents, None, Some(Self::stage_number(spec).ok_or_else(malformed)?))),
            "$project" => {
                let projection = spec.as_document().ok_or_else(malformed)?;
                Ok(documents
                    .into_iter()
                    .map(|document| project_document(document, projection))
                    .collect())
            },
            "$count" => {
                let field = spec.as_str().ok_or_else(malformed)?;
                // Like the remote store, counting nothing produces no row at all.
                Ok(match documents.len() {
                    0 => vec![],
                    n => {
                        let mut row = Document::new();
                        row.insert(field, n as i64);
                        vec![row]
                    },
                })
            },
            other => Err(DataApiError::StoreUnavailable(format!(
                "unsupported pipeline stage {other}"
            ))),
        }
    }

    fn stage_number(spec: &Bson) -> Option<i64> {
        match spec {
            Bson::Int32(n) => Some(*n as i64),
            Bson::Int64(n) => Some(*n),
            _ => None,
        }
    }
}


#[async_trait]
impl DataApiBackend for InMemoryStore {
    async fn insert_one(&self, request: InsertOne, collection: &str) -> DataApiResult<InsertOneResult> {
        let mut document = request.document;
        let id = match document.get(IdCodec::FIELD) {
            None => ObjectId::new().to_hex(),
            Some(value) => IdCodec::read_external(value)
                .map_err(|e| DataApiError::WriteRejected(e.to_string()))?,
        };

        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        if Self::holds_id(documents, &id) {
            return Err(DataApiError::WriteRejected(format!(
                "duplicate {} {id} in collection {collection}",
                IdCodec::FIELD,
            )));
        }

        document.insert(IdCodec::FIELD, id.clone());
        documents.push(document);

        Ok(InsertOneResult { inserted_id: Bson::String(id) })
    }

    async fn find_one(&self, request: FindOne, collection: &str) -> DataApiResult<Option<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(col) => col,
            None => return Ok(None),
        };

        let filter = request.filter.unwrap_or_default();

        Ok(
            Self::position(documents, &filter)?
                .map(|index| documents[index].clone())
                .map(|document| match &request.projection {
                    Some(projection) => project_document(document, projection),
                    None => document,
                })
        )
    }

    async fn find(&self, request: Find, collection: &str) -> DataApiResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut matched = DocumentEvaluator::filter_documents(
            documents.iter(),
            &request.filter.unwrap_or_default(),
        )?;

        if let Some(sort) = &request.sort {
            sort_documents(&mut matched, sort);
        }

        Ok(
            Self::window(matched, request.skip, request.limit)
                .into_iter()
                .map(|document| match &request.projection {
                    Some(projection) => project_document(document, projection),
                    None => document,
                })
                .collect()
        )
    }

    async fn aggregate(&self, request: Aggregate, collection: &str) -> DataApiResult<Vec<Document>> {
        let mut documents = self.snapshot(collection).await;

        for stage in &request.pipeline {
            documents = Self::run_stage(documents, stage)?;
        }

        Ok(documents)
    }

    async fn update_one(&self, request: UpdateOne, collection: &str) -> DataApiResult<UpdateResult> {
        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        match Self::position(documents, &request.filter)? {
            Some(index) => {
                let mut updated = documents[index].clone();
                apply_update(&mut updated, &request.update)?;

                if updated.get(IdCodec::FIELD) != documents[index].get(IdCodec::FIELD) {
                    return Err(DataApiError::WriteRejected(format!(
                        "the {} field is immutable",
                        IdCodec::FIELD,
                    )));
                }

                let modified = updated != documents[index];
                documents[index] = updated;

                Ok(UpdateResult {
                    matched_count: 1,
                    modified_count: modified as u64,
                    upserted_id: None,
                })
            },
            None if request.upsert == Some(true) => {
                let mut inserted = upsert_seed(&request.filter);
                apply_update(&mut inserted, &request.update)?;

                let id = match inserted.get(IdCodec::FIELD) {
                    Some(value) => IdCodec::read_external(value)
                        .map_err(|e| DataApiError::WriteRejected(e.to_string()))?,
                    None => ObjectId::new().to_hex(),
                };
                if Self::holds_id(documents, &id) {
                    return Err(DataApiError::WriteRejected(format!(
                        "upsert would duplicate {} {id} in collection {collection}",
                        IdCodec::FIELD,
                    )));
                }
                inserted.insert(IdCodec::FIELD, id.clone());
                documents.push(inserted);

                Ok(UpdateResult {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: Some(Bson::String(id)),
                })
            },
            None => Ok(UpdateResult::default()),
        }
    }

    async fn delete_one(&self, request: DeleteOne, collection: &str) -> DataApiResult<DeleteResult> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(DeleteResult::default()),
        };

        Ok(match Self::position(documents, &request.filter)? {
            Some(index) => {
                documents.remove(index);
                DeleteResult { deleted_count: 1 }
            },
            None => DeleteResult::default(),
        })
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl DataApiBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DataApiResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
