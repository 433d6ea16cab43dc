//! The typed model facade.
//!
//! A [`Model`] binds a model (collection) name to a backend handle and exposes the six
//! operations callers work with: [`create`](Model::create), [`find`](Model::find),
//! [`find_many`](Model::find_many), [`count`](Model::count), [`update`](Model::update) and
//! [`delete`](Model::delete).
//!
//! Identifiers are plain strings on the caller side. `find`, `update` and `count_where`
//! wrap an `_id` condition into its tagged form before dispatch; `find_many` forwards
//! its filter untouched. Caller-supplied parameters are never modified.
//!
//! `update` and `delete` each take two round trips (write then re-read, read then
//! delete). Nothing makes the pair atomic: a concurrent writer can act between them.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use docmodel::prelude::*;
//!
//! let users: Model<_, User> = Model::new("users", &backend);
//! let created = users.create(User { name: "Alice".into(), age: 30 }).await?;
//!
//! let updated = users
//!     .update(UpdateParams::new(doc! { "_id": &created.id }, doc! { "age": 31 }))
//!     .await?;
//! ```

use bson::{Bson, Document, doc};
use std::marker::PhantomData;
use tracing::debug;

use crate::{
    backend::DataApiBackend,
    document::{DocumentExt, DocumentShape, Identified},
    error::{DataApiError, DataApiResult},
    id::IdCodec,
    params::{DeleteParams, FindManyParams, FindParams, UpdateParams},
    request::{Aggregate, DeleteOne, Find, FindOne, InsertOne, UpdateOne},
};

/// Name of the field the count pipeline writes its result to.
const COUNT_FIELD: &str = "count";

/// A typed facade over one model of a remote document store.
///
/// # Type Parameters
///
/// * `B` - The backend handle, typically `&Backend` or `Arc<Backend>`
/// * `D` - The document shape; defaults to an untyped BSON [`Document`]
#[derive(Debug)]
pub struct Model<B: DataApiBackend, D = Document> {
    name: String,
    backend: B,
    _marker: PhantomData<fn() -> D>,
}

impl<B: DataApiBackend, D: DocumentShape> Model<B, D> {
    /// Creates a model bound to `name`. Nothing is sent to the store until first use.
    pub fn new(name: impl Into<String>, backend: B) -> Self {
        Self {
            name: name.into(),
            backend,
            _marker: PhantomData,
        }
    }

    /// Returns the model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backend handle this model dispatches to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Inserts `document` and returns it together with the identifier the store assigned.
    ///
    /// # Errors
    ///
    /// Returns [`DataApiError::StoreUnavailable`] or [`DataApiError::WriteRejected`] when
    /// the insert fails, and [`DataApiError::InvalidIdentifier`] when the reported
    /// identifier cannot be read.
    pub async fn create(&self, document: D) -> DataApiResult<Identified<D>> {
        let body = document.to_document()?;
        debug!(model = %self.name, document = %body, "create");

        let inserted = self
            .backend
            .insert_one(InsertOne { document: body }, &self.name)
            .await?;

        Ok(Identified::new(
            IdCodec::read_external(&inserted.inserted_id)?,
            document,
        ))
    }

    /// Returns the first document matching `params.filter`, or `None`.
    ///
    /// A plain `_id` condition is sent to the store in tagged form.
    pub async fn find(&self, params: FindParams) -> DataApiResult<Option<D>> {
        self.find_document(&params)
            .await?
            .map(D::from_document)
            .transpose()
    }

    /// Returns every document matching `params.filter`.
    ///
    /// Unlike [`find`](Self::find), the filter is forwarded exactly as given: an `_id`
    /// condition must already be in the form the store expects.
    pub async fn find_many(&self, params: FindManyParams) -> DataApiResult<Vec<D>> {
        debug!(model = %self.name, params = ?params, "find_many");

        let FindManyParams {
            filter,
            projection,
            sort,
            limit,
            skip,
            options,
        } = params;

        self.backend
            .find(
                Find {
                    filter,
                    projection,
                    sort,
                    limit,
                    skip,
                    options,
                },
                &self.name,
            )
            .await?
            .into_iter()
            .map(D::from_document)
            .collect()
    }

    /// Counts every document of the model.
    ///
    /// No filter is applied; see [`count_where`](Self::count_where) for that.
    ///
    /// # Errors
    ///
    /// Returns [`DataApiError::UnexpectedEmptyResult`] when the count pipeline yields no
    /// row, which is also what the store does for an empty collection.
    pub async fn count(&self) -> DataApiResult<u64> {
        debug!(model = %self.name, "count");

        self.run_count(vec![doc! { "$count": COUNT_FIELD }]).await
    }

    /// Counts the documents matching `filter`, wrapping an `_id` condition like `find`.
    ///
    /// # Errors
    ///
    /// Same as [`count`](Self::count).
    pub async fn count_where(&self, filter: Document) -> DataApiResult<u64> {
        debug!(model = %self.name, filter = %filter, "count_where");

        self.run_count(vec![
            doc! { "$match": IdCodec::wrap_filter(&filter) },
            doc! { "$count": COUNT_FIELD },
        ])
        .await
    }

    /// Applies `params.update` with `$set` to the first matching document and returns
    /// that document as re-read afterwards.
    ///
    /// Returns `None` when the store reports no modified document, including an upsert
    /// that inserted rather than modified. The re-read uses the caller's filter, so if
    /// the update changed a field the filter selects on, the re-read may miss or pick a
    /// different document.
    pub async fn update(&self, params: UpdateParams) -> DataApiResult<Option<D>> {
        debug!(model = %self.name, params = ?params, "update");

        let UpdateParams {
            filter,
            update,
            upsert,
            options,
        } = params;
        let filter = IdCodec::wrap_filter(&filter);

        let updated = self
            .backend
            .update_one(
                UpdateOne {
                    filter: filter.clone(),
                    update: doc! { "$set": update },
                    upsert,
                    options,
                },
                &self.name,
            )
            .await?;

        if updated.modified_count == 0 {
            return Ok(None);
        }

        self.find(FindParams::new().filter(IdCodec::unwrap_filter(&filter)?))
            .await
    }

    /// Deletes the first document matching `params.filter` and returns it as it was
    /// just before deletion.
    ///
    /// The document is looked up with [`find`](Self::find) first; the delete itself is
    /// keyed on that document's identifier alone, never on the rest of the caller's
    /// filter. Returns `None` without issuing a delete when nothing matches, and `None`
    /// when the store reports nothing deleted.
    pub async fn delete(&self, params: DeleteParams) -> DataApiResult<Option<D>> {
        debug!(model = %self.name, params = ?params, "delete");

        let DeleteParams { filter, options } = params;
        let lookup = FindParams {
            filter: Some(filter),
            projection: None,
            options: options.clone(),
        };

        let Some(found) = self.find_document(&lookup).await? else {
            return Ok(None);
        };

        let id = IdCodec::read_external(found.get(IdCodec::FIELD).ok_or_else(|| {
            DataApiError::InvalidIdentifier(format!(
                "document from {} has no {} field",
                self.name,
                IdCodec::FIELD,
            ))
        })?)?;
        let request = DeleteOne {
            filter: IdCodec::id_filter(id),
            options,
        };
        debug!(model = %self.name, filter = %request.filter, "delete_one");

        let deleted = self.backend.delete_one(request, &self.name).await?;

        if deleted.deleted_count == 0 {
            return Ok(None);
        }

        D::from_document(found).map(Some)
    }

    async fn find_document(&self, params: &FindParams) -> DataApiResult<Option<Document>> {
        debug!(model = %self.name, params = ?params, "find");

        self.backend
            .find_one(
                FindOne {
                    filter: params.filter.as_ref().map(IdCodec::wrap_filter),
                    projection: params.projection.clone(),
                    options: params.options.clone(),
                },
                &self.name,
            )
            .await
    }

    async fn run_count(&self, pipeline: Vec<Document>) -> DataApiResult<u64> {
        let rows = self
            .backend
            .aggregate(
                Aggregate {
                    pipeline,
                    options: Document::new(),
                },
                &self.name,
            )
            .await?;

        let row = rows.first().ok_or_else(|| {
            DataApiError::UnexpectedEmptyResult(format!(
                "count aggregation on {} returned no rows",
                self.name
            ))
        })?;

        match row.get(COUNT_FIELD) {
            Some(Bson::Int32(n)) if *n >= 0 => Ok(*n as u64),
            Some(Bson::Int64(n)) if *n >= 0 => Ok(*n as u64),
            Some(Bson::Double(n)) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as u64),
            other => Err(DataApiError::MalformedResponse(format!(
                "count aggregation on {} returned {:?} for {COUNT_FIELD}",
                self.name, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::request::{DeleteResult, InsertOneResult, UpdateResult};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        InsertOne(InsertOne),
        FindOne(FindOne),
        Find(Find),
        Aggregate(Aggregate),
        UpdateOne(UpdateOne),
        DeleteOne(DeleteOne),
    }

    /// Answers every action from canned values and records what it was asked.
    #[derive(Debug, Default)]
    struct ScriptedBackend {
        calls: Mutex<Vec<Call>>,
        found: Option<Document>,
        rows: Vec<Document>,
        modified: u64,
        deleted: u64,
    }

    impl ScriptedBackend {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl DataApiBackend for ScriptedBackend {
        async fn insert_one(&self, request: InsertOne, _: &str) -> DataApiResult<InsertOneResult> {
            self.record(Call::InsertOne(request));
            Ok(InsertOneResult { inserted_id: Bson::String("new-id".into()) })
        }

        async fn find_one(&self, request: FindOne, _: &str) -> DataApiResult<Option<Document>> {
            self.record(Call::FindOne(request));
            Ok(self.found.clone())
        }

        async fn find(&self, request: Find, _: &str) -> DataApiResult<Vec<Document>> {
            self.record(Call::Find(request));
            Ok(self.rows.clone())
        }

        async fn aggregate(&self, request: Aggregate, _: &str) -> DataApiResult<Vec<Document>> {
            self.record(Call::Aggregate(request));
            Ok(self.rows.clone())
        }

        async fn update_one(&self, request: UpdateOne, _: &str) -> DataApiResult<UpdateResult> {
            self.record(Call::UpdateOne(request));
            Ok(UpdateResult {
                matched_count: self.modified,
                modified_count: self.modified,
                upserted_id: None,
            })
        }

        async fn delete_one(&self, request: DeleteOne, _: &str) -> DataApiResult<DeleteResult> {
            self.record(Call::DeleteOne(request));
            Ok(DeleteResult { deleted_count: self.deleted })
        }
    }

    #[tokio::test]
    async fn find_sends_a_tagged_id_and_keeps_the_caller_filter() {
        let backend = ScriptedBackend::default();
        let model: Model<_> = Model::new("notes", &backend);
        let params = FindParams::new().filter(doc! { "_id": "A" });

        assert_eq!(model.find(params.clone()).await.unwrap(), None);
        assert_eq!(params.filter, Some(doc! { "_id": "A" }));
        assert_eq!(
            backend.calls(),
            vec![Call::FindOne(FindOne {
                filter: Some(doc! { "_id": { "$oid": "A" } }),
                ..Default::default()
            })]
        );
    }

    #[tokio::test]
    async fn find_many_forwards_the_filter_untouched() {
        let backend = ScriptedBackend {
            rows: vec![doc! { "_id": "A" }],
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        let found = model
            .find_many(FindManyParams::new().filter(doc! { "_id": "A" }).limit(5))
            .await
            .unwrap();

        assert_eq!(found, vec![doc! { "_id": "A" }]);
        assert_eq!(
            backend.calls(),
            vec![Call::Find(Find {
                filter: Some(doc! { "_id": "A" }),
                limit: Some(5),
                ..Default::default()
            })]
        );
    }

    #[tokio::test]
    async fn create_reports_the_assigned_id() {
        let backend = ScriptedBackend::default();
        let model: Model<_> = Model::new("notes", &backend);

        let created = model.create(doc! { "title": "t" }).await.unwrap();

        assert_eq!(created.id, "new-id");
        assert_eq!(created.document, doc! { "title": "t" });
    }

    #[tokio::test]
    async fn delete_is_keyed_on_the_found_id_only() {
        let backend = ScriptedBackend {
            found: Some(doc! { "_id": "B", "status": "stale", "owner": "x" }),
            deleted: 1,
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        let deleted = model
            .delete(DeleteParams::new(doc! { "status": "stale" }))
            .await
            .unwrap();

        assert_eq!(deleted, Some(doc! { "_id": "B", "status": "stale", "owner": "x" }));
        assert_eq!(
            backend.calls()[1],
            Call::DeleteOne(DeleteOne {
                filter: doc! { "_id": { "$oid": "B" } },
                options: Document::new(),
            })
        );
    }

    #[tokio::test]
    async fn delete_without_a_match_never_deletes() {
        let backend = ScriptedBackend::default();
        let model: Model<_> = Model::new("notes", &backend);

        let deleted = model
            .delete(DeleteParams::new(doc! { "field": "missing" }))
            .await
            .unwrap();

        assert_eq!(deleted, None);
        assert!(backend
            .calls()
            .iter()
            .all(|call| !matches!(call, Call::DeleteOne(_))));
    }

    #[tokio::test]
    async fn delete_reports_nothing_when_the_store_deleted_nothing() {
        let backend = ScriptedBackend {
            found: Some(doc! { "_id": "B" }),
            deleted: 0,
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        assert_eq!(model.delete(DeleteParams::new(doc! { "_id": "B" })).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_rejects_a_found_document_without_id() {
        let backend = ScriptedBackend {
            found: Some(doc! { "title": "orphan" }),
            deleted: 1,
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        assert!(matches!(
            model.delete(DeleteParams::new(doc! { "title": "orphan" })).await,
            Err(DataApiError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn update_without_modification_skips_the_reread() {
        let backend = ScriptedBackend::default();
        let model: Model<_> = Model::new("notes", &backend);

        let updated = model
            .update(UpdateParams::new(doc! { "_id": "A" }, doc! { "x": 1 }).upsert(true))
            .await
            .unwrap();

        assert_eq!(updated, None);
        assert_eq!(
            backend.calls(),
            vec![Call::UpdateOne(UpdateOne {
                filter: doc! { "_id": { "$oid": "A" } },
                update: doc! { "$set": { "x": 1 } },
                upsert: Some(true),
                options: Document::new(),
            })]
        );
    }

    #[tokio::test]
    async fn update_rereads_with_the_same_filter() {
        let backend = ScriptedBackend {
            found: Some(doc! { "_id": "A", "x": 5 }),
            modified: 1,
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        let updated = model
            .update(UpdateParams::new(doc! { "_id": "A" }, doc! { "x": 5 }))
            .await
            .unwrap();

        assert_eq!(updated, Some(doc! { "_id": "A", "x": 5 }));
        assert_eq!(
            backend.calls()[1],
            Call::FindOne(FindOne {
                filter: Some(doc! { "_id": { "$oid": "A" } }),
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn count_on_empty_aggregation_is_an_error() {
        let backend = ScriptedBackend::default();
        let model: Model<_> = Model::new("notes", &backend);

        assert!(matches!(
            model.count().await,
            Err(DataApiError::UnexpectedEmptyResult(_))
        ));
    }

    #[tokio::test]
    async fn count_reads_the_count_row() {
        let backend = ScriptedBackend {
            rows: vec![doc! { "count": 3_i64 }],
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        assert_eq!(model.count().await.unwrap(), 3);
        assert_eq!(
            backend.calls(),
            vec![Call::Aggregate(Aggregate {
                pipeline: vec![doc! { "$count": "count" }],
                options: Document::new(),
            })]
        );
    }

    #[tokio::test]
    async fn count_where_prepends_a_wrapped_match() {
        let backend = ScriptedBackend {
            rows: vec![doc! { "count": 1 }],
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        assert_eq!(model.count_where(doc! { "_id": "A" }).await.unwrap(), 1);
        assert_eq!(
            backend.calls(),
            vec![Call::Aggregate(Aggregate {
                pipeline: vec![
                    doc! { "$match": { "_id": { "$oid": "A" } } },
                    doc! { "$count": "count" },
                ],
                options: Document::new(),
            })]
        );
    }

    #[tokio::test]
    async fn count_rejects_a_malformed_row() {
        let backend = ScriptedBackend {
            rows: vec![doc! { "total": 3 }],
            ..Default::default()
        };
        let model: Model<_> = Model::new("notes", &backend);

        assert!(matches!(
            model.count().await,
            Err(DataApiError::MalformedResponse(_))
        ));
    }
}
