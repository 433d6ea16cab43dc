use async_trait::async_trait;
use docmodel::{
    backend::DataApiBackend,
    bson::Document,
    error::DataApiResult,
    memory::InMemoryStore,
    request::{
        Aggregate, DeleteOne, DeleteResult, Find, FindOne, InsertOne, InsertOneResult,
        UpdateOne, UpdateResult,
    },
};
use std::sync::Mutex;

/// One backend action as the model issued it.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Call {
    InsertOne(InsertOne),
    FindOne(FindOne),
    Find(Find),
    Aggregate(Aggregate),
    UpdateOne(UpdateOne),
    DeleteOne(DeleteOne),
}

/// In-memory backend that records every request before serving it.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub store: InMemoryStore,
    calls: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DataApiBackend for RecordingBackend {
    async fn insert_one(&self, request: InsertOne, collection: &str) -> DataApiResult<InsertOneResult> {
        self.record(Call::InsertOne(request.clone()));
        self.store.insert_one(request, collection).await
    }

    async fn find_one(&self, request: FindOne, collection: &str) -> DataApiResult<Option<Document>> {
        self.record(Call::FindOne(request.clone()));
        self.store.find_one(request, collection).await
    }

    async fn find(&self, request: Find, collection: &str) -> DataApiResult<Vec<Document>> {
        self.record(Call::Find(request.clone()));
        self.store.find(request, collection).await
    }

    async fn aggregate(&self, request: Aggregate, collection: &str) -> DataApiResult<Vec<Document>> {
        self.record(Call::Aggregate(request.clone()));
        self.store.aggregate(request, collection).await
    }

    async fn update_one(&self, request: UpdateOne, collection: &str) -> DataApiResult<UpdateResult> {
        self.record(Call::UpdateOne(request.clone()));
        self.store.update_one(request, collection).await
    }

    async fn delete_one(&self, request: DeleteOne, collection: &str) -> DataApiResult<DeleteResult> {
        self.record(Call::DeleteOne(request.clone()));
        self.store.delete_one(request, collection).await
    }
}
