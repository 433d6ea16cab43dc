use async_trait::async_trait;
use bson::Document;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

use docmodel_core::{
    backend::{DataApiBackend, DataApiBackendBuilder},
    error::{DataApiError, DataApiResult},
    request::{
        Aggregate, DeleteOne, DeleteResult, Find, FindOne, InsertOne, InsertOneResult,
        UpdateOne, UpdateResult,
    },
};

use crate::config::DataApiConfig;

/// Header carrying the Data API key on every request.
pub const API_KEY_HEADER: &str = "api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    InsertOne,
    FindOne,
    Find,
    Aggregate,
    UpdateOne,
    DeleteOne,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::InsertOne => "insertOne",
            Action::FindOne => "findOne",
            Action::Find => "find",
            Action::Aggregate => "aggregate",
            Action::UpdateOne => "updateOne",
            Action::DeleteOne => "deleteOne",
        }
    }

    fn is_write(self) -> bool {
        matches!(self, Action::InsertOne | Action::UpdateOne | Action::DeleteOne)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, R: Serialize> {
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    #[serde(flatten)]
    request: &'a R,
}

#[derive(Deserialize)]
struct FindOneResponse {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

/// Backend that forwards every action to a remote HTTP Data API.
///
/// Each action is a single `POST {base_url}/action/{action}` carrying the data source,
/// database and collection alongside the request body. Nothing is retried.
#[derive(Debug, Clone)]
pub struct DataApiStore {
    client: Client,
    config: DataApiConfig,
    timeout: Option<Duration>,
}

impl DataApiStore {
    pub fn new(client: Client, config: DataApiConfig) -> Self {
        let timeout = config.timeout();
        Self { client, config, timeout }
    }

    pub fn builder(base_url: &str, database: &str) -> DataApiStoreBuilder {
        DataApiStoreBuilder::new(base_url, database)
    }

    /// Builds a store with a fresh HTTP client honouring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DataApiError::Initialization`] if the configuration is invalid or the
    /// HTTP client cannot be created.
    pub fn from_config(config: DataApiConfig) -> DataApiResult<Self> {
        let timeout = config.timeout();
        Self::connect(config, timeout)
    }

    fn connect(config: DataApiConfig, timeout: Option<Duration>) -> DataApiResult<Self> {
        config.validate()?;

        let mut client = Client::builder();
        if let Some(timeout) = timeout {
            client = client.timeout(timeout);
        }

        Ok(Self {
            client: client
                .build()
                .map_err(|e| DataApiError::Initialization(e.to_string()))?,
            config,
            timeout,
        })
    }

    pub fn config(&self) -> &DataApiConfig {
        &self.config
    }

    /// Per-request timeout the HTTP client was built with.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn endpoint(&self, action: Action) -> String {
        format!(
            "{}/action/{}",
            self.config.base_url.trim_end_matches('/'),
            action.as_str()
        )
    }

    async fn post<R, T>(&self, action: Action, collection: &str, request: &R) -> DataApiResult<T>
    where
        R: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        debug!(action = action.as_str(), collection, "posting data api action");

        let response = self
            .client
            .post(self.endpoint(action))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&Envelope {
                data_source: &self.config.data_source,
                database: &self.config.database,
                collection,
                request,
            })
            .send()
            .await
            .map_err(|e| DataApiError::StoreUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<body unreadable: {e}>"));
            warn!(
                action = action.as_str(),
                collection,
                status = status.as_u16(),
                "data api action failed"
            );

            return Err(status_error(action, collection, status, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataApiError::MalformedResponse(format!("{}: {e}", action.as_str())))
    }
}

fn status_error(action: Action, collection: &str, status: StatusCode, body: String) -> DataApiError {
    let message = format!("{} on {collection} returned {status}: {body}", action.as_str());
    let refused = status.is_client_error()
        && status != StatusCode::UNAUTHORIZED
        && status != StatusCode::FORBIDDEN;

    if action.is_write() && refused {
        DataApiError::WriteRejected(message)
    } else {
        DataApiError::StoreUnavailable(message)
    }
}

#[async_trait]
impl DataApiBackend for DataApiStore {
    async fn insert_one(
        &self,
        request: InsertOne,
        collection: &str,
    ) -> DataApiResult<InsertOneResult> {
        self.post(Action::InsertOne, collection, &request).await
    }

    async fn find_one(
        &self,
        request: FindOne,
        collection: &str,
    ) -> DataApiResult<Option<Document>> {
        Ok(self
            .post::<_, FindOneResponse>(Action::FindOne, collection, &request)
            .await?
            .document)
    }

    async fn find(&self, request: Find, collection: &str) -> DataApiResult<Vec<Document>> {
        Ok(self
            .post::<_, DocumentsResponse>(Action::Find, collection, &request)
            .await?
            .documents)
    }

    async fn aggregate(
        &self,
        request: Aggregate,
        collection: &str,
    ) -> DataApiResult<Vec<Document>> {
        Ok(self
            .post::<_, DocumentsResponse>(Action::Aggregate, collection, &request)
            .await?
            .documents)
    }

    async fn update_one(
        &self,
        request: UpdateOne,
        collection: &str,
    ) -> DataApiResult<UpdateResult> {
        self.post(Action::UpdateOne, collection, &request).await
    }

    async fn delete_one(
        &self,
        request: DeleteOne,
        collection: &str,
    ) -> DataApiResult<DeleteResult> {
        self.post(Action::DeleteOne, collection, &request).await
    }
}

#[derive(Debug, Clone)]
pub struct DataApiStoreBuilder {
    config: DataApiConfig,
    timeout: Option<Duration>,
}

impl DataApiStoreBuilder {
    pub fn new(base_url: &str, database: &str) -> Self {
        Self {
            config: DataApiConfig::new(base_url, database),
            timeout: None,
        }
    }

    pub fn from_config(config: DataApiConfig) -> Self {
        Self { config, timeout: None }
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    pub fn data_source(mut self, data_source: impl Into<String>) -> Self {
        self.config.data_source = data_source.into();
        self
    }

    /// Sets the per-request timeout exactly, overriding the configured whole seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl DataApiBackendBuilder for DataApiStoreBuilder {
    type Backend = DataApiStore;

    async fn build(self) -> DataApiResult<Self::Backend> {
        let timeout = self.timeout.or_else(|| self.config.timeout());
        DataApiStore::connect(self.config, timeout)
    }
}
