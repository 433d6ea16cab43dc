//! Error types and result types for model operations.
//!
//! Every fallible operation in the workspace returns [`DataApiResult<T>`]. A document
//! that simply does not exist is never an error: lookups return `Ok(None)` instead.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a document Data API.
#[derive(Error, Debug)]
pub enum DataApiError {
    /// The remote store could not be reached, refused the credentials, or faulted.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// The remote store received a write and refused it.
    #[error("Write rejected: {0}")]
    WriteRejected(String),
    /// An identifier value could not be converted between its plain and tagged forms.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// A response the operation needs at least one row from came back empty.
    #[error("Unexpected empty result: {0}")]
    UnexpectedEmptyResult(String),
    /// The remote store answered with a body that does not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Conversion between a document shape and its BSON/JSON representation failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend construction or configuration loading.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for model and backend operations.
pub type DataApiResult<T> = Result<T, DataApiError>;

impl From<BsonError> for DataApiError {
    fn from(err: BsonError) -> Self {
        DataApiError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DataApiError {
    fn from(err: SerdeJsonError) -> Self {
        DataApiError::Serialization(err.to_string())
    }
}
