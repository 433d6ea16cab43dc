//! Document shapes and their conversion to and from BSON.
//!
//! A model is parameterized by a document shape `D`: any serde type whose serialized
//! form is a map. The store's identifier lives in the `_id` field; shapes that want to
//! see it declare it themselves, shapes that don't simply ignore it.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{DataApiError, DataApiResult};

/// Marker trait for types a [`Model`](crate::model::Model) can read and write.
///
/// Implemented automatically for every eligible type.
pub trait DocumentShape: Serialize + DeserializeOwned + Send + Sync {}

impl<D> DocumentShape for D where D: Serialize + DeserializeOwned + Send + Sync {}

/// Extension trait converting document shapes to and from BSON documents.
pub trait DocumentExt: DocumentShape + Sized {
    /// Serializes this value into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the value does not serialize to a map.
    fn to_document(&self) -> DataApiResult<Document>;

    /// Deserializes a value from a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not fit the shape.
    fn from_document(document: Document) -> DataApiResult<Self>;
}

impl<D: DocumentShape> DocumentExt for D {
    fn to_document(&self) -> DataApiResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(DataApiError::Serialization(format!(
                "expected a document, got {other}"
            ))),
        }
    }

    fn from_document(document: Document) -> DataApiResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }
}

/// A document paired with the identifier the store assigned to it.
///
/// Serializes as the inner document with `_id` merged into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identified<D> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub document: D,
}

impl<D> Identified<D> {
    pub fn new(id: impl Into<String>, document: D) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }

    pub fn into_inner(self) -> D {
        self.document
    }
}
