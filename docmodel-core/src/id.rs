//! Conversion between plain and tagged document identifiers.
//!
//! Callers only ever deal with identifiers as plain strings. The remote store expects
//! identifiers inside request filters in their tagged form, a one-field document
//! `{ "$oid": "<id>" }`. Read paths already come back plain and are never re-wrapped.
//!
//! ```ignore
//! use docmodel_core::id::IdCodec;
//!
//! let tagged = IdCodec::to_internal("65f1c0ffee");
//! assert_eq!(IdCodec::to_external(tagged), "65f1c0ffee");
//! ```

use bson::{Bson, Document};

use crate::error::{DataApiError, DataApiResult};

/// An identifier in the store's tagged representation.
///
/// A `TaggedId` can only be built from a plain identifier or parsed from a well-formed
/// tagged value, so unwrapping it is infallible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaggedId {
    oid: String,
}

impl TaggedId {
    /// Returns the plain identifier carried by the tag.
    pub fn as_str(&self) -> &str {
        &self.oid
    }

    /// Builds the `{ "$oid": ... }` wrapper sent to the store.
    pub fn to_bson(&self) -> Bson {
        let mut wrapper = Document::new();
        wrapper.insert(IdCodec::TAG, self.oid.as_str());

        Bson::Document(wrapper)
    }

    /// Parses a raw store value into a tagged identifier.
    ///
    /// Accepts the `{ "$oid": "<id>" }` wrapper and native BSON object ids.
    ///
    /// # Errors
    ///
    /// Returns [`DataApiError::InvalidIdentifier`] when the value is anything else,
    /// including wrappers with extra fields or a non-string payload.
    pub fn from_bson(value: &Bson) -> DataApiResult<Self> {
        match value {
            Bson::ObjectId(oid) => Ok(Self { oid: oid.to_hex() }),
            Bson::Document(wrapper) if wrapper.len() == 1 => match wrapper.get(IdCodec::TAG) {
                Some(Bson::String(oid)) => Ok(Self { oid: oid.clone() }),
                _ => Err(DataApiError::InvalidIdentifier(format!(
                    "expected a single {} string field, got {wrapper}",
                    IdCodec::TAG,
                ))),
            },
            other => Err(DataApiError::InvalidIdentifier(format!(
                "expected a tagged identifier, got {other}"
            ))),
        }
    }
}

impl From<TaggedId> for Bson {
    fn from(id: TaggedId) -> Self {
        id.to_bson()
    }
}

/// Converts identifiers and identifier-bearing filters between external and store forms.
pub struct IdCodec;

impl IdCodec {
    /// Name of the distinguished identifier field.
    pub const FIELD: &'static str = "_id";
    /// Key of the one-field wrapper used for tagged identifiers.
    pub const TAG: &'static str = "$oid";

    /// Wraps a plain identifier into its tagged form.
    pub fn to_internal(id: impl Into<String>) -> TaggedId {
        TaggedId { oid: id.into() }
    }

    /// Unwraps a tagged identifier back into its plain form.
    pub fn to_external(tagged: TaggedId) -> String {
        tagged.oid
    }

    /// Reads an identifier the store handed back, in whatever form it arrived.
    ///
    /// Plain strings are returned as-is; tagged wrappers and object ids are unwrapped.
    pub fn read_external(value: &Bson) -> DataApiResult<String> {
        match value {
            Bson::String(id) => Ok(id.clone()),
            other => TaggedId::from_bson(other).map(Self::to_external),
        }
    }

    /// Returns a copy of `filter` whose identifier condition is in tagged form.
    ///
    /// Only a non-empty plain string condition is wrapped. Operator documents,
    /// already-tagged values and object ids pass through unchanged, as does a filter
    /// without an identifier condition. Numeric and other non-string scalar identifiers
    /// are left unwrapped on purpose: the tagged form only carries strings. The input is
    /// never modified.
    pub fn wrap_filter(filter: &Document) -> Document {
        let mut wrapped = filter.clone();

        if let Some(Bson::String(id)) = filter.get(Self::FIELD) {
            if !id.is_empty() {
                wrapped.insert(Self::FIELD, Self::to_internal(id.as_str()).to_bson());
            }
        }

        wrapped
    }

    /// Returns a copy of `filter` whose tagged identifier condition is back in plain form.
    ///
    /// # Errors
    ///
    /// Returns [`DataApiError::InvalidIdentifier`] when the identifier condition carries
    /// the tag but is not a well-formed wrapper.
    pub fn unwrap_filter(filter: &Document) -> DataApiResult<Document> {
        let mut unwrapped = filter.clone();

        if let Some(value @ Bson::Document(wrapper)) = filter.get(Self::FIELD) {
            if wrapper.contains_key(Self::TAG) {
                unwrapped.insert(Self::FIELD, Self::to_external(TaggedId::from_bson(value)?));
            }
        }

        Ok(unwrapped)
    }

    /// Builds a filter that selects exactly one document by its plain identifier.
    pub fn id_filter(id: impl Into<String>) -> Document {
        let mut filter = Document::new();
        filter.insert(Self::FIELD, Self::to_internal(id).to_bson());

        filter
    }
}
