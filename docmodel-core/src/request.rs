//! Request and response shapes exchanged with a store backend.
//!
//! Each request mirrors one action of the remote Data API. Requests serialize to the
//! camelCase JSON bodies that API expects, with absent optional fields omitted and the
//! `options` catch-all flattened into the top level so store-specific parameters
//! travel verbatim.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Insert a single document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOne {
    pub document: Document,
}

/// Look up a single document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOne {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Document>,
    #[serde(flatten)]
    pub options: Document,
}

/// Look up every document matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Find {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(flatten)]
    pub options: Document,
}

/// Run an aggregation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub pipeline: Vec<Document>,
    #[serde(flatten)]
    pub options: Document,
}

/// Apply an update document to the first document matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOne {
    pub filter: Document,
    pub update: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<bool>,
    #[serde(flatten)]
    pub options: Document,
}

/// Delete the first document matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOne {
    pub filter: Document,
    #[serde(flatten)]
    pub options: Document,
}

/// Outcome of an [`InsertOne`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    /// Identifier assigned by the store, in whatever form the store reports it.
    pub inserted_id: Bson,
}

/// Outcome of an [`UpdateOne`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    #[serde(default)]
    pub matched_count: u64,
    #[serde(default)]
    pub modified_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<Bson>,
}

/// Outcome of a [`DeleteOne`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    #[serde(default)]
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn find_omits_absent_fields_and_flattens_options() {
        let request = Find {
            filter: Some(doc! { "status": "open" }),
            limit: Some(10),
            options: doc! { "hint": "status_1" },
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "filter": { "status": "open" }, "limit": 10, "hint": "status_1" })
        );
    }

    #[test]
    fn update_result_tolerates_missing_counts() {
        let result: UpdateResult = serde_json::from_value(json!({ "matchedCount": 1 })).unwrap();

        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 0);
        assert_eq!(result.upserted_id, None);
    }
}
