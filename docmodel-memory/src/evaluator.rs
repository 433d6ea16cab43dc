//! Filter, sort, projection and update evaluation for in-memory documents.
//!
//! Filters use the store's query language: `{ field: value }` equality,
//! `{ field: { "$op": operand } }` comparisons, `$and`/`$or`/`$nor` combinators and
//! tagged identifiers (`{ "_id": { "$oid": "..." } }`). Dotted paths reach into
//! embedded documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docmodel_core::error::{DataApiError, DataApiResult};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 for comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null or missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Native object id
    ObjectId(ObjectId),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> From<Option<&'a Bson>> for Comparable<'a> {
    fn from(bson: Option<&'a Bson>) -> Self {
        bson.map(Comparable::from).unwrap_or(Comparable::Null)
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl<'a> Comparable<'a> {
    /// Total order used for sorting: missing and null values sort first.
    fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Ordering::Equal,
            (Comparable::Null, _) => Ordering::Less,
            (_, Comparable::Null) => Ordering::Greater,
            _ => self.partial_cmp(other).unwrap_or(Ordering::Equal),
        }
    }

    /// Equality with array fields matching on any element.
    fn matches(&self, operand: &Comparable<'_>) -> bool {
        self == operand
            || match self {
                Comparable::Array(items) => items.iter().any(|item| item == operand),
                _ => false,
            }
    }
}

fn unsupported(what: &str) -> DataApiError {
    DataApiError::StoreUnavailable(format!("unsupported {what}"))
}

/// Resolves a possibly dotted field path inside a document.
pub(crate) fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

fn is_operator_document(value: &Bson) -> bool {
    match value {
        Bson::Document(doc) => doc.keys().next().is_some_and(|key| key.starts_with('$')),
        _ => false,
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns whether the document satisfies every condition of `filter`.
    pub fn evaluate(&self, filter: &Document) -> DataApiResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.all(condition)?,
                "$or" => self.any(condition)?,
                "$nor" => !self.any(condition)?,
                other if other.starts_with('$') => return Err(unsupported(&format!("filter operator {other}"))),
                field => self.evaluate_field(field, condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> DataApiResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn subfilters(condition: &Bson) -> DataApiResult<Vec<&Document>> {
        condition
            .as_array()
            .ok_or_else(|| unsupported("logical operand (expected an array)"))?
            .iter()
            .map(|item| item.as_document().ok_or_else(|| unsupported("logical operand (expected documents)")))
            .collect()
    }

    fn all(&self, condition: &Bson) -> DataApiResult<bool> {
        for filter in Self::subfilters(condition)? {
            if !self.evaluate(filter)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn any(&self, condition: &Bson) -> DataApiResult<bool> {
        for filter in Self::subfilters(condition)? {
            if self.evaluate(filter)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn evaluate_field(&self, field: &str, condition: &Bson) -> DataApiResult<bool> {
        let value = get_path(self.document, field);

        match condition {
            Bson::Document(operators) if is_operator_document(condition) => {
                for (op, operand) in operators {
                    if !self.evaluate_operator(field, value, op, operand)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            },
            _ => Ok(Comparable::from(value).matches(&Comparable::from(condition))),
        }
    }

    fn evaluate_operator(
        &self,
        field: &str,
        value: Option<&Bson>,
        op: &str,
        operand: &Bson,
    ) -> DataApiResult<bool> {
        let left = Comparable::from(value);

        match op {
            // Tagged identifier: matches the plain or native form of the same id.
            "$oid" => Ok(match (value, operand) {
                (Some(Bson::String(id)), Bson::String(oid)) => id == oid,
                (Some(Bson::ObjectId(id)), Bson::String(oid)) => &id.to_hex() == oid,
                _ => false,
            }),
            "$eq" => Ok(left.matches(&Comparable::from(operand))),
            "$ne" => Ok(!left.matches(&Comparable::from(operand))),
            "$gt" | "$gte" | "$lt" | "$lte" => {
                match left.partial_cmp(&Comparable::from(operand)) {
                    Some(ordering) => Ok(match op {
                        "$gt" => ordering == Ordering::Greater,
                        "$gte" => ordering != Ordering::Less,
                        "$lt" => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    }),
                    None => Ok(false),
                }
            },
            "$in" | "$nin" => {
                let candidates = operand
                    .as_array()
                    .ok_or_else(|| unsupported(&format!("{op} operand (expected an array)")))?;
                let found = candidates
                    .iter()
                    .any(|candidate| left.matches(&Comparable::from(candidate)));

                Ok(if op == "$in" { found } else { !found })
            },
            "$exists" => Ok(value.is_some() == truthy(operand)),
            "$not" => Ok(!self.evaluate_field(field, operand)?),
            other => Err(unsupported(&format!("filter operator {other}"))),
        }
    }
}

/// Sorts documents in place by a `{ field: 1 | -1, ... }` sort document.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let left = Comparable::from(get_path(a, field));
            let right = Comparable::from(get_path(b, field));
            let ordering = match direction {
                Bson::Int32(n) if *n < 0 => right.sort_cmp(&left),
                Bson::Int64(n) if *n < 0 => right.sort_cmp(&left),
                Bson::Double(n) if *n < 0.0 => right.sort_cmp(&left),
                _ => left.sort_cmp(&right),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });
}

/// Applies an inclusion or exclusion projection to a document.
///
/// A projection naming any field other than `_id` with a truthy value is an inclusion
/// projection; `_id` is kept unless explicitly excluded.
pub(crate) fn project_document(document: Document, projection: &Document) -> Document {
    let inclusive = projection
        .iter()
        .any(|(field, flag)| field != "_id" && truthy(flag));
    let keep_id = projection.get("_id").is_none_or(truthy);

    if inclusive {
        document
            .into_iter()
            .filter(|(field, _)| {
                if field == "_id" {
                    keep_id
                } else {
                    projection.get(field).is_some_and(truthy)
                }
            })
            .collect()
    } else {
        document
            .into_iter()
            .filter(|(field, _)| {
                if field == "_id" {
                    keep_id
                } else {
                    projection.get(field).is_none_or(truthy)
                }
            })
            .collect()
    }
}

fn add_numbers(field: &str, current: Option<&Bson>, delta: &Bson) -> DataApiResult<Bson> {
    let overflow = || DataApiError::WriteRejected(format!("incrementing {field} by {delta} overflows"));

    Ok(match (current.unwrap_or(&Bson::Int32(0)), delta) {
        (Bson::Int32(a), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(*a as i64 + *b as i64),
        },
        (Bson::Int32(a), Bson::Int64(b)) => Bson::Int64((*a as i64).checked_add(*b).ok_or_else(overflow)?),
        (Bson::Int64(a), Bson::Int32(b)) => Bson::Int64(a.checked_add(*b as i64).ok_or_else(overflow)?),
        (Bson::Int64(a), Bson::Int64(b)) => Bson::Int64(a.checked_add(*b).ok_or_else(overflow)?),
        (Bson::Double(a), Bson::Double(b)) => Bson::Double(a + b),
        (Bson::Double(a), Bson::Int32(b)) => Bson::Double(a + *b as f64),
        (Bson::Double(a), Bson::Int64(b)) => Bson::Double(a + *b as f64),
        (Bson::Int32(a), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        (Bson::Int64(a), Bson::Double(b)) => Bson::Double(*a as f64 + b),
        _ => {
            return Err(DataApiError::WriteRejected(format!(
                "cannot increment {field} by {delta}"
            )));
        },
    })
}

/// Writes `value` at a dotted `path`, creating missing embedded documents on the way.
fn set_path(document: &mut Document, path: &str, value: Bson) -> DataApiResult<()> {
    let Some((head, rest)) = path.split_once('.') else {
        document.insert(path, value);
        return Ok(());
    };

    if !document.contains_key(head) {
        document.insert(head, Document::new());
    }

    match document.get_mut(head) {
        Some(Bson::Document(inner)) => set_path(inner, rest, value),
        _ => Err(DataApiError::WriteRejected(format!(
            "cannot create field {rest} in non-document field {head}"
        ))),
    }
}

fn remove_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        },
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                remove_path(inner, rest);
            }
        },
    }
}

/// Applies a `$set` / `$unset` / `$inc` update document to `document` in place.
///
/// Field names may be dotted paths into embedded documents.
///
/// # Errors
///
/// Returns [`DataApiError::WriteRejected`] for replacement documents, unknown operators,
/// non-numeric or overflowing increments, and paths running through non-documents.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> DataApiResult<()> {
    for (op, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| DataApiError::WriteRejected(format!("{op} expects a document")))?;

        match op.as_str() {
            "$set" => {
                for (field, value) in fields {
                    set_path(document, field, value.clone())?;
                }
            },
            "$unset" => {
                for (field, _) in fields {
                    remove_path(document, field);
                }
            },
            "$inc" => {
                for (field, delta) in fields {
                    let sum = add_numbers(field, get_path(document, field), delta)?;
                    set_path(document, field, sum)?;
                }
            },
            other => {
                return Err(DataApiError::WriteRejected(format!(
                    "unsupported update operator {other}"
                )));
            },
        }
    }

    Ok(())
}

/// Builds the seed of an upserted document from the equality conditions of a filter.
pub(crate) fn upsert_seed(filter: &Document) -> Document {
    filter
        .iter()
        .filter(|(field, _)| !field.starts_with('$') && !field.contains('.'))
        .filter_map(|(field, condition)| match condition {
            Bson::Document(operators) if is_operator_document(condition) => {
                match (operators.get("$oid"), operators.get("$eq")) {
                    (Some(oid), _) => Some((field.clone(), oid.clone())),
                    (None, Some(value)) => Some((field.clone(), value.clone())),
                    _ => None,
                }
            },
            value => Some((field.clone(), value.clone())),
        })
        .collect()
}
