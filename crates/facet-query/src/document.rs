//! Complete request documents.
//!
//! A [`QueryDocument`] is the query clause tree plus everything else the
//! backend needs: paging, sort, field projection and facet requests.

use serde_json::{Map, Value};

use crate::{Clause, SourceError};

/// A structured search request.
///
/// Immutable once produced by the compiler; a fresh one is built for every
/// search.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
    /// The query clause tree.
    pub query: Clause,
    /// Offset of the first hit, when not the default of zero.
    pub from: Option<u64>,
    /// Page size, when not the configured default.
    pub size: Option<u64>,
    /// Sort specifications, verbatim.
    pub sort: Vec<Value>,
    /// Restrict hits to these stored fields.
    pub fields: Option<Vec<String>>,
    /// Partial-field projection, verbatim.
    pub partial_fields: Option<Value>,
    /// Facet requests keyed by facet name.
    pub facets: Map<String, Value>,
}

impl QueryDocument {
    /// Creates a document with the given query and nothing else set.
    pub fn new(query: Clause) -> Self {
        Self {
            query,
            from: None,
            size: None,
            sort: Vec::new(),
            fields: None,
            partial_fields: None,
            facets: Map::new(),
        }
    }

    /// Serializes the full document, facets included.
    pub fn to_value(&self) -> Value {
        let mut doc = self.base_object();
        doc.insert("facets".into(), Value::Object(self.facets.clone()));
        Value::Object(doc)
    }

    /// Serializes the full document as compact JSON.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Serializes the document for a share link.
    ///
    /// Facet requests are only carried along when `include_facets` is set; they
    /// are recomputed from configuration when the link is opened.
    pub fn share_source(&self, include_facets: bool) -> String {
        if include_facets {
            return self.to_json();
        }
        Value::Object(self.base_object()).to_string()
    }

    /// Parses a document from JSON text.
    pub fn parse(source: &str) -> Result<Self, SourceError> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(&value)
    }

    /// Reads a document from JSON.
    ///
    /// Lenient: a missing query means "match everything", and paging values
    /// that cannot be read are dropped.
    pub fn from_value(value: &Value) -> Result<Self, SourceError> {
        let Some(obj) = value.as_object() else {
            return Err(SourceError::NotAnObject {
                found: json_kind(value),
            });
        };

        let query = obj.get("query").map_or(Clause::MatchAll, Clause::from_value);
        let sort = match obj.get("sort") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single.clone()],
        };
        let fields = obj.get("fields").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        });
        let facets = obj
            .get("facets")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            query,
            from: obj.get("from").and_then(read_u64),
            size: obj.get("size").and_then(read_u64),
            sort,
            fields,
            partial_fields: obj.get("partial_fields").cloned(),
            facets,
        })
    }

    /// Builds every top-level entry except `facets`.
    fn base_object(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("query".into(), self.query.to_value());
        if let Some(from) = self.from {
            doc.insert("from".into(), Value::from(from));
        }
        if let Some(size) = self.size {
            doc.insert("size".into(), Value::from(size));
        }
        if !self.sort.is_empty() {
            doc.insert("sort".into(), Value::Array(self.sort.clone()));
        }
        if let Some(fields) = &self.fields {
            doc.insert(
                "fields".into(),
                Value::Array(fields.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(partial) = &self.partial_fields {
            doc.insert("partial_fields".into(), partial.clone());
        }
        doc
    }
}

/// Reads a non-negative integer that may have been written as a string.
fn read_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Names the kind of a JSON value for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
