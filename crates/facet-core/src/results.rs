//! Backend responses and their reduction.
//!
//! The backend answers with `{hits: {total, hits: [...]}, facets: {...}}`.
//! [`ResultReducer`] turns that into records, per-facet raw counts and
//! pagination metadata.

use std::collections::BTreeMap;

use facet_config::Config;
use facet_query::scalar_string;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::Paging;

/// Raw search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawResponse {
    /// Matching records.
    pub hits: RawHits,
    /// Term counts per requested facet.
    pub facets: Map<String, Value>,
}

/// The `hits` section of a response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawHits {
    /// Total number of matches.
    pub total: RawTotal,
    /// The current page of matches.
    pub hits: Vec<RawHit>,
}

/// Total match count, either a bare number or `{"value": n}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTotal {
    /// Bare count.
    Count(u64),
    /// Count object.
    Object {
        /// The count.
        value: u64,
    },
}

impl Default for RawTotal {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl RawTotal {
    /// Returns the count.
    pub fn value(&self) -> u64 {
        match self {
            Self::Count(n) | Self::Object { value: n } => *n,
        }
    }
}

/// One match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawHit {
    /// The stored document.
    #[serde(rename = "_source")]
    pub source: Option<Value>,
    /// Projected fields.
    pub fields: Option<Map<String, Value>>,
}

/// Terms facet output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawTermsFacet {
    /// Buckets in backend order.
    terms: Vec<RawTerm>,
    /// Records with no value.
    missing: u64,
}

/// One bucket.
#[derive(Debug, Clone, Deserialize)]
struct RawTerm {
    /// Bucket value; numbers and booleans are stringified.
    term: Value,
    /// Bucket size.
    count: u64,
}

/// Raw counts for one facet, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
    /// `(value, count)` pairs.
    pub terms: Vec<(String, u64)>,
    /// Records with no value for the field.
    pub missing: u64,
}

impl FacetCounts {
    /// Looks up the count for a value.
    pub fn count(&self, value: &str) -> Option<u64> {
        self.terms.iter().find(|(v, _)| v == value).map(|(_, c)| *c)
    }
}

/// Pagination metadata for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Offset of the first record.
    pub from: u64,
    /// Records per page.
    pub size: u64,
    /// Total matches.
    pub found: u64,
    /// One-based number of the first record on the page.
    pub start: u64,
    /// Number of the last record on the page.
    pub end: u64,
    /// Whether an earlier page exists.
    pub has_previous: bool,
    /// Whether a later page exists.
    pub has_next: bool,
}

impl Pagination {
    /// Computes pagination for `found` matches viewed at `paging`.
    ///
    /// A page size of zero has no next page.
    pub fn new(paging: Paging, found: u64) -> Self {
        let end = paging.from.saturating_add(paging.size).min(found);
        Self {
            from: paging.from,
            size: paging.size,
            found,
            start: paging.from + 1,
            end,
            has_previous: paging.from > 0,
            has_next: paging.size > 0 && paging.from.saturating_add(paging.size) < found,
        }
    }

    /// Offset of the previous page, if any.
    pub fn previous_from(&self) -> Option<u64> {
        self.has_previous
            .then(|| self.from.saturating_sub(self.size))
    }

    /// Offset of the next page, if any.
    pub fn next_from(&self) -> Option<u64> {
        self.has_next.then(|| self.from + self.size)
    }
}

/// A reduced search response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Records on this page.
    pub records: Vec<Value>,
    /// Total matches.
    pub found: u64,
    /// Page position.
    pub pagination: Pagination,
    /// Raw counts per facet name.
    pub facets: BTreeMap<String, FacetCounts>,
}

/// Reduces raw responses.
#[derive(Debug, Clone, Copy)]
pub struct ResultReducer<'a> {
    /// Static configuration.
    config: &'a Config,
}

impl<'a> ResultReducer<'a> {
    /// Creates a reducer over `config`.
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Reduces a response fetched at `paging`.
    pub fn reduce(&self, response: &RawResponse, paging: Paging) -> SearchResults {
        let records = response
            .hits
            .hits
            .iter()
            .map(|hit| self.record(hit))
            .collect();
        let found = response.hits.total.value();

        let facets = response
            .facets
            .iter()
            .filter_map(|(name, raw)| Some((name.clone(), Self::facet_counts(raw)?)))
            .collect();

        SearchResults {
            records,
            found,
            pagination: Pagination::new(paging, found),
            facets,
        }
    }

    /// Extracts one record according to the projection mode.
    ///
    /// `fields` wins over `partial_fields` when both are configured.
    fn record(&self, hit: &RawHit) -> Value {
        let results = &self.config.results;
        if results.fields.is_some() {
            return hit.fields.clone().map_or(Value::Null, Value::Object);
        }
        if let Some(partial) = results.partial_fields.as_ref().and_then(Value::as_object) {
            let Some(first) = partial.keys().next() else {
                return Value::Null;
            };
            return hit
                .fields
                .as_ref()
                .and_then(|f| f.get(first))
                .cloned()
                .unwrap_or(Value::Null);
        }
        hit.source.clone().unwrap_or(Value::Null)
    }

    /// Reads the counts of a terms facet; other facet kinds yield `None`.
    fn facet_counts(raw: &Value) -> Option<FacetCounts> {
        raw.get("terms")?;
        let raw: RawTermsFacet = serde_json::from_value(raw.clone()).ok()?;
        let terms = raw
            .terms
            .iter()
            .filter_map(|t| Some((scalar_string(&t.term)?, t.count)))
            .collect();
        Some(FacetCounts {
            terms,
            missing: raw.missing,
        })
    }
}
