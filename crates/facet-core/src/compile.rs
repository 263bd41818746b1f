//! Query compilation.
//!
//! Turns a [`QueryState`] and the static [`Config`] into the [`QueryDocument`]
//! sent to the backend.
//!
//! # Shape
//!
//! ```text
//! filtered
//! ├── query: bool.must
//! │   ├── term           one per AND-mode selection
//! │   ├── range          one per range selection
//! │   ├── <predefined>   every predefined filter
//! │   ├── query_string   fuzzified free text
//! │   └── nested         one per nested prefix, holding that prefix's clauses
//! └── filter: and
//!     ├── bool.should    one per OR-mode key (term / missing members)
//!     └── missing        one per AND-mode "undefined" selection
//! ```
//!
//! Empty parts are left out: no filter means no `filtered` wrapper, a lone
//! `query_string` is emitted bare, and an empty `must` becomes `match_all`.

use facet_config::Config;
use facet_query::{Clause, Logic, QueryDocument, QueryString, fuzzify};
use serde_json::{Map, Value};
use tracing::debug;

use crate::state::{FilterSelection, QueryState, SelectionValue};

/// Compiles selection state into query documents.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    /// Static configuration.
    config: &'a Config,
}

/// Clauses collected for one nested prefix.
struct NestedScope {
    /// The prefix.
    path: String,
    /// Clauses inside the wrapper.
    clauses: Vec<Clause>,
}

/// Clause lists gathered while walking the state.
#[derive(Default)]
struct Parts {
    /// Top-level `must` members.
    must: Vec<Clause>,
    /// Filter-half constraints.
    filters: Vec<Clause>,
    /// One scope per nested prefix, in first-use order.
    nested: Vec<NestedScope>,
}

impl Parts {
    /// Adds a clause inside the wrapper for `prefix`, creating it on first use.
    fn push_nested(&mut self, prefix: &str, clause: Clause) {
        if let Some(scope) = self.nested.iter_mut().find(|s| s.path == prefix) {
            scope.clauses.push(clause);
        } else {
            self.nested.push(NestedScope {
                path: prefix.to_string(),
                clauses: vec![clause],
            });
        }
    }
}

impl<'a> QueryCompiler<'a> {
    /// Creates a compiler over `config`.
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Compiles `state` into a complete request document.
    ///
    /// The output depends only on its inputs.
    pub fn compile(&self, state: &QueryState) -> QueryDocument {
        let mut parts = Parts::default();

        self.compile_selections(state, &mut parts);
        self.compile_ranges(state, &mut parts);
        self.compile_predefined(&mut parts);

        if let Some(query_string) = self.free_text_clause(state) {
            parts.must.push(query_string);
        }
        let Parts {
            mut must,
            filters,
            nested,
        } = parts;
        must.extend(
            nested
                .into_iter()
                .map(|scope| Clause::nested(scope.path, Clause::must(scope.clauses))),
        );

        let query = match must.len() {
            0 => Clause::MatchAll,
            1 if matches!(must[0], Clause::QueryString(_)) => must.remove(0),
            _ => Clause::must(must),
        };
        let query = if filters.is_empty() {
            query
        } else {
            Clause::filtered(query, Clause::and(filters))
        };

        let mut doc = QueryDocument::new(query);
        if state.paging.from != 0 {
            doc.from = Some(state.paging.from);
        }
        if state.paging.size != self.config.paging.size {
            doc.size = Some(state.paging.size);
        }
        doc.sort = state.sort.iter().map(|s| s.to_value()).collect();
        doc.fields.clone_from(&self.config.results.fields);
        doc.partial_fields.clone_from(&self.config.results.partial_fields);
        doc.facets = self.facet_requests(&doc.query);

        debug!(
            selections = state.selections.len(),
            ranges = state.ranges.len(),
            "compiled query"
        );
        doc
    }

    /// Places every discrete selection.
    fn compile_selections(&self, state: &QueryState, parts: &mut Parts) {
        let mut seen_or: Vec<&str> = Vec::new();

        for selection in &state.selections {
            let key = selection.key.as_str();
            let prefix = self.config.nested_prefix(key);

            match selection.logic {
                Logic::And => {
                    let clause = value_clause(selection);
                    match (prefix, &selection.value) {
                        (Some(prefix), _) => parts.push_nested(prefix, clause),
                        (None, SelectionValue::Undefined) => parts.filters.push(clause),
                        (None, SelectionValue::Term(_)) => parts.must.push(clause),
                    }
                }
                Logic::Or => {
                    if seen_or.contains(&key) {
                        continue;
                    }
                    seen_or.push(key);
                    let members = state
                        .selections_for(key)
                        .filter(|s| s.logic == Logic::Or)
                        .map(value_clause)
                        .collect();
                    let group = Clause::should(members);
                    match prefix {
                        Some(prefix) => parts.push_nested(prefix, group),
                        None => parts.filters.push(group),
                    }
                }
            }
        }
    }

    /// Places every range selection on its facet's field.
    fn compile_ranges(&self, state: &QueryState, parts: &mut Parts) {
        for range in &state.ranges {
            let Some(facet) = self.config.facets.get(range.facet) else {
                debug!(facet = range.facet, "skipping range on unknown facet");
                continue;
            };
            let clause = Clause::range(&facet.field, &range.low, &range.high);
            match self.config.nested_prefix(&facet.field) {
                Some(prefix) => parts.push_nested(prefix, clause),
                None => parts.must.push(clause),
            }
        }
    }

    /// Adds every predefined filter, nesting by the filter's name.
    fn compile_predefined(&self, parts: &mut Parts) {
        for (name, filter) in &self.config.predefined_filters {
            let clause = Clause::Raw(filter.clone());
            match self.config.nested_prefix(name) {
                Some(prefix) => parts.push_nested(prefix, clause),
                None => parts.must.push(clause),
            }
        }
    }

    /// Builds the `query_string` clause, if there is free text.
    fn free_text_clause(&self, state: &QueryState) -> Option<Clause> {
        if state.free_text.trim().is_empty() {
            return None;
        }
        Some(Clause::QueryString(QueryString {
            query: fuzzify(&state.free_text, self.config.search.fuzzify),
            default_field: state.search_field.clone(),
            default_operator: Some(self.config.search.default_operator),
        }))
    }

    /// Builds the facet requests, then merges in the extra facets.
    fn facet_requests(&self, query: &Clause) -> Map<String, Value> {
        let mut facets = Map::new();
        for facet in &self.config.facets {
            let mut terms = Map::new();
            terms.insert("field".into(), Value::from(facet.field.as_str()));
            terms.insert("order".into(), Value::from(facet.order.as_str()));
            if let Some(size) = facet.size {
                terms.insert("size".into(), Value::from(size));
            }

            let mut request = Map::new();
            request.insert("terms".into(), Value::Object(terms));
            if let Some(prefix) = self.config.nested_prefix(&facet.field) {
                let tag = if has_nested_scope(query, prefix) {
                    "scope"
                } else {
                    "nested"
                };
                request.insert(tag.into(), Value::from(prefix));
            }
            facets.insert(facet.field.clone(), Value::Object(request));
        }

        for (name, extra) in &self.config.extra_facets {
            match facets.get_mut(name) {
                Some(existing) => deep_merge(existing, extra),
                None => {
                    facets.insert(name.clone(), extra.clone());
                }
            }
        }
        facets
    }
}

/// Builds the term or missing clause for one selection.
fn value_clause(selection: &FilterSelection) -> Clause {
    match &selection.value {
        SelectionValue::Term(value) => Clause::term(&selection.key, value),
        SelectionValue::Undefined => Clause::missing(&selection.key),
    }
}

/// True when the query contains a nested wrapper for `prefix`.
fn has_nested_scope(query: &Clause, prefix: &str) -> bool {
    match query {
        Clause::Nested { path, .. } => path == prefix,
        Clause::Bool { must, should } => must
            .iter()
            .chain(should)
            .any(|c| has_nested_scope(c, prefix)),
        Clause::Filtered { query, .. } => has_nested_scope(query, prefix),
        _ => false,
    }
}

/// Merges `source` into `target`, recursing into objects.
fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
