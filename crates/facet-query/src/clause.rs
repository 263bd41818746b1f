//! Query clause tree.
//!
//! Represents the query half of a request document. The compiler builds these
//! bottom-up; [`Clause::to_value`] serializes a finished tree and
//! [`Clause::from_value`] reads one back from an externally supplied document.

use std::fmt;

use serde_json::{Map, Value};

use crate::Logic;

/// Parameters of a free-text `query_string` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryString {
    /// The (possibly fuzzified) query text.
    pub query: String,
    /// Field to search instead of the backend's default.
    pub default_field: Option<String>,
    /// How the backend combines the query's terms.
    pub default_operator: Option<Logic>,
}

/// A node of the query-document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Matches every record.
    MatchAll,

    /// Exact value match on a field.
    Term {
        /// Dotted field path.
        field: String,
        /// Value that must be present.
        value: String,
    },

    /// Matches records with no value for a field.
    Missing {
        /// Dotted field path.
        field: String,
    },

    /// Inclusive range on a field.
    Range {
        /// Dotted field path.
        field: String,
        /// Lower bound (inclusive).
        from: String,
        /// Upper bound (inclusive).
        to: String,
    },

    /// Free-text query.
    QueryString(QueryString),

    /// Boolean combination: all `must` clauses and, when present, at least one
    /// `should` clause.
    Bool {
        /// Clauses that must all match.
        must: Vec<Self>,
        /// Alternatives of which at least one must match.
        should: Vec<Self>,
    },

    /// Filter conjunction.
    And(Vec<Self>),

    /// Sub-query scoped to a nested object path.
    Nested {
        /// The nested path, also used as the scope name.
        path: String,
        /// Query evaluated inside each nested object.
        query: Box<Self>,
    },

    /// A scored query restricted by an unscored filter.
    Filtered {
        /// The primary, scoring query.
        query: Box<Self>,
        /// The restricting filter.
        filter: Box<Self>,
    },

    /// A clause kept verbatim, either supplied by configuration or not
    /// understood while parsing.
    Raw(Value),
}

impl Clause {
    /// Creates a term clause.
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a missing-value clause.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    /// Creates an inclusive range clause.
    pub fn range(field: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a `bool` clause with only `must` members.
    pub fn must(clauses: Vec<Self>) -> Self {
        Self::Bool {
            must: clauses,
            should: Vec::new(),
        }
    }

    /// Creates a `bool` clause with only `should` members.
    pub fn should(clauses: Vec<Self>) -> Self {
        Self::Bool {
            must: Vec::new(),
            should: clauses,
        }
    }

    /// Creates a nested clause scoped to `path`.
    pub fn nested(path: impl Into<String>, query: Self) -> Self {
        Self::Nested {
            path: path.into(),
            query: Box::new(query),
        }
    }

    /// Wraps `query` with a restricting `filter`.
    pub fn filtered(query: Self, filter: Self) -> Self {
        Self::Filtered {
            query: Box::new(query),
            filter: Box::new(filter),
        }
    }

    /// Creates a filter conjunction, flattening nested conjunctions.
    ///
    /// A single clause is returned unwrapped.
    pub fn and(clauses: Vec<Self>) -> Self {
        let mut flattened: Vec<Self> = clauses
            .into_iter()
            .flat_map(|c| match c {
                Self::And(inner) => inner,
                other => vec![other],
            })
            .collect();

        if flattened.len() == 1
            && let Some(only) = flattened.pop()
        {
            return only;
        }
        Self::And(flattened)
    }

    /// Serializes the clause into the backend's JSON shape.
    pub fn to_value(&self) -> Value {
        match self {
            Self::MatchAll => keyed("match_all", Value::Object(Map::new())),
            Self::Term { field, value } => {
                keyed("term", keyed(field, Value::String(value.clone())))
            }
            Self::Missing { field } => {
                keyed("missing", keyed("field", Value::String(field.clone())))
            }
            Self::Range { field, from, to } => {
                let mut bounds = Map::new();
                bounds.insert("from".into(), Value::String(from.clone()));
                bounds.insert("to".into(), Value::String(to.clone()));
                keyed("range", keyed(field, Value::Object(bounds)))
            }
            Self::QueryString(qs) => {
                let mut body = Map::new();
                body.insert("query".into(), Value::String(qs.query.clone()));
                if let Some(field) = &qs.default_field {
                    body.insert("default_field".into(), Value::String(field.clone()));
                }
                if let Some(op) = qs.default_operator {
                    body.insert("default_operator".into(), Value::String(op.as_str().into()));
                }
                keyed("query_string", Value::Object(body))
            }
            Self::Bool { must, should } => {
                let mut body = Map::new();
                if !must.is_empty() {
                    body.insert("must".into(), to_array(must));
                }
                if !should.is_empty() {
                    body.insert("should".into(), to_array(should));
                }
                keyed("bool", Value::Object(body))
            }
            Self::And(clauses) => keyed("and", to_array(clauses)),
            Self::Nested { path, query } => {
                let mut body = Map::new();
                body.insert("_scope".into(), Value::String(path.clone()));
                body.insert("path".into(), Value::String(path.clone()));
                body.insert("query".into(), query.to_value());
                keyed("nested", Value::Object(body))
            }
            Self::Filtered { query, filter } => {
                let mut body = Map::new();
                body.insert("query".into(), query.to_value());
                body.insert("filter".into(), filter.to_value());
                keyed("filtered", Value::Object(body))
            }
            Self::Raw(value) => value.clone(),
        }
    }

    /// Reads a clause from JSON.
    ///
    /// Never fails: shapes that are not recognized come back as [`Clause::Raw`]
    /// so callers can decide whether to skip them.
    pub fn from_value(value: &Value) -> Self {
        parse_clause(value).unwrap_or_else(|| Self::Raw(value.clone()))
    }

    /// Formats the clause as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::MatchAll => writeln!(f, "{prefix}MatchAll"),
            Self::Term { field, value } => writeln!(f, "{prefix}Term({field} = {value:?})"),
            Self::Missing { field } => writeln!(f, "{prefix}Missing({field})"),
            Self::Range { field, from, to } => {
                writeln!(f, "{prefix}Range({field}: {from:?} ..= {to:?})")
            }
            Self::QueryString(qs) => {
                write!(f, "{prefix}QueryString({:?}", qs.query)?;
                if let Some(field) = &qs.default_field {
                    write!(f, ", field={field}")?;
                }
                if let Some(op) = qs.default_operator {
                    write!(f, ", operator={op}")?;
                }
                writeln!(f, ")")
            }
            Self::Bool { must, should } => {
                writeln!(f, "{prefix}Bool")?;
                if !must.is_empty() {
                    writeln!(f, "{prefix}  must:")?;
                    for clause in must {
                        clause.fmt_tree(f, indent + 2)?;
                    }
                }
                if !should.is_empty() {
                    writeln!(f, "{prefix}  should:")?;
                    for clause in should {
                        clause.fmt_tree(f, indent + 2)?;
                    }
                }
                Ok(())
            }
            Self::And(clauses) => {
                writeln!(f, "{prefix}And")?;
                for clause in clauses {
                    clause.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Nested { path, query } => {
                writeln!(f, "{prefix}Nested({path})")?;
                query.fmt_tree(f, indent + 1)
            }
            Self::Filtered { query, filter } => {
                writeln!(f, "{prefix}Filtered")?;
                writeln!(f, "{prefix}  query:")?;
                query.fmt_tree(f, indent + 2)?;
                writeln!(f, "{prefix}  filter:")?;
                filter.fmt_tree(f, indent + 2)
            }
            Self::Raw(value) => writeln!(f, "{prefix}Raw({value})"),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// Builds a single-entry JSON object.
fn keyed(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Serializes a clause list as a JSON array.
fn to_array(clauses: &[Clause]) -> Value {
    Value::Array(clauses.iter().map(Clause::to_value).collect())
}

/// Returns the only entry of a single-entry object.
fn single_entry(value: &Value) -> Option<(&String, &Value)> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.iter().next()
}

/// Renders a JSON scalar as a selection value.
///
/// Backends echo numeric and boolean terms unquoted; selections are strings.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a `must`/`should` arm, which may be a single clause or an array.
fn clause_list(value: Option<&Value>) -> Vec<Clause> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(Clause::from_value).collect(),
        Some(single) => vec![Clause::from_value(single)],
    }
}

/// Recognizes one clause, or returns `None` for unfamiliar shapes.
fn parse_clause(value: &Value) -> Option<Clause> {
    let (kind, body) = single_entry(value)?;
    match kind.as_str() {
        "match_all" => Some(Clause::MatchAll),
        "term" => {
            let (field, term) = single_entry(body)?;
            Some(Clause::term(field.clone(), scalar_string(term)?))
        }
        "missing" => parse_missing(body.get("field")?),
        "range" => {
            let (field, bounds) = single_entry(body)?;
            let from = bounds.get("from").or_else(|| bounds.get("gte"))?;
            let to = bounds.get("to").or_else(|| bounds.get("lte"))?;
            Some(Clause::range(
                field.clone(),
                scalar_string(from)?,
                scalar_string(to)?,
            ))
        }
        "query_string" => {
            let query = body.get("query")?.as_str()?.to_string();
            let default_field = body
                .get("default_field")
                .and_then(Value::as_str)
                .map(String::from);
            let default_operator = body
                .get("default_operator")
                .and_then(Value::as_str)
                .and_then(|op| op.parse().ok());
            Some(Clause::QueryString(QueryString {
                query,
                default_field,
                default_operator,
            }))
        }
        "bool" => {
            let obj = body.as_object()?;
            if obj.keys().any(|k| k != "must" && k != "should") {
                return None;
            }
            Some(Clause::Bool {
                must: clause_list(obj.get("must")),
                should: clause_list(obj.get("should")),
            })
        }
        "and" => {
            let items = body
                .as_array()
                .or_else(|| body.get("filters").and_then(Value::as_array))?;
            Some(Clause::And(items.iter().map(Clause::from_value).collect()))
        }
        "nested" => {
            let path = body.get("path")?.as_str()?.to_string();
            let query = Clause::from_value(body.get("query")?);
            Some(Clause::nested(path, query))
        }
        "filtered" => {
            let query = body
                .get("query")
                .map_or(Clause::MatchAll, Clause::from_value);
            match body.get("filter") {
                Some(filter) => Some(Clause::filtered(query, Clause::from_value(filter))),
                None => Some(query),
            }
        }
        _ => None,
    }
}

/// Reads a `missing.field` entry, which may name one field or several.
fn parse_missing(field: &Value) -> Option<Clause> {
    match field {
        Value::String(name) => Some(Clause::missing(name.clone())),
        Value::Array(names) => {
            let clauses: Option<Vec<Clause>> = names
                .iter()
                .map(|n| n.as_str().map(Clause::missing))
                .collect();
            let clauses = clauses?;
            if clauses.is_empty() {
                return None;
            }
            Some(Clause::and(clauses))
        }
        _ => None,
    }
}
