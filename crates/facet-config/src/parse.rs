//! Configuration file parsing.
//!
//! Parses individual `.facet.toml` files into intermediate `RawConfig`
//! structures that preserve the optional nature of all fields before merging.

use std::{fs, path::Path};

use facet_query::{FacetOrder, Fuzzify, Logic};
use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
#[cfg(test)]
use toml::de::Error as TomlError;
use toml::{Table, Value as TomlValue};

use crate::{ConfigError, HttpMethod, SortOption};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
/// This mirrors the TOML schema exactly.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Nested-path prefixes (a single string or a list).
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub nested: Option<Vec<String>>,
    /// Backend connection section.
    pub backend: Option<RawBackendSettings>,
    /// Search behavior section.
    pub search: Option<RawSearchSettings>,
    /// Paging defaults section.
    pub paging: Option<RawPagingSettings>,
    /// Result projection and sort options section.
    pub results: Option<RawResultSettings>,
    /// Facet definitions, in display order.
    pub facet: Option<Vec<RawFacet>>,
    /// Baseline filters: name -> clause.
    pub predefined_filters: Option<Table>,
    /// Hierarchies: facet field -> tree.
    pub hierarchy: Option<Table>,
    /// Additional aggregation requests: name -> request body.
    pub extra_facets: Option<Table>,
}

/// Raw backend settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBackendSettings {
    /// Search endpoint URL.
    pub url: Option<String>,
    /// HTTP method used to submit queries.
    pub method: Option<HttpMethod>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Raw search settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchSettings {
    /// Operator joining free-text terms.
    pub default_operator: Option<Logic>,
    /// Free-text fuzzify policy.
    pub fuzzify: Option<Fuzzify>,
    /// Quiet period before free text triggers a search, in milliseconds.
    #[serde(alias = "freetext_submit_delay")]
    pub submit_delay_ms: Option<u64>,
    /// Whether to add a synthetic "undefined" bucket to facet counts.
    pub add_undefined: Option<bool>,
    /// Whether zero-count values are hidden for AND-mode facets.
    pub prune_zero_counts: Option<bool>,
    /// Whether share links carry the facet requests.
    pub include_facets_in_share_link: Option<bool>,
}

/// Raw paging settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPagingSettings {
    /// Default offset.
    pub from: Option<u64>,
    /// Default page size.
    pub size: Option<u64>,
}

/// Raw result settings.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawResultSettings {
    /// Stored fields to return (a single string or a list).
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub fields: Option<Vec<String>>,
    /// Partial-field projection, passed to the backend verbatim.
    pub partial_fields: Option<Table>,
    /// Sort choices offered to the user.
    pub sort_options: Option<Vec<SortOption>>,
}

/// Raw facet definition from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFacet {
    /// Dotted field path. Required; checked during merging.
    pub field: Option<String>,
    /// Label shown to users.
    pub display: Option<String>,
    /// Value order.
    pub order: Option<FacetOrder>,
    /// Number of buckets to request.
    pub size: Option<usize>,
    /// Values shown before the list is expanded.
    pub min_size: Option<usize>,
    /// Initial AND/OR mode for selections on this facet.
    pub operator: Option<Logic>,
}

/// Parses a configuration file from disk.
///
/// Returns a `RawConfig` with all fields as optionals, ready for merging.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
///
/// Useful for validating template content (tests only).
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// This is used during discovery to stop traversal at root configs.
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}

/// Converts a TOML value into the equivalent JSON value.
///
/// Datetimes have no JSON counterpart and become their string form.
pub fn toml_to_json(value: &TomlValue) -> serde_json::Value {
    match value {
        TomlValue::String(s) => serde_json::Value::String(s.clone()),
        TomlValue::Integer(i) => serde_json::Value::from(*i),
        TomlValue::Float(f) => serde_json::Number::from_f64(*f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        TomlValue::Boolean(b) => serde_json::Value::Bool(*b),
        TomlValue::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        TomlValue::Array(items) => serde_json::Value::Array(items.iter().map(toml_to_json).collect()),
        TomlValue::Table(table) => serde_json::Value::Object(table_to_json(table)),
    }
}

/// Converts a TOML table into a JSON object, preserving key order.
pub fn table_to_json(table: &Table) -> serde_json::Map<String, serde_json::Value> {
    table
        .iter()
        .map(|(k, v)| (k.clone(), toml_to_json(v)))
        .collect()
}
