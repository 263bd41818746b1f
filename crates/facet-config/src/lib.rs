//! Configuration system for facet.
//!
//! facet uses TOML configuration files named `.facet.toml`. Configuration is resolved by walking
//! up the directory tree from the current working directory, collecting any `.facet.toml` files
//! found, then loading `~/.facet.toml` as the global config with lowest precedence.
//!
//! The resolved [`Config`] is the read-only description of one search interface: which facets
//! exist and how they sort, which field prefixes are nested, the baseline filters every search
//! carries, optional hierarchies over facet values, and where the backend lives.

#![warn(missing_docs)]

mod discovery;
mod error;
mod hierarchy;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
use facet_query::{FacetOrder, Fuzzify, Logic};
pub use hierarchy::{HierarchyNode, find_node};
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{RawConfig, RawFacet, parse_config_file, parse_config_str};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
pub use templates::local_template;
pub use validate::ConfigWarning;
use validate::validate_config;

/// Top-level merged configuration for facet.
///
/// This represents the fully resolved configuration after merging all discovered
/// `.facet.toml` files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Backend connection settings.
    pub backend: BackendSettings,
    /// Search behavior settings.
    pub search: SearchSettings,
    /// Paging defaults.
    pub paging: PagingSettings,
    /// Result projection and sort choices.
    pub results: ResultSettings,
    /// Facets in display order.
    pub facets: Vec<FacetSpec>,
    /// Field prefixes that denote nested sub-documents.
    pub nested: Vec<String>,
    /// Clauses added to every search, by name.
    pub predefined_filters: Map<String, Value>,
    /// Hierarchies over facet values, by facet field.
    pub hierarchies: BTreeMap<String, Vec<HierarchyNode>>,
    /// Additional aggregation requests, by name.
    pub extra_facets: Map<String, Value>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.facet.toml` files.
    ///
    /// This is the main entry point for loading configuration. It:
    /// 1. Discovers all `.facet.toml` files from `cwd` up to the filesystem root
    /// 2. Appends `~/.facet.toml` if it exists
    /// 3. Parses each file
    /// 4. Merges them according to precedence rules (closest to `cwd` wins)
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        if files.is_empty() {
            return Ok(Self::default());
        }

        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// Builds a configuration from a single TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let path = PathBuf::from("<inline>");
        let config = parse_config_str(contents, &path)?;
        let mut merged = merge_configs(&[ParsedConfig { path, config }])?;
        merged.config_root = None;
        Ok(merged)
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective scalar settings to TOML format.
    ///
    /// Facets, filters and hierarchies are not included.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableSettings {
            backend: self.backend.clone(),
            search: self.search.clone(),
            paging: self.paging.clone(),
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }

    /// Returns the facet defined for `field`.
    pub fn facet(&self, field: &str) -> Option<&FacetSpec> {
        self.facets.iter().find(|f| f.field == field)
    }

    /// Returns the display position of the facet defined for `field`.
    pub fn facet_index(&self, field: &str) -> Option<usize> {
        self.facets.iter().position(|f| f.field == field)
    }

    /// Returns the nested prefix a key falls under, if any.
    ///
    /// A key is under prefix `p` when it equals `p` or starts with `p.`. When several
    /// prefixes match, the longest wins.
    pub fn nested_prefix(&self, key: &str) -> Option<&str> {
        self.nested
            .iter()
            .filter(|p| {
                key == p.as_str()
                    || key
                        .strip_prefix(p.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|p| p.len())
            .map(String::as_str)
    }

    /// Returns the hierarchy declared for a facet field.
    pub fn hierarchy(&self, field: &str) -> Option<&[HierarchyNode]> {
        self.hierarchies.get(field).map(Vec::as_slice)
    }
}

/// HTTP method used to submit queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// The document travels URL-encoded in a `source` parameter.
    #[default]
    Get,
    /// The document is the JSON request body.
    Post,
}

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Search endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            method: HttpMethod::Get,
            timeout_secs: 30,
        }
    }
}

/// Search behavior settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Operator joining free-text terms.
    pub default_operator: Logic,
    /// Free-text fuzzify policy.
    pub fuzzify: Fuzzify,
    /// Quiet period before free text triggers a search.
    pub submit_delay_ms: u64,
    /// Add a synthetic "undefined" bucket to facet counts.
    pub add_undefined: bool,
    /// Hide zero-count values of AND-mode facets.
    pub prune_zero_counts: bool,
    /// Carry facet requests in share links.
    pub include_facets_in_share_link: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_operator: Logic::Or,
            fuzzify: Fuzzify::Off,
            submit_delay_ms: 500,
            add_undefined: false,
            prune_zero_counts: true,
            include_facets_in_share_link: false,
        }
    }
}

/// Paging defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PagingSettings {
    /// Default offset.
    pub from: u64,
    /// Default page size.
    pub size: u64,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self { from: 0, size: 10 }
    }
}

/// Result projection and the sort choices offered to users.
#[derive(Debug, Clone, Default)]
pub struct ResultSettings {
    /// Stored fields to return.
    pub fields: Option<Vec<String>>,
    /// Partial-field projection, verbatim.
    pub partial_fields: Option<Value>,
    /// Sort choices.
    pub sort_options: Vec<SortOption>,
}

/// One selectable sort.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SortOption {
    /// Field to sort on.
    pub field: String,
    /// Label shown to users.
    #[serde(default)]
    pub display: Option<String>,
}

/// A resolved facet definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSpec {
    /// Dotted field path.
    pub field: String,
    /// Label shown to users, when configured.
    pub display: Option<String>,
    /// Current value order.
    pub order: FacetOrder,
    /// Number of buckets to request.
    pub size: Option<usize>,
    /// Values shown before the list is expanded.
    pub min_size: Option<usize>,
    /// Initial AND/OR mode for selections on this facet.
    pub operator: Logic,
}

impl FacetSpec {
    /// Creates a facet on `field` with default settings.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            display: None,
            order: FacetOrder::Term,
            size: None,
            min_size: None,
            operator: Logic::And,
        }
    }

    /// Returns the display label, falling back to the field.
    pub fn label(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.field)
    }
}

/// Serializable subset of Config for TOML output.
#[derive(Serialize)]
struct SerializableSettings {
    /// Backend settings.
    backend: BackendSettings,
    /// Search settings.
    search: SearchSettings,
    /// Paging settings.
    paging: PagingSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let config = Config::default();
        assert_eq!(config.paging.size, 10);
        assert_eq!(config.search.submit_delay_ms, 500);
        assert_eq!(config.search.default_operator, Logic::Or);
        assert!(config.search.prune_zero_counts);
        assert_eq!(config.backend.method, HttpMethod::Get);
    }

    #[test]
    fn nested_prefix_requires_segment_boundary() {
        let config = Config {
            nested: vec!["stats".into(), "stats.inner".into()],
            ..Config::default()
        };
        assert_eq!(config.nested_prefix("stats.count"), Some("stats"));
        assert_eq!(config.nested_prefix("stats"), Some("stats"));
        assert_eq!(config.nested_prefix("stats.inner.x"), Some("stats.inner"));
        assert_eq!(config.nested_prefix("statsx.count"), None);
        assert_eq!(config.nested_prefix("subject"), None);
    }

    #[test]
    fn facet_lookup_by_field() {
        let config = Config {
            facets: vec![FacetSpec::new("subject"), FacetSpec::new("year")],
            ..Config::default()
        };
        assert_eq!(config.facet_index("year"), Some(1));
        assert!(config.facet("title").is_none());
        assert_eq!(config.facets[0].label(), "subject");
    }

    #[test]
    fn settings_to_toml_renders_sections() {
        let config = Config::from_toml_str(
            r#"
[backend]
url = "http://localhost:9200/_search"

[paging]
size = 25
"#,
        )
        .unwrap();
        let toml = config.settings_to_toml().unwrap();
        assert!(toml.contains("[backend]"));
        assert!(toml.contains("url = \"http://localhost:9200/_search\""));
        assert!(toml.contains("size = 25"));
        assert!(toml.contains("[search]"));
    }

    #[test]
    fn from_toml_str_has_no_root() {
        let config = Config::from_toml_str("[[facet]]\nfield = \"a\"\n").unwrap();
        assert!(config.config_root.is_none());
        assert_eq!(config.facets.len(), 1);
    }
}
