//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules and checking the result for fatal problems.

use std::{
    collections::{BTreeMap, HashSet},
    path::PathBuf,
};

use serde_json::{Map, Value};
use toml::Table;

use crate::{
    BackendSettings, Config, ConfigError, FacetSpec, PagingSettings, ResultSettings,
    SearchSettings,
    hierarchy::parse_hierarchy,
    parse::{
        RawBackendSettings, RawConfig, RawFacet, RawPagingSettings, RawResultSettings,
        RawSearchSettings, table_to_json, toml_to_json,
    },
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins (highest precedence)
/// - Facets: the first file defining any `[[facet]]` supplies the whole list
/// - Named tables (filters, hierarchies, extra facets): merged per key, first wins
/// - Nested prefixes: union, in precedence order
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    let facets = merge_facets(configs)?;
    let hierarchy_tables = merge_tables(configs, |c| c.hierarchy.as_ref());
    let mut hierarchies = BTreeMap::new();
    for (field, value) in &hierarchy_tables {
        if !facets.iter().any(|f| &f.field == field) {
            return Err(ConfigError::UnknownHierarchyFacet {
                facet: field.clone(),
            });
        }
        let Some(table) = value.as_table() else {
            return Err(ConfigError::InvalidHierarchy {
                facet: field.clone(),
                message: format!("expected a table, found a {}", value.type_str()),
            });
        };
        hierarchies.insert(field.clone(), parse_hierarchy(field, table)?);
    }

    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(|p| p.to_path_buf());

    Ok(Config {
        backend: merge_backend(configs),
        search: merge_search(configs),
        paging: merge_paging(configs),
        results: merge_results(configs),
        facets,
        nested: merge_nested(configs),
        predefined_filters: merge_json_tables(configs, |c| c.predefined_filters.as_ref()),
        hierarchies,
        extra_facets: merge_json_tables(configs, |c| c.extra_facets.as_ref()),
        config_root,
    })
}

/// Merges backend settings, taking first defined value for each field.
fn merge_backend(configs: &[ParsedConfig]) -> BackendSettings {
    let mut result = BackendSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.backend {
            apply_raw_backend(&mut result, raw);
        }
    }

    result
}

/// Applies raw backend settings to result.
fn apply_raw_backend(result: &mut BackendSettings, raw: &RawBackendSettings) {
    if let Some(ref v) = raw.url {
        result.url = Some(v.clone());
    }
    if let Some(v) = raw.method {
        result.method = v;
    }
    if let Some(v) = raw.timeout_secs {
        result.timeout_secs = v;
    }
}

/// Merges search settings.
fn merge_search(configs: &[ParsedConfig]) -> SearchSettings {
    let mut result = SearchSettings::default();

    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.search {
            apply_raw_search(&mut result, raw);
        }
    }

    result
}

/// Applies raw search settings to result.
fn apply_raw_search(result: &mut SearchSettings, raw: &RawSearchSettings) {
    if let Some(v) = raw.default_operator {
        result.default_operator = v;
    }
    if let Some(v) = raw.fuzzify {
        result.fuzzify = v;
    }
    if let Some(v) = raw.submit_delay_ms {
        result.submit_delay_ms = v;
    }
    if let Some(v) = raw.add_undefined {
        result.add_undefined = v;
    }
    if let Some(v) = raw.prune_zero_counts {
        result.prune_zero_counts = v;
    }
    if let Some(v) = raw.include_facets_in_share_link {
        result.include_facets_in_share_link = v;
    }
}

/// Merges paging settings.
fn merge_paging(configs: &[ParsedConfig]) -> PagingSettings {
    let mut result = PagingSettings::default();

    for parsed in configs.iter().rev() {
        if let Some(RawPagingSettings { from, size }) = parsed.config.paging {
            if let Some(v) = from {
                result.from = v;
            }
            if let Some(v) = size {
                result.size = v;
            }
        }
    }

    result
}

/// Merges result settings.
fn merge_results(configs: &[ParsedConfig]) -> ResultSettings {
    let mut result = ResultSettings::default();

    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.results {
            apply_raw_results(&mut result, raw);
        }
    }

    result
}

/// Applies raw result settings to result.
fn apply_raw_results(result: &mut ResultSettings, raw: &RawResultSettings) {
    if let Some(ref v) = raw.fields {
        result.fields = Some(v.clone());
    }
    if let Some(ref v) = raw.partial_fields {
        result.partial_fields = Some(Value::Object(table_to_json(v)));
    }
    if let Some(ref v) = raw.sort_options {
        result.sort_options = v.clone();
    }
}

/// Takes the facet list from the highest-precedence file that defines one.
fn merge_facets(configs: &[ParsedConfig]) -> Result<Vec<FacetSpec>, ConfigError> {
    let Some(raw) = configs.iter().find_map(|c| c.config.facet.as_ref()) else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut facets = Vec::with_capacity(raw.len());
    for (index, raw_facet) in raw.iter().enumerate() {
        let facet = resolve_facet(index, raw_facet)?;
        if !seen.insert(facet.field.clone()) {
            return Err(ConfigError::DuplicateFacet { field: facet.field });
        }
        facets.push(facet);
    }
    Ok(facets)
}

/// Resolves a raw facet, applying defaults.
fn resolve_facet(index: usize, raw: &RawFacet) -> Result<FacetSpec, ConfigError> {
    let field = raw
        .field
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or(ConfigError::EmptyFacetField { index })?;

    let mut facet = FacetSpec::new(field);
    facet.display.clone_from(&raw.display);
    if let Some(order) = raw.order {
        facet.order = order;
    }
    facet.size = raw.size;
    facet.min_size = raw.min_size;
    if let Some(operator) = raw.operator {
        facet.operator = operator;
    }
    Ok(facet)
}

/// Unions nested prefixes in precedence order.
fn merge_nested(configs: &[ParsedConfig]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for prefix in configs
        .iter()
        .filter_map(|c| c.config.nested.as_ref())
        .flatten()
    {
        if !result.contains(prefix) {
            result.push(prefix.clone());
        }
    }
    result
}

/// Merges a keyed table across files, first definition of each key wins.
///
/// Keys keep the order in which they were first seen.
fn merge_tables(configs: &[ParsedConfig], get: impl Fn(&RawConfig) -> Option<&Table>) -> Table {
    let mut result = Table::new();
    for table in configs.iter().filter_map(|c| get(&c.config)) {
        for (key, value) in table {
            if !result.contains_key(key) {
                result.insert(key.clone(), value.clone());
            }
        }
    }
    result
}

/// Like [`merge_tables`], converting the values to JSON.
fn merge_json_tables(
    configs: &[ParsedConfig],
    get: impl Fn(&RawConfig) -> Option<&Table>,
) -> Map<String, Value> {
    merge_tables(configs, get)
        .iter()
        .map(|(k, v)| (k.clone(), toml_to_json(v)))
        .collect()
}
