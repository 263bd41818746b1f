//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for potential issues.
//! Problems that would make searching impossible are rejected during merging
//! instead; see [`ConfigError`](crate::ConfigError).

use std::fmt;

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No facets are defined.
    NoFacetsDefined,
    /// No backend URL is configured.
    NoBackendUrl,
    /// A nested prefix that no facet or filter falls under.
    UnusedNestedPrefix {
        /// The prefix.
        prefix: String,
    },
    /// A sort option with an empty field.
    EmptySortField {
        /// Position in the sort option list.
        index: usize,
    },
    /// A facet without a display label.
    FacetWithoutDisplay {
        /// The facet field.
        field: String,
    },
    /// Both `fields` and `partial_fields` are set.
    FieldsAndPartialFields,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFacetsDefined => write!(f, "no facets are defined in configuration"),
            Self::NoBackendUrl => write!(f, "no backend url is configured"),
            Self::UnusedNestedPrefix { prefix } => {
                write!(f, "nested prefix '{prefix}' is not used by any facet or filter")
            }
            Self::EmptySortField { index } => {
                write!(f, "sort option #{index} has an empty field")
            }
            Self::FacetWithoutDisplay { field } => {
                write!(f, "facet '{field}' has no display label")
            }
            Self::FieldsAndPartialFields => write!(
                f,
                "both fields and partial_fields are set; results are read from fields"
            ),
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.facets.is_empty() {
        warnings.push(ConfigWarning::NoFacetsDefined);
    }

    if config.backend.url.as_deref().is_none_or(|u| u.trim().is_empty()) {
        warnings.push(ConfigWarning::NoBackendUrl);
    }

    for prefix in &config.nested {
        let used = config
            .facets
            .iter()
            .map(|f| f.field.as_str())
            .chain(config.predefined_filters.keys().map(String::as_str))
            .any(|key| config.nested_prefix(key) == Some(prefix.as_str()));
        if !used {
            warnings.push(ConfigWarning::UnusedNestedPrefix {
                prefix: prefix.clone(),
            });
        }
    }

    for (index, option) in config.results.sort_options.iter().enumerate() {
        if option.field.trim().is_empty() {
            warnings.push(ConfigWarning::EmptySortField { index });
        }
    }

    for facet in &config.facets {
        if facet.display.is_none() {
            warnings.push(ConfigWarning::FacetWithoutDisplay {
                field: facet.field.clone(),
            });
        }
    }

    if config.results.fields.is_some() && config.results.partial_fields.is_some() {
        warnings.push(ConfigWarning::FieldsAndPartialFields);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_config() {
        let warnings = Config::default().validate();
        assert_eq!(
            warnings,
            vec![ConfigWarning::NoFacetsDefined, ConfigWarning::NoBackendUrl]
        );
    }

    #[test]
    fn test_validate_clean_config() {
        let config = Config::from_toml_str(
            r#"
nested = ["stats"]

[backend]
url = "http://localhost:9200/_search"

[[facet]]
field = "stats.source"
display = "Source"
"#,
        )
        .unwrap();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_unused_nested_prefix() {
        let config = Config::from_toml_str(
            r#"
nested = ["stats", "links"]

[backend]
url = "http://x"

[[facet]]
field = "subject"
display = "Subject"

[predefined_filters]
"stats.public" = { term = { "stats.public" = "true" } }
"#,
        )
        .unwrap();
        assert_eq!(
            config.validate(),
            vec![ConfigWarning::UnusedNestedPrefix {
                prefix: "links".into()
            }]
        );
    }

    #[test]
    fn test_facet_and_result_warnings() {
        let config = Config::from_toml_str(
            r#"
[backend]
url = "http://x"

[results]
fields = ["title"]
partial_fields = { doc = { include = ["*"] } }
sort_options = [{ field = "" }]

[[facet]]
field = "year"
"#,
        )
        .unwrap();
        let warnings = config.validate();
        assert!(warnings.contains(&ConfigWarning::EmptySortField { index: 0 }));
        assert!(warnings.contains(&ConfigWarning::FacetWithoutDisplay {
            field: "year".into()
        }));
        assert!(warnings.contains(&ConfigWarning::FieldsAndPartialFields));
    }

    #[test]
    fn test_warning_display() {
        let warning = ConfigWarning::UnusedNestedPrefix {
            prefix: "stats".into(),
        };
        assert_eq!(
            warning.to_string(),
            "nested prefix 'stats' is not used by any facet or filter"
        );
    }
}
