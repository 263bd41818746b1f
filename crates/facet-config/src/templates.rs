//! Configuration template for `facet init`.
//!
//! The template is stored as a valid TOML file and returned as a commented-out
//! example configuration.

/// Example configuration (valid TOML).
const TEMPLATE: &str = include_str!("../templates/config.toml");

/// Returns the configuration template as a commented-out example.
pub fn local_template() -> String {
    comment_template(TEMPLATE)
}

/// Converts a valid TOML template into a commented-out example config.
///
/// Lines that are already comments are preserved as-is. Non-comment, non-empty
/// lines get a "# " prefix. Empty lines are preserved.
fn comment_template(template: &str) -> String {
    let mut result = String::with_capacity(template.len() + template.lines().count() * 2);
    for line in template.lines() {
        if !line.is_empty() && !line.starts_with('#') {
            result.push_str("# ");
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, parse::parse_config};

    #[test]
    fn template_parses_as_valid_toml() {
        let result = parse_config(TEMPLATE);
        assert!(result.is_ok(), "template failed to parse: {result:?}");
    }

    #[test]
    fn template_resolves_without_errors() {
        let config = Config::from_toml_str(TEMPLATE).unwrap();
        assert!(!config.facets.is_empty());
        assert!(config.hierarchy("subject").is_some());
    }

    #[test]
    fn commented_template_is_empty_config() {
        let config = Config::from_toml_str(&local_template()).unwrap();
        assert!(config.facets.is_empty());
    }

    #[test]
    fn comment_template_handles_sections_and_blank_lines() {
        let input = "# note\n[section]\n\nkey = \"value\"\n";
        assert_eq!(
            comment_template(input),
            "# note\n# [section]\n\n# key = \"value\"\n"
        );
    }
}
