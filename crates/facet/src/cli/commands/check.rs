//! Implementation of `facet check`.

use std::process::ExitCode;

use facet_config::{Config, ConfigWarning, discover_config_files};

use crate::cli::{
    context::CommandContext,
    output::{dim, header, subheader, warning},
};

/// Loads and validates configuration, reporting warnings and hints.
///
/// Only a configuration that fails to load is a failure; warnings are
/// advisory.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config_files = discover_config_files(&ctx.cwd);

    println!("{}", header("Checking configuration..."));
    println!();

    if config_files.is_empty() {
        println!("{}", dim("No configuration files found."));
        println!();
        println!("Run 'facet init' to create a configuration file.");
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader("Config files (highest precedence first):"));
    for path in &config_files {
        println!("  {}", path.display());
    }
    println!();

    let config = match Config::load(&ctx.cwd) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", subheader("Facets:"));
    if config.facets.is_empty() {
        println!("  {}", dim("(none defined)"));
    } else {
        for facet in &config.facets {
            let kind = if config.hierarchy(&facet.field).is_some() {
                "tree"
            } else {
                "list"
            };
            let scope = config
                .nested_prefix(&facet.field)
                .map(|p| format!(", nested in {p}"))
                .unwrap_or_default();
            println!(
                "  {} {}",
                facet.label(),
                dim(&format!(
                    "({}, {kind}, {}, {}{scope})",
                    facet.field,
                    facet.order.as_str(),
                    facet.operator.as_str()
                ))
            );
        }
    }
    println!();

    if !config.predefined_filters.is_empty() {
        println!("{}", subheader("Predefined filters:"));
        for name in config.predefined_filters.keys() {
            println!("  {name}");
        }
        println!();
    }

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("No issues found.");
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("  - {}", warning(&w.to_string()));
    }
    println!();
    print_hints(&warnings);

    ExitCode::SUCCESS
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .filter_map(|w| match w {
            ConfigWarning::NoFacetsDefined => Some("Add [[facet]] entries to define facets."),
            ConfigWarning::NoBackendUrl => {
                Some("Set [backend] url to enable 'facet search'.")
            }
            ConfigWarning::UnusedNestedPrefix { .. } => {
                Some("Remove unused nested prefixes, or add facets under them.")
            }
            ConfigWarning::EmptySortField { .. } => {
                Some("Give every [results] sort option a field.")
            }
            ConfigWarning::FieldsAndPartialFields => {
                Some("Set only one of [results] fields and partial_fields.")
            }
            ConfigWarning::FacetWithoutDisplay { .. } => None,
        })
        .collect();

    hints.sort_unstable();
    hints.dedup();

    if !hints.is_empty() {
        println!("{}", subheader("Hints:"));
        for hint in hints {
            println!("  - {hint}");
        }
    }
}
