//! Rendering and JSON serialization for CLI output.

mod highlight;

use std::{
    env,
    io::{self, IsTerminal},
    process::ExitCode,
};

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use facet_config::Config;
use facet_core::{FacetEntries, FacetView, Pagination, QueryState, shown_values};
use facet_query::scalar_string;
pub use highlight::Highlighter;
use serde::Serialize;
use serde_json::Value;

/// ANSI codes used by the styling helpers.
mod codes {
    /// Bold.
    pub const BOLD: &str = "\x1b[1m";
    /// Cyan.
    pub const CYAN: &str = "\x1b[36m";
    /// Yellow.
    pub const YELLOW: &str = "\x1b[33m";
    /// Dim.
    pub const DIM: &str = "\x1b[2m";
    /// Reset.
    pub const RESET: &str = "\x1b[0m";
}

/// True unless `NO_COLOR` is set.
fn color_enabled() -> bool {
    env::var_os("NO_COLOR").is_none()
}

/// Wraps `text` in ANSI codes when stdout is a color terminal.
fn styled(codes: &[&str], text: &str) -> String {
    if !(io::stdout().is_terminal() && color_enabled()) {
        return text.to_string();
    }
    format!("{}{text}{}", codes.concat(), codes::RESET)
}

/// Formats a header.
pub fn header(text: &str) -> String {
    styled(&[codes::BOLD, codes::CYAN], text)
}

/// Formats a subheader.
pub fn subheader(text: &str) -> String {
    styled(&[codes::BOLD], text)
}

/// Formats less important text.
pub fn dim(text: &str) -> String {
    styled(&[codes::DIM], text)
}

/// Formats a warning.
pub fn warning(text: &str) -> String {
    styled(&[codes::YELLOW], text)
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", Highlighter::for_stdout().json(&json));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Renders one cell of a record table.
fn cell_text(value: &Value) -> String {
    if let Some(s) = scalar_string(value) {
        return s;
    }
    match value {
        Value::Null => String::new(),
        Value::Array(items) if items.iter().all(|v| scalar_string(v).is_some()) => items
            .iter()
            .filter_map(scalar_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Looks up a possibly dotted field in a record.
///
/// Projected fields arrive under their dotted name; stored documents need a
/// walk.
fn field_value<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    if let Some(v) = record.get(field) {
        return Some(v);
    }
    field
        .split('.')
        .try_fold(record, |current, part| current.get(part))
}

/// Prints records as a table.
///
/// Columns are the configured projection fields, or the keys of the first
/// record.
pub fn print_records(records: &[Value], config: &Config) {
    if records.is_empty() {
        println!("{}", dim("No results found."));
        return;
    }

    let columns: Vec<String> = match &config.results.fields {
        Some(fields) => fields.clone(),
        None => records
            .iter()
            .find_map(Value::as_object)
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default(),
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    if columns.is_empty() {
        table.set_header(vec!["Record"]);
        for record in records {
            table.add_row(vec![Cell::new(record.to_string())]);
        }
    } else {
        table.set_header(columns.clone());
        for record in records {
            table.add_row(
                columns
                    .iter()
                    .map(|c| Cell::new(field_value(record, c).map(cell_text).unwrap_or_default())),
            );
        }
    }
    println!("{table}");
}

/// Prints the "showing x-y of n" line.
pub fn print_pagination(pagination: &Pagination) {
    if pagination.found == 0 {
        return;
    }
    let mut line = format!(
        "Showing {}-{} of {}",
        pagination.start, pagination.end, pagination.found
    );
    if let Some(next) = pagination.next_from() {
        line.push_str(&format!(" (next page: --from {next})"));
    }
    println!("{}", dim(&line));
}

/// Prints every facet view.
///
/// Flat lists stop at the facet's `min_size` unless `expanded`.
pub fn print_facets(views: &[FacetView], config: &Config, expanded: bool) {
    for view in views {
        println!();
        println!(
            "{} {}",
            subheader(&view.label),
            dim(&format!("({}, {})", view.logic.as_str(), view.order.as_str()))
        );

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["Value", "Count"]);

        match &view.entries {
            FacetEntries::Flat(values) => {
                let min_size = config.facet(&view.field).and_then(|f| f.min_size);
                let (shown, more) = shown_values(values, min_size, expanded);
                if shown.is_empty() {
                    println!("  {}", dim("(no values)"));
                    continue;
                }
                for value in shown {
                    table.add_row(vec![Cell::new(&value.value), Cell::new(value.count)]);
                }
                println!("{table}");
                if more > 0 {
                    println!("  {}", dim(&format!("{more} more (use --all-values)")));
                }
            }
            FacetEntries::Tree(nodes) => {
                let visible: Vec<_> = nodes.iter().filter(|n| n.visible).collect();
                if visible.is_empty() {
                    println!("  {}", dim("(no values)"));
                    continue;
                }
                for node in visible {
                    let indent = "  ".repeat(node.parent_path.len());
                    table.add_row(vec![
                        Cell::new(format!("{indent}{}", node.label)),
                        Cell::new(node.count),
                    ]);
                }
                println!("{table}");
            }
        }
    }
}

/// Prints a selection state as tables.
pub fn print_state(state: &QueryState, config: &Config) {
    if !state.free_text.is_empty() {
        let field = state.search_field.as_deref().unwrap_or("all fields");
        println!("{} {} {}", subheader("Query:"), state.free_text, dim(&format!("({field})")));
    }

    if state.selections.is_empty() && state.ranges.is_empty() {
        println!("{}", dim("No selections."));
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["Key", "Value", "Logic"]);
        for s in &state.selections {
            table.add_row(vec![
                Cell::new(&s.key),
                Cell::new(s.value.as_str()),
                Cell::new(s.logic.as_str()),
            ]);
        }
        for r in &state.ranges {
            let field = config
                .facets
                .get(r.facet)
                .map_or_else(|| format!("#{}", r.facet), |f| f.field.clone());
            table.add_row(vec![
                Cell::new(field),
                Cell::new(format!("{}..{}", r.low, r.high)),
                Cell::new("range"),
            ]);
        }
        println!("{table}");
    }

    if !state.sort.is_empty() {
        let keys: Vec<String> = state
            .sort
            .iter()
            .map(|s| format!("{}:{}", s.field, s.direction.as_str()))
            .collect();
        println!("{} {}", subheader("Sort:"), keys.join(", "));
    }
    println!(
        "{} from {} size {}",
        subheader("Paging:"),
        state.paging.from,
        state.paging.size
    );
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cells_flatten_scalar_arrays() {
        assert_eq!(cell_text(&json!(["a", 1, true])), "a, 1, true");
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!([{"x": 1}])), r#"[{"x":1}]"#);
    }

    #[test]
    fn dotted_fields_resolve_either_way() {
        let projected = json!({"author.name": ["Ada"]});
        let stored = json!({"author": {"name": "Ada"}});
        assert_eq!(field_value(&projected, "author.name"), Some(&json!(["Ada"])));
        assert_eq!(field_value(&stored, "author.name"), Some(&json!("Ada")));
        assert_eq!(field_value(&stored, "author.age"), None);
    }
}
