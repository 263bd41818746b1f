//! Clap argument definitions for the `facet` CLI.

use clap::{ArgAction, Args, Parser, Subcommand};
use facet_core::{SortDirection, SortSpec};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "facet")]
#[command(about = "Faceted search against a JSON search backend")]
pub struct Cli {
    /// Log more (-v for debug, -vv for trace); RUST_LOG overrides
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// A `key=value` facet selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    /// Dotted field path.
    pub key: String,
    /// Selected value.
    pub value: String,
}

/// A `field=low..high` range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeArg {
    /// Facet field.
    pub field: String,
    /// Lower bound.
    pub low: String,
    /// Upper bound.
    pub high: String,
}

/// Parses `key=value`.
fn parse_filter(s: &str) -> Result<FilterArg, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok(FilterArg {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parses `field=low..high`.
fn parse_range(s: &str) -> Result<RangeArg, String> {
    let (field, bounds) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=low..high, got '{s}'"))?;
    let (low, high) = bounds
        .split_once("..")
        .ok_or_else(|| format!("expected low..high, got '{bounds}'"))?;
    Ok(RangeArg {
        field: field.to_string(),
        low: low.to_string(),
        high: high.to_string(),
    })
}

/// Parses `field`, `field:asc` or `field:desc`.
fn parse_sort(s: &str) -> Result<SortSpec, String> {
    let (field, direction) = match s.rsplit_once(':') {
        Some((field, "asc")) => (field, SortDirection::Asc),
        Some((field, "desc")) => (field, SortDirection::Desc),
        Some((_, other)) => return Err(format!("unknown sort direction '{other}'")),
        None => (s, SortDirection::Asc),
    };
    if field.is_empty() {
        return Err("empty sort field".to_string());
    }
    Ok(SortSpec::new(field, direction))
}

/// Flags that build a selection state.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Seed the selection from a share link, query string or JSON document
    #[arg(long)]
    pub source: Option<String>,

    /// Free-text query
    #[arg(short = 'q', long)]
    pub query: Option<String>,

    /// Restrict the free-text query to one field
    #[arg(long)]
    pub field: Option<String>,

    /// Select a facet value (repeatable); "undefined" selects records without a value
    #[arg(short = 'f', long = "filter", value_parser = parse_filter)]
    pub filters: Vec<FilterArg>,

    /// Combine selections on this key with OR (repeatable)
    #[arg(long = "or")]
    pub or_keys: Vec<String>,

    /// Restrict a facet to a range, as field=low..high (repeatable)
    #[arg(long = "range", value_parser = parse_range)]
    pub ranges: Vec<RangeArg>,

    /// Sort key, as field[:asc|desc] (repeatable, first wins)
    #[arg(long = "sort", value_parser = parse_sort)]
    pub sort: Vec<SortSpec>,

    /// Offset of the first record
    #[arg(long)]
    pub from: Option<u64>,

    /// Records per page
    #[arg(long)]
    pub size: Option<u64>,
}

/// Arguments for `facet init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.facet.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `facet compile`.
#[derive(Args, Debug, Clone)]
pub struct CompileCommand {
    #[command(flatten)]
    /// Selection flags.
    pub selection: SelectionArgs,

    /// Print a share link on top of this base URL instead of the document
    #[arg(long, value_name = "BASE_URL")]
    pub share: Option<String>,
}

/// Arguments for `facet decompile`.
#[derive(Args, Debug, Clone)]
pub struct DecompileCommand {
    /// Share link, query string or JSON document
    pub source: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `facet search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    /// Selection flags.
    pub selection: SelectionArgs,

    /// Show every facet value instead of the first few
    #[arg(long)]
    pub all_values: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Supported `facet` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize facet configuration in current directory
    Init(InitCommand),

    /// Validate configuration and diagnose issues
    Check,

    /// Show effective configuration settings
    Config,

    /// Print the query document for a selection
    #[command(after_help = "\
EXAMPLES:
  facet compile -q einstein
  facet compile -f size=S -f size=M --or size
  facet compile -f stats.year=2001 --range year=1990..2000
  facet compile -f size=S --share https://example.org/search")]
    Compile(CompileCommand),

    /// Recover the selection carried by a share link
    Decompile(DecompileCommand),

    /// Run a search and print records and facet counts
    Search(SearchCommand),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filter_parsing() {
        assert_eq!(
            parse_filter("stats.year=2001").unwrap(),
            FilterArg {
                key: "stats.year".into(),
                value: "2001".into()
            }
        );
        assert_eq!(parse_filter("title=a=b").unwrap().value, "a=b");
        assert!(parse_filter("novalue").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn range_parsing() {
        let range = parse_range("year=1990..2000").unwrap();
        assert_eq!(range.field, "year");
        assert_eq!(range.low, "1990");
        assert_eq!(range.high, "2000");
        assert!(parse_range("year=1990").is_err());
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(
            parse_sort("year:desc").unwrap(),
            SortSpec::new("year", SortDirection::Desc)
        );
        assert_eq!(
            parse_sort("title").unwrap(),
            SortSpec::new("title", SortDirection::Asc)
        );
        assert!(parse_sort("year:sideways").is_err());
        assert!(parse_sort(":asc").is_err());
    }

    #[test]
    fn selection_flags_parse() {
        let cli = Cli::try_parse_from([
            "facet", "compile", "-q", "einstein", "-f", "size=S", "--or", "size", "--sort",
            "year:desc", "--from", "10", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Compile(cmd) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(cmd.selection.query.as_deref(), Some("einstein"));
        assert_eq!(cmd.selection.filters.len(), 1);
        assert_eq!(cmd.selection.or_keys, vec!["size".to_string()]);
        assert_eq!(cmd.selection.from, Some(10));
    }
}
