//! Shared helpers for command implementations.

use std::process::ExitCode;

use facet_config::Config;
use facet_core::{Command, Session};
use facet_query::Logic;

use crate::cli::args::SelectionArgs;

/// Translates selection flags into session commands.
///
/// Paging comes last since every selection command returns to the first
/// page. A range on a field that is not a facet is an error.
pub fn selection_commands(args: &SelectionArgs, config: &Config) -> Result<Vec<Command>, String> {
    let mut commands = Vec::new();

    if let Some(field) = &args.field {
        commands.push(Command::SetSearchField {
            field: Some(field.clone()),
        });
    }
    if let Some(text) = &args.query {
        commands.push(Command::SetFreeText { text: text.clone() });
    }

    for filter in &args.filters {
        let logic = args
            .or_keys
            .iter()
            .any(|k| k == &filter.key)
            .then_some(Logic::Or);
        commands.push(Command::AddSelection {
            key: filter.key.clone(),
            value: filter.value.as_str().into(),
            logic,
        });
    }

    for range in &args.ranges {
        let facet = config
            .facet_index(&range.field)
            .ok_or_else(|| format!("range field '{}' is not a configured facet", range.field))?;
        commands.push(Command::SetRange {
            facet,
            low: range.low.clone(),
            high: range.high.clone(),
        });
    }

    if !args.sort.is_empty() {
        commands.push(Command::SetSort {
            sort: args.sort.clone(),
        });
    }
    if let Some(size) = args.size {
        commands.push(Command::SetPageSize { size });
    }
    if let Some(from) = args.from {
        commands.push(Command::SetPage { from });
    }
    Ok(commands)
}

/// Builds a session from `--source` and the selection flags.
pub fn build_session(config: &Config, args: &SelectionArgs) -> Result<Session, ExitCode> {
    let commands = selection_commands(args, config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })?;

    let mut session = match &args.source {
        Some(source) => Session::from_source(config.clone(), source),
        None => Session::new(config.clone()),
    };
    for command in commands {
        session.dispatch(command);
    }
    Ok(session)
}
