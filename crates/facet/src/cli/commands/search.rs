//! Implementation of `facet search`.

use std::process::ExitCode;

use facet_core::{FacetView, HttpTransport, Pagination, SearchStatus, Session};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Builder;

use super::shared::build_session;
use crate::cli::{
    args::SearchCommand,
    context::CommandContext,
    output::{print_facets, print_json, print_pagination, print_records},
};

/// JSON output for `facet search`.
#[derive(Serialize)]
struct JsonSearchOutput<'a> {
    /// The document that was sent.
    query: Value,
    /// Page position and totals.
    pagination: &'a Pagination,
    /// Records on this page.
    records: &'a [Value],
    /// Facet lists and trees.
    facets: &'a [FacetView],
}

/// Runs one search against the configured backend.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    if let Err(code) = ctx.require_backend() {
        return code;
    }
    let mut session = match build_session(&ctx.config, &cmd.selection) {
        Ok(session) => session,
        Err(code) => return code,
    };
    let transport = match HttpTransport::new(&ctx.config.backend) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let status = runtime.block_on(session.search(&transport)).clone();
    if let SearchStatus::Failed(message) = status {
        eprintln!("error: {message}");
        return ExitCode::FAILURE;
    }

    output(&session, cmd)
}

/// Prints the results of a completed search.
fn output(session: &Session, cmd: &SearchCommand) -> ExitCode {
    let Some(results) = session.results() else {
        eprintln!("error: search returned no results");
        return ExitCode::FAILURE;
    };

    if cmd.json {
        return print_json(&JsonSearchOutput {
            query: session.compile().to_value(),
            pagination: &results.pagination,
            records: &results.records,
            facets: session.facets(),
        });
    }

    let config = session.config();
    print_records(&results.records, config);
    print_pagination(&results.pagination);
    print_facets(session.facets(), config, cmd.all_values);
    ExitCode::SUCCESS
}
