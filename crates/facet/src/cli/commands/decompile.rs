//! Implementation of `facet decompile`.

use std::process::ExitCode;

use facet_core::{Command, QueryDecompiler, QueryState, Session, decode_source};
use serde::Serialize;

use crate::cli::{
    args::DecompileCommand,
    context::CommandContext,
    output::{print_json, print_state},
};

/// JSON output for `facet decompile`.
#[derive(Serialize)]
struct JsonDecompileOutput<'a> {
    /// Commands recovered from the document, in replay order.
    commands: &'a [Command],
    /// State after replaying them.
    state: &'a QueryState,
}

/// Recovers and prints the selection carried by a share link.
///
/// Unlike opening a link in a session, input that carries no document at all
/// is an error here.
pub fn run(ctx: &CommandContext, cmd: &DecompileCommand) -> ExitCode {
    let value = match decode_source(&cmd.source) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let commands = QueryDecompiler::new(&ctx.config).decompile_value(&value);
    let mut session = Session::new(ctx.config.clone());
    for command in commands.iter().cloned() {
        session.dispatch(command);
    }

    if cmd.json {
        return print_json(&JsonDecompileOutput {
            commands: &commands,
            state: session.state(),
        });
    }

    print_state(session.state(), &ctx.config);
    ExitCode::SUCCESS
}
