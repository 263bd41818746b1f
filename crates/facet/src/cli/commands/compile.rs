//! Implementation of `facet compile`.

use std::process::ExitCode;

use super::shared::build_session;
use crate::cli::{args::CompileCommand, context::CommandContext, output::print_json};

/// Prints the query document, or a share link, for a selection.
pub fn run(ctx: &CommandContext, cmd: &CompileCommand) -> ExitCode {
    let session = match build_session(&ctx.config, &cmd.selection) {
        Ok(session) => session,
        Err(code) => return code,
    };

    if let Some(base) = &cmd.share {
        return match session.share_link(base) {
            Ok(url) => {
                println!("{url}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    print_json(&session.compile().to_value())
}
