//! Command implementations and dispatch.

pub mod check;
pub mod compile;
pub mod config;
pub mod decompile;
pub mod init;
pub mod search;
mod shared;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Init(cmd) => init::run(ctx, &cmd),
        Commands::Check => check::run(ctx),
        Commands::Config => config::run(ctx),
        Commands::Compile(cmd) => compile::run(ctx, &cmd),
        Commands::Decompile(cmd) => decompile::run(ctx, &cmd),
        Commands::Search(cmd) => search::run(ctx, &cmd),
    }
}
