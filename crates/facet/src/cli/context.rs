//! What every command starts from: a working directory and a configuration.

use std::{env, path::PathBuf, process::ExitCode};

use facet_config::{Config, discover_config_files};
use tracing::debug;

/// Built once in `main` and handed to the command.
pub struct CommandContext {
    /// Directory the CLI was started in.
    pub cwd: PathBuf,
    /// Merged configuration, or the defaults when nothing was loaded.
    pub config: Config,
}

impl CommandContext {
    /// Resolves the working directory and loads its configuration.
    pub fn load() -> Result<Self, ExitCode> {
        let mut ctx = Self::load_cwd_only()?;
        debug!(files = ?discover_config_files(&ctx.cwd), "loading configuration");
        ctx.config = Config::load(&ctx.cwd).map_err(|e| {
            eprintln!("error: failed to load configuration: {e}");
            ExitCode::FAILURE
        })?;
        Ok(ctx)
    }

    /// Resolves the working directory and leaves the configuration at its
    /// defaults.
    ///
    /// `init` and `check` handle broken config files themselves.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = env::current_dir().map_err(|e| {
            eprintln!("error: could not determine current directory: {e}");
            ExitCode::FAILURE
        })?;
        Ok(Self {
            cwd,
            config: Config::default(),
        })
    }

    /// Fails with a hint when no backend URL is configured.
    pub fn require_backend(&self) -> Result<(), ExitCode> {
        if self.config.backend.url.is_some() {
            return Ok(());
        }
        eprintln!("error: no backend url configured");
        eprintln!("Set [backend] url in .facet.toml, or run 'facet init' to create one.");
        Err(ExitCode::FAILURE)
    }
}
