use anyhow::{Context, Result};
use clap::{ArgMatches, Command};
use serde_json::json;
use stdocs_core::{DiagnosticSinks, HostGlobal, Presentation};

use super::add_config_arg;
use crate::config::StdocsConfig;

pub fn make_subcommand() -> Command {
    add_config_arg(Command::new("env"))
        .about("Print the worker environment the editor shim installs")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = StdocsConfig::load(args)?;
    let presentation = Presentation::from_config(&config.core)?;

    let host = HostGlobal::browser(DiagnosticSinks::tracing());
    presentation.mount_editor(&host);
    let environment = host
        .worker_environment()
        .context("worker shim did not install")?;

    let report = json!({
        "environment": environment.descriptor(),
        "suppressedPatterns": presentation.shim().settings().suppressed_patterns,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    presentation.unmount_editor(&host);
    Ok(())
}
