use anyhow::{Context, Result};
use clap::{ArgMatches, Command};
use stdocs_core::{Presentation, render_markdown};
use tracing::warn;

use super::{add_render_args, write_output};
use crate::config::StdocsConfig;

pub fn make_subcommand() -> Command {
    add_render_args(Command::new("render"))
        .about("Render a markdown page with highlighted code blocks")
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = StdocsConfig::load(args)?;
    let input = args.get_one::<String>("file").context("no input file given")?;
    let source =
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))?;

    let presentation = Presentation::from_config(&config.core)?;
    let highlighter = match presentation.acquire().await {
        Ok(highlighter) => Some(highlighter),
        Err(e) => {
            warn!(error = %e, "highlighter unavailable, code blocks will be plain text");
            None
        }
    };

    let html = render_markdown(&source, highlighter.as_deref());
    write_output(&config.cli.output, &html)
}
