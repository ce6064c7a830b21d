use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::Path;
use stdocs_core::{Presentation, render_code_block};
use tracing::warn;

use super::{add_render_args, write_output};
use crate::config::StdocsConfig;

pub fn make_subcommand() -> Command {
    add_render_args(Command::new("highlight"))
        .about("Highlight a source file into an HTML fragment")
        .arg(
            Arg::new("lang")
                .short('l')
                .long("lang")
                .value_name("LANG")
                .help("Language name or extension (default: guessed from FILE)"),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = StdocsConfig::load(args)?;
    let input = args
        .get_one::<String>("file")
        .map(Path::new)
        .context("no input file given")?;

    let code = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let language = config.cli.language_for(input);

    let presentation = Presentation::from_config(&config.core)?;
    let html = match presentation.acquire().await {
        Ok(highlighter) => {
            render_code_block(Some(highlighter.as_ref()), language.as_deref(), &code)
        }
        Err(e) => {
            warn!(error = %e, "highlighter unavailable, rendering plain text");
            render_code_block(None, language.as_deref(), &code)
        }
    };

    write_output(&config.cli.output, &html)
}
