mod cmd;
mod config;
mod logging;

use anyhow::Result;
use clap::Command;

fn cli() -> Command {
    Command::new("stdocs")
        .about("Syntax highlighting and editor support for Structured Text documentation")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(cmd::highlight::make_subcommand())
        .subcommand(cmd::render::make_subcommand())
        .subcommand(cmd::env::make_subcommand())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("highlight", args)) => cmd::highlight::execute(args).await,
        Some(("render", args)) => cmd::render::execute(args).await,
        Some(("env", args)) => cmd::env::execute(args),
        _ => Ok(()),
    }
}
