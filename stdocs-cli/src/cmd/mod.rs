pub mod env;
pub mod highlight;
pub mod render;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::Path;

pub fn add_config_arg(command: Command) -> Command {
    command.arg(
        Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .help("Configuration file")
            .default_value("./stdocs.toml"),
    )
}

/// Arguments shared by commands that produce HTML.
pub fn add_render_args(command: Command) -> Command {
    add_config_arg(command)
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Input file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write HTML here instead of stdout"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("NAME")
                .help("Bundled syntax theme"),
        )
}

pub fn write_output(output: &str, html: &str) -> Result<()> {
    if output == "-" {
        print!("{}", html);
        return Ok(());
    }

    let path = Path::new(output);
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/page.html");

        write_output(out.to_str().unwrap(), "<p>hi</p>").unwrap();

        assert_eq!(std::fs::read_to_string(out).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn file_argument_is_required() {
        let result =
            add_render_args(Command::new("highlight")).try_get_matches_from(vec!["highlight"]);
        assert!(result.is_err());
    }
}
