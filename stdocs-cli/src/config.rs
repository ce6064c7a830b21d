use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StdocsConfig {
    /// Command-line behaviour
    pub cli: CliConfig,
    /// Highlighter and shim configuration (from stdocs-core)
    #[serde(flatten)]
    pub core: stdocs_core::Config,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Configuration file path
    pub config: String,
    /// Where to write output; `-` is stdout
    pub output: String,
    /// Language of the input; empty means guess from the file extension
    pub language: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config: "./stdocs.toml".to_string(),
            output: "-".to_string(),
            language: String::new(),
        }
    }
}

impl Default for StdocsConfig {
    fn default() -> Self {
        Self {
            cli: CliConfig::default(),
            core: stdocs_core::Config::default(),
        }
    }
}

impl CliConfig {
    /// The configured language, or the extension of `input`.
    pub fn language_for(&self, input: &Path) -> Option<String> {
        if !self.language.is_empty() {
            return Some(self.language.clone());
        }
        input
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
    }
}

impl StdocsConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (STDOCS_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        Self::load_with_env(args, None)
    }

    /// [`StdocsConfig::load`] reading `STDOCS_*` variables from `env` instead
    /// of the process environment when given.
    fn load_with_env(args: &ArgMatches, env: Option<Map<String, String>>) -> Result<Self> {
        let config_file = args
            .try_get_one::<String>("config")
            .unwrap_or(None)
            .cloned()
            .unwrap_or_else(|| CliConfig::default().config);

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        let defaults = Self::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. Add configuration file if it exists
        if Path::new(&config_file).exists() {
            builder = builder.add_source(File::with_name(&config_file));
        }

        // 3. Add environment variables with STDOCS_ prefix
        builder = builder.add_source(environment().source(env));

        // 4. Override with CLI arguments (highest priority). Only args defined
        // for the running subcommand are looked up.
        let overrides = [
            ("config", "cli.config"),
            ("output", "cli.output"),
            ("lang", "cli.language"),
            ("theme", "highlighter.theme"),
        ];
        for (arg, key) in overrides {
            if let Some(value) = args.try_get_one::<String>(arg).unwrap_or(None) {
                builder = builder.set_override(key, value.clone())?;
            }
        }

        // Build and deserialize
        let config = builder.build()?;
        let stdocs_config: StdocsConfig = config.try_deserialize()?;

        Ok(stdocs_config)
    }
}

/// `STDOCS_SHIM__GLOBAL_API=true` sets `shim.global_api`. Values are parsed
/// into bools and numbers; suppressed patterns are a comma separated list.
fn environment() -> Environment {
    Environment::with_prefix("STDOCS")
        .prefix_separator("_")
        .separator("__") // Use double underscore for nested keys
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("shim.suppressed_patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    fn command() -> Command {
        Command::new("test")
            .arg(Arg::new("output").long("output").value_name("FILE"))
            .arg(Arg::new("theme").long("theme").value_name("NAME"))
            .arg(Arg::new("config").long("config").value_name("FILE"))
    }

    #[test]
    fn test_default_config() {
        let config = StdocsConfig::default();
        assert_eq!(config.cli.config, "./stdocs.toml");
        assert_eq!(config.cli.output, "-");
        assert_eq!(config.core.highlighter.theme, "InspiredGitHub");
        assert!(!config.core.shim.global_api);
    }

    #[test]
    fn test_cli_args_override() {
        let matches = command()
            .try_get_matches_from(vec![
                "test",
                "--output",
                "/tmp/out.html",
                "--theme",
                "base16-ocean.dark",
            ])
            .unwrap();

        let config = StdocsConfig::load(&matches).unwrap();
        assert_eq!(config.cli.output, "/tmp/out.html");
        assert_eq!(config.core.highlighter.theme, "base16-ocean.dark");
        // Should still have defaults for non-overridden values
        assert_eq!(config.cli.config, "./stdocs.toml");
        assert_eq!(config.core.shim.suppressed_patterns.patterns().len(), 8);
    }

    #[test]
    fn test_config_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stdocs.toml");
        std::fs::write(
            &path,
            "[highlighter]\ntheme = \"Solarized (light)\"\n\n[shim]\nbase_url = \"/editor/\"\n",
        )
        .unwrap();

        let path = path.to_string_lossy().to_string();
        let matches = command()
            .try_get_matches_from(vec!["test", "--config", path.as_str()])
            .unwrap();

        let config = StdocsConfig::load(&matches).unwrap();
        assert_eq!(config.core.highlighter.theme, "Solarized (light)");
        assert_eq!(config.core.shim.base_url, "/editor/");
        assert_eq!(config.cli.config, path);
    }

    #[test]
    fn test_env_layer_parses_typed_values() {
        let env = Map::from([
            ("STDOCS_SHIM__GLOBAL_API".to_string(), "true".to_string()),
            (
                "STDOCS_HIGHLIGHTER__MAX_CONSECUTIVE_FAILURES".to_string(),
                "3".to_string(),
            ),
            (
                "STDOCS_SHIM__SUPPRESSED_PATTERNS".to_string(),
                "Could not create web worker,chatty".to_string(),
            ),
            ("STDOCS_HIGHLIGHTER__THEME".to_string(), "Solarized (dark)".to_string()),
        ]);
        let matches = command().try_get_matches_from(vec!["test"]).unwrap();

        let config = StdocsConfig::load_with_env(&matches, Some(env)).unwrap();
        assert!(config.core.shim.global_api);
        assert_eq!(config.core.highlighter.max_consecutive_failures, Some(3));
        assert_eq!(config.core.highlighter.theme, "Solarized (dark)");
        assert_eq!(
            config.core.shim.suppressed_patterns.patterns(),
            ["Could not create web worker", "chatty"]
        );
    }

    #[test]
    fn test_cli_args_beat_env() {
        let env = Map::from([("STDOCS_HIGHLIGHTER__THEME".to_string(), "from-env".to_string())]);
        let matches = command()
            .try_get_matches_from(vec!["test", "--theme", "from-cli"])
            .unwrap();

        let config = StdocsConfig::load_with_env(&matches, Some(env)).unwrap();
        assert_eq!(config.core.highlighter.theme, "from-cli");
    }

    #[test]
    fn test_language_guess() {
        let mut cli = CliConfig::default();
        assert_eq!(cli.language_for(Path::new("motor.st")).as_deref(), Some("st"));
        assert_eq!(cli.language_for(Path::new("Makefile")), None);

        cli.language = "rust".into();
        assert_eq!(cli.language_for(Path::new("motor.st")).as_deref(), Some("rust"));
    }
}
