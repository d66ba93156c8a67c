//! Configuration for the Pashmak interpreter
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. `pashmak.toml` in the working directory (optional)
//! 3. An explicit config file (`--config`, required when given)
//! 4. `PASHMAK_*` environment variables (a `.env` file is loaded first)
//! 5. Builder overrides

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "pashmak";
const ENV_PREFIX: &str = "PASHMAK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Prepend the `@stdlib` inclusion prelude to every program
    #[serde(default = "default_include_stdlib")]
    pub include_stdlib: bool,

    /// Directory whose `<name>.pashm` files override embedded stdlib modules
    #[serde(default)]
    pub stdlib_path: Option<PathBuf>,

    /// Extra directories searched by relative `include`s
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,

    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_include_stdlib() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            include_stdlib: default_include_stdlib(),
            stdlib_path: None,
            include_paths: Vec::new(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from the default sources without overrides
    pub fn load() -> Result<Self> {
        Config::builder().build()
    }
}

/// Builder applying explicit overrides on top of the layered sources
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    stdlib_path: Option<PathBuf>,
    include_stdlib: Option<bool>,
    include_paths: Vec<PathBuf>,
    skip_environment: bool,
}

impl ConfigBuilder {
    /// Explicit config file; it must exist
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn stdlib_path(mut self, path: Option<PathBuf>) -> Self {
        self.stdlib_path = path;
        self
    }

    pub fn include_stdlib(mut self, include: bool) -> Self {
        self.include_stdlib = Some(include);
        self
    }

    /// Appended after configured include paths
    pub fn include_path(mut self, path: PathBuf) -> Self {
        self.include_paths.push(path);
        self
    }

    /// Ignore `.env` and `PASHMAK_*` variables
    pub fn skip_environment(mut self) -> Self {
        self.skip_environment = true;
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut sources = ::config::Config::builder()
            .add_source(::config::File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Some(path) = &self.config_path {
            sources = sources.add_source(::config::File::from(path.clone()).required(true));
        }

        if !self.skip_environment {
            dotenvy::dotenv().ok();
            sources = sources.add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(":")
                    .with_list_parse_key("include_paths"),
            );
        }

        let mut config: Config = sources
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if let Some(path) = self.stdlib_path {
            config.stdlib_path = Some(path);
        }
        if let Some(include) = self.include_stdlib {
            config.include_stdlib = include;
        }
        config.include_paths.extend(self.include_paths);

        Ok(config)
    }
}
