//! Config command implementation.
//!
//! View and create configuration settings.
//! Config file is located at ~/.config/ifilter/config.toml.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use icinga_filter::convert::{BackendKind, ColumnMap};
use icinga_filter::filter::ParserOptions;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};
use crate::cli::PrecedenceArg;

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# ifilter - Icinga Web filter tool configuration

# Config schema version (do not modify)
version = 1

# How `&` and `|` bind: "and-binds-tighter" or "left-to-right"
# precedence = "and-binds-tighter"

# Backend used by `ifilter compile` without --backend: "ido", "livestatus" or "statusdat"
# backend = "ido"

[filter]
# Conditions on other columns are dropped while parsing
# allowed_columns = ["host", "service", "state", "handled", "last_check"]

# Columns whose values are time strings such as "-1 day"
# timestamp_columns = ["last_check"]

# Column mappings per backend. A backend without a section maps every
# column to itself.
#
# [backends.ido]
# passthrough = false
# timestamps = ["last_check"]
#
# [backends.ido.columns]
# host = "h.display_name"
# service = "s.display_name"
# state = "ss.current_state"
# last_check = "UNIX_TIMESTAMP(ss.last_check)"
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default conjunction precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence: Option<PrecedenceArg>,

    /// Default backend for `compile`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    /// Parser settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Column mappings keyed by backend name.
    #[serde(default)]
    pub backends: BTreeMap<String, ColumnMap>,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            precedence: None,
            backend: None,
            filter: FilterConfig::default(),
            backends: BTreeMap::new(),
        }
    }
}

/// Parser configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// If set, conditions on other columns are dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_columns: Option<Vec<String>>,

    /// Columns whose values are time strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timestamp_columns: Vec<String>,
}

impl Config {
    /// Builds parser options, letting `precedence` override the configured one.
    pub fn parser_options(&self, precedence: Option<PrecedenceArg>) -> ParserOptions {
        let mut options = ParserOptions::default()
            .with_timestamp_columns(self.filter.timestamp_columns.iter().cloned());
        if let Some(precedence) = precedence.or(self.precedence) {
            options = options.with_precedence(precedence.into());
        }
        if let Some(allowed) = &self.filter.allowed_columns {
            options = options.with_allowed_columns(allowed.iter().cloned());
        }
        options
    }

    /// Returns the backend used when none is given on the command line.
    pub fn default_backend(&self) -> BackendKind {
        self.backend.unwrap_or(BackendKind::Ido)
    }

    /// Returns the column map for `kind`.
    ///
    /// Backends without a section map every column to itself. The configured
    /// timestamp columns are always treated as timestamps.
    pub fn column_map(&self, kind: BackendKind) -> ColumnMap {
        let mut map = match self.backends.get(kind.as_str()) {
            Some(map) => map.clone(),
            None => ColumnMap {
                passthrough: true,
                ..ColumnMap::default()
            },
        };
        map.timestamps
            .extend(self.filter.timestamp_columns.iter().cloned());
        map
    }

    /// Returns every column the config knows about, used for proposals.
    pub fn known_columns(&self) -> BTreeSet<String> {
        if let Some(allowed) = &self.filter.allowed_columns {
            return allowed.iter().cloned().collect();
        }
        let mut columns: BTreeSet<String> = self
            .backends
            .values()
            .flat_map(|map| map.columns.keys().cloned())
            .collect();
        columns.extend(self.filter.timestamp_columns.iter().cloned());
        columns
    }

    /// Checks that every `[backends.*]` section names a known backend.
    fn validate(&self) -> Result<()> {
        for name in self.backends.keys() {
            name.parse::<BackendKind>()
                .map_err(|e| CommandError::Config(format!("[backends.{name}]: {e}")))?;
        }
        Ok(())
    }
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/ifilter/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("ifilter"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("ifilter"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    // Check for override env var first
    if let Ok(path) = env::var("IFILTER_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
///
/// A missing file yields the default configuration.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        debug!("no config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config = parse_config(&content)?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Parses and validates config file contents.
fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if !path.exists() {
            println!("(No config file exists. Run 'ifilter config init' to create one.)");
            return Ok(());
        }

        println!("Settings:");
        if let Some(precedence) = config.precedence {
            println!("  precedence: {:?}", precedence);
        }
        println!("  backend: {}", config.default_backend());

        println!("\n[filter]");
        if let Some(ref allowed) = config.filter.allowed_columns {
            println!("  allowed_columns: {}", allowed.join(", "));
        }
        if !config.filter.timestamp_columns.is_empty() {
            println!(
                "  timestamp_columns: {}",
                config.filter.timestamp_columns.join(", ")
            );
        }

        for (name, map) in &config.backends {
            println!("\n[backends.{}]", name);
            println!("  passthrough: {}", map.passthrough);
            for (column, mapped) in &map.columns {
                println!("  {} -> {}", column, mapped);
            }
        }
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    // Ensure directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}
