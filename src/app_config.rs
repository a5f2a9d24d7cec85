//! File configuration and the effective settings for a run.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ghfetch_core::DownloaderConfig;

use crate::cli::Args;

/// Values read from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Retries after an attempt times out.
    pub max_retries: Option<u8>,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Maximum accepted file size in bytes.
    pub max_file_size_bytes: Option<u64>,
    /// Directory downloads are saved into.
    pub output_dir: Option<PathBuf>,
    /// Location of the state database.
    pub state_db: Option<PathBuf>,
}

impl FileConfig {
    /// Checks values against the same ranges the CLI enforces.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_retries) = self.max_retries
            && max_retries > 10
        {
            bail!("Invalid config value for `max_retries`: {max_retries}. Expected range: 0..=10");
        }

        if let Some(timeout_secs) = self.timeout_secs
            && !(1..=3600).contains(&timeout_secs)
        {
            bail!(
                "Invalid config value for `timeout_secs`: {timeout_secs}. Expected range: 1..=3600"
            );
        }

        if self.max_file_size_bytes == Some(0) {
            bail!("Invalid config value for `max_file_size_bytes`: 0. Expected a positive size");
        }

        Ok(())
    }
}

/// Settings for one run after merging CLI flags, file values and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub state_db: PathBuf,
    pub config: DownloaderConfig,
}

impl Settings {
    /// CLI flags override file values, which override built-in defaults.
    pub fn resolve(args: &Args, file: Option<&FileConfig>) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();
        let mut config = DownloaderConfig::default();

        if let Some(max_retries) = args.max_retries.or(file.max_retries) {
            config = config.with_max_retries(u32::from(max_retries));
        }
        if let Some(timeout_secs) = args.timeout_secs.or(file.timeout_secs) {
            config = config.with_attempt_timeout(Duration::from_secs(timeout_secs));
        }
        if let Some(max_size) = args.max_size.or(file.max_file_size_bytes) {
            config = config.with_max_file_size(max_size);
        }

        let output_dir = args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let state_db = match args.state_db.clone().or(file.state_db) {
            Some(path) => path,
            None => resolve_default_state_db_path().context(
                "Cannot locate a data directory for the state database; pass --state-db",
            )?,
        };

        Ok(Self {
            output_dir,
            state_db,
            config,
        })
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/ghfetch/config.toml`
/// 2. `$HOME/.config/ghfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("ghfetch").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("ghfetch")
            .join("config.toml"),
    )
}

/// Resolves the default state database path.
///
/// Priority:
/// 1. `$XDG_DATA_HOME/ghfetch/state.db`
/// 2. `$HOME/.local/share/ghfetch/state.db`
#[must_use]
pub fn resolve_default_state_db_path() -> Option<PathBuf> {
    if let Some(xdg_data_home) = env_var_non_empty_os("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg_data_home).join("ghfetch").join("state.db"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("ghfetch")
            .join("state.db"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from the default path, if one exists.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "max_retries" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let n = u8::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_retries out of range for u8"))
                    .with_context(invalid)?;
                cfg.max_retries = Some(n);
            }
            "timeout_secs" => {
                cfg.timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "max_file_size_bytes" => {
                cfg.max_file_size_bytes = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "state_db" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.state_db = Some(PathBuf::from(parsed));
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    let Some(inner) = raw_value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        bail!("Expected double-quoted string");
    };
    Ok(inner.to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
