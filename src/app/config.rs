//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// File configuration for archiver defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Root directory for captured sites.
    pub output_dir: Option<PathBuf>,
    /// Directory holding `cookies-<site>.json` seed files.
    pub cookies_dir: Option<PathBuf>,
    /// Chrome/Chromium executable.
    pub chrome_path: Option<PathBuf>,
    /// Run the browser without a window.
    pub headless: Option<bool>,
    /// Quiet period before a page counts as network-idle, in milliseconds.
    pub idle_time_ms: Option<u64>,
    /// Upper bound on one network-idle wait, in seconds.
    pub idle_timeout_secs: Option<u64>,
    /// Time allowed for a manual login, in seconds.
    pub login_wait_secs: Option<u64>,
    /// Redirects followed per download.
    pub max_redirects: Option<usize>,
    /// Download client connect timeout in seconds.
    pub download_connect_timeout_secs: Option<u64>,
    /// Download client read timeout in seconds.
    pub download_read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_range("idle_time_ms", self.idle_time_ms, 0..=60_000)?;
        validate_range("idle_timeout_secs", self.idle_timeout_secs, 1..=3600)?;
        validate_range("login_wait_secs", self.login_wait_secs, 0..=3600)?;
        validate_range(
            "max_redirects",
            self.max_redirects.map(|n| n as u64),
            1..=50,
        )?;
        validate_range(
            "download_connect_timeout_secs",
            self.download_connect_timeout_secs,
            1..=3600,
        )?;
        validate_range(
            "download_read_timeout_secs",
            self.download_read_timeout_secs,
            1..=3600,
        )?;
        Ok(())
    }
}

fn validate_range(
    field: &str,
    value: Option<u64>,
    range: std::ops::RangeInclusive<u64>,
) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !range.contains(&value) {
        bail!(
            "Invalid config value for `{field}`: {value}. Expected range: {}..={}",
            range.start(),
            range.end()
        );
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the tracing level this setting maps to.
    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/archiver/config.toml`
/// 2. `$HOME/.config/archiver/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("archiver")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("archiver")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path; a missing file yields defaults.
pub fn load_default_file_config() -> Result<FileConfig> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
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
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_number = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "output_dir" => {
                cfg.output_dir = Some(parse_string_literal(value).with_context(context)?.into());
            }
            "cookies_dir" => {
                cfg.cookies_dir = Some(parse_string_literal(value).with_context(context)?.into());
            }
            "chrome_path" => {
                cfg.chrome_path = Some(parse_string_literal(value).with_context(context)?.into());
            }
            "headless" => cfg.headless = Some(parse_boolean(value).with_context(context)?),
            "idle_time_ms" => cfg.idle_time_ms = Some(parse_integer_u64(value).with_context(context)?),
            "idle_timeout_secs" => {
                cfg.idle_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "login_wait_secs" => {
                cfg.login_wait_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "max_redirects" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let n = usize::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_redirects out of range for usize"))?;
                cfg.max_redirects = Some(n);
            }
            "download_connect_timeout_secs" => {
                cfg.download_connect_timeout_secs =
                    Some(parse_integer_u64(value).with_context(context)?);
            }
            "download_read_timeout_secs" => {
                cfg.download_read_timeout_secs =
                    Some(parse_integer_u64(value).with_context(context)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
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
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
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

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
