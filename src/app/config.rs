//! Run configuration: `key = value` file loading, defaults and validation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use harvester_core::fetch::REQUEST_TIMEOUT_SECS;
use harvester_core::manifest::{DEFAULT_MANIFEST_NAME, DEFAULT_TABLE_NAME};
use harvester_core::user_agent::resolve_user_agent;
use harvester_core::{DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CONCURRENCY, SourceKind};

const DEFAULT_CATALOG_PATH: &str = "catalog.csv";
const DEFAULT_API_URL: &str = "https://nekos.best/api/v2/neko";
const DEFAULT_API_SOURCE: &str = "nekos.best";
const DEFAULT_TARGET_COUNT: usize = 50;
const DEFAULT_OUTPUT_DIR: &str = "static";
const DEFAULT_BASE_URL: &str = "https://adgsenpai.github.io/leagueoflegendsstaticapi/";
const DEFAULT_PUBLIC_PATH: &str = "static/";
const DEFAULT_API_PREFIX: &str = "neko";
const DEFAULT_CATALOG_PREFIX: &str = "lol_meme";
const DEFAULT_API_INDEX_WIDTH: usize = 3;
const DEFAULT_CATALOG_INDEX_WIDTH: usize = 0;

/// Values read from a config file. Unset keys fall back to defaults.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileConfig {
    pub(crate) mode: Option<SourceKind>,
    pub(crate) catalog_path: Option<PathBuf>,
    pub(crate) api_url: Option<String>,
    pub(crate) api_source: Option<String>,
    pub(crate) target_count: Option<u64>,
    pub(crate) concurrency: Option<u64>,
    pub(crate) checkpoint_interval: Option<u64>,
    pub(crate) request_timeout_secs: Option<u64>,
    pub(crate) request_delay_ms: Option<u64>,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) base_url: Option<String>,
    pub(crate) public_path: Option<String>,
    pub(crate) filename_prefix: Option<String>,
    pub(crate) index_width: Option<u64>,
    pub(crate) manifest_name: Option<String>,
    pub(crate) table_name: Option<String>,
    pub(crate) user_agent: Option<String>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_range("target_count", self.target_count, 1, 10_000)?;
        validate_range("concurrency", self.concurrency, 1, 100)?;
        validate_range("checkpoint_interval", self.checkpoint_interval, 1, u64::MAX)?;
        validate_range("request_timeout_secs", self.request_timeout_secs, 1, 3600)?;
        validate_range("request_delay_ms", self.request_delay_ms, 0, 60_000)?;
        validate_range("index_width", self.index_width, 0, 12)?;
        for (field, value) in [
            ("manifest_name", &self.manifest_name),
            ("table_name", &self.table_name),
        ] {
            if let Some(name) = value
                && (name.is_empty() || name.contains(['/', '\\']))
            {
                bail!("Invalid config value for `{field}`: '{name}'. Expected a plain file name");
            }
        }
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        if max == u64::MAX {
            bail!("Invalid config value for `{field}`: {value}. Expected at least {min}");
        }
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HarvestConfig {
    pub(crate) mode: SourceKind,
    pub(crate) catalog_path: PathBuf,
    pub(crate) api_url: String,
    pub(crate) api_source: String,
    pub(crate) target_count: usize,
    pub(crate) concurrency: usize,
    pub(crate) checkpoint_interval: usize,
    pub(crate) request_timeout: Duration,
    pub(crate) request_delay: Duration,
    pub(crate) output_dir: PathBuf,
    pub(crate) base_url: String,
    pub(crate) public_path: String,
    pub(crate) filename_prefix: String,
    pub(crate) index_width: usize,
    pub(crate) manifest_name: String,
    pub(crate) table_name: String,
    pub(crate) user_agent: String,
}

impl HarvestConfig {
    /// Applies defaults for every key the file leaves unset.
    pub(crate) fn resolve(file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        let mode = file.mode.unwrap_or(SourceKind::Api);
        let (default_prefix, default_width) = match mode {
            SourceKind::Api => (DEFAULT_API_PREFIX, DEFAULT_API_INDEX_WIDTH),
            SourceKind::Catalog => (DEFAULT_CATALOG_PREFIX, DEFAULT_CATALOG_INDEX_WIDTH),
        };

        Self {
            mode,
            catalog_path: file
                .catalog_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
            api_url: file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_source: file
                .api_source
                .unwrap_or_else(|| DEFAULT_API_SOURCE.to_string()),
            target_count: to_usize(file.target_count, DEFAULT_TARGET_COUNT),
            concurrency: to_usize(file.concurrency, DEFAULT_CONCURRENCY),
            checkpoint_interval: to_usize(file.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS),
            ),
            request_delay: Duration::from_millis(file.request_delay_ms.unwrap_or(0)),
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            base_url: file.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            public_path: file
                .public_path
                .unwrap_or_else(|| DEFAULT_PUBLIC_PATH.to_string()),
            filename_prefix: file
                .filename_prefix
                .unwrap_or_else(|| default_prefix.to_string()),
            index_width: to_usize(file.index_width, default_width),
            manifest_name: file
                .manifest_name
                .unwrap_or_else(|| DEFAULT_MANIFEST_NAME.to_string()),
            table_name: file
                .table_name
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            user_agent: resolve_user_agent(file.user_agent.as_deref()),
        }
    }

    /// Prefix joined with a filename to form its public URL.
    pub(crate) fn public_url_prefix(&self) -> String {
        format!("{}{}", self.base_url, self.public_path)
    }
}

fn to_usize(value: Option<u64>, default: usize) -> usize {
    value
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/image-harvester/config.toml`
/// 2. `$HOME/.config/image-harvester/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("image-harvester")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("image-harvester")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the run configuration.
///
/// An explicit path must exist. Without one, the default path is used when the
/// file is present; otherwise every setting takes its default.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<(HarvestConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let file = load_file_config(path)?;
        return Ok((HarvestConfig::resolve(Some(&file)), Some(path.to_path_buf())));
    }

    match resolve_default_config_path() {
        Some(path) if path.exists() => {
            let file = load_file_config(&path)?;
            Ok((HarvestConfig::resolve(Some(&file)), Some(path)))
        }
        _ => Ok((HarvestConfig::resolve(None), None)),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

pub(crate) fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let line_no = line_index + 1;
        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let ctx = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "mode" => {
                let parsed = parse_string_literal(value).with_context(ctx)?;
                cfg.mode = Some(parse_mode(&parsed).with_context(ctx)?);
            }
            "catalog_path" => {
                cfg.catalog_path = Some(PathBuf::from(
                    parse_string_literal(value).with_context(ctx)?,
                ));
            }
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(ctx)?,
                ));
            }
            "api_url" => cfg.api_url = Some(parse_string_literal(value).with_context(ctx)?),
            "api_source" => cfg.api_source = Some(parse_string_literal(value).with_context(ctx)?),
            "base_url" => cfg.base_url = Some(parse_string_literal(value).with_context(ctx)?),
            "public_path" => {
                cfg.public_path = Some(parse_string_literal(value).with_context(ctx)?);
            }
            "filename_prefix" => {
                cfg.filename_prefix = Some(parse_string_literal(value).with_context(ctx)?);
            }
            "manifest_name" => {
                cfg.manifest_name = Some(parse_string_literal(value).with_context(ctx)?);
            }
            "table_name" => cfg.table_name = Some(parse_string_literal(value).with_context(ctx)?),
            "user_agent" => cfg.user_agent = Some(parse_string_literal(value).with_context(ctx)?),
            "target_count" => cfg.target_count = Some(parse_integer_u64(value).with_context(ctx)?),
            "concurrency" => cfg.concurrency = Some(parse_integer_u64(value).with_context(ctx)?),
            "checkpoint_interval" => {
                cfg.checkpoint_interval = Some(parse_integer_u64(value).with_context(ctx)?);
            }
            "request_timeout_secs" => {
                cfg.request_timeout_secs = Some(parse_integer_u64(value).with_context(ctx)?);
            }
            "request_delay_ms" => {
                cfg.request_delay_ms = Some(parse_integer_u64(value).with_context(ctx)?);
            }
            "index_width" => cfg.index_width = Some(parse_integer_u64(value).with_context(ctx)?),
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
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

fn parse_mode(value: &str) -> Result<SourceKind> {
    match value {
        "api" => Ok(SourceKind::Api),
        "catalog" => Ok(SourceKind::Catalog),
        _ => bail!("Expected one of: api, catalog"),
    }
}
