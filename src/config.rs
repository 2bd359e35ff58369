use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::cli::Cli;
use crate::client::{INITIAL_BACKOFF_MS, MAX_ATTEMPTS, PIPEFY_API_URL, RetryPolicy};
use crate::error::{Error, Result};
use crate::render::OutputFormat;

pub const DEFAULT_CONFIG_FILE: &str = "pipeboard.toml";
pub const DEFAULT_TOKEN_ENV: &str = "PIPEFY_TOKEN";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub pipe_id: Option<String>,
    pub api_url: Option<String>,
    pub token_env: Option<String>,
    pub page_size: Option<u32>,
    pub cache_ttl: Option<u64>,
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub completed_phases: Option<Vec<String>>,
    pub excluded_labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub pipe_id: String,
    pub api_url: String,
    pub token_env: String,
    pub page_size: u32,
    pub cache_ttl: u64,
    pub retry: RetryPolicy,
    pub completed_phases: Vec<String>,
    pub excluded_labels: Vec<String>,
    pub format: OutputFormat,
    pub watch: Option<u64>,
}

impl Config {
    /// Load the config file (explicit `--config` must exist; the default may be
    /// absent) and merge it with CLI flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config.as_deref() {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    ConfigFile::default()
                }
            }
        };

        merge(file_config, cli)
    }

    /// The API token from the configured environment variable. Empty when unset;
    /// the client rejects an empty token before making any request.
    pub fn token(&self) -> String {
        std::env::var(&self.token_env).unwrap_or_default()
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(page_size) = config.page_size
        && page_size == 0
    {
        return Err(Error::ConfigValidation("page_size must be > 0".to_string()));
    }
    if let Some(attempts) = config.max_attempts
        && attempts == 0
    {
        return Err(Error::ConfigValidation(
            "max_attempts must be > 0".to_string(),
        ));
    }
    if let Some(ref pipe_id) = config.pipe_id
        && pipe_id.trim().is_empty()
    {
        return Err(Error::ConfigValidation(
            "pipe_id must not be empty".to_string(),
        ));
    }
    if let Some(ref token_env) = config.token_env
        && token_env.trim().is_empty()
    {
        return Err(Error::ConfigValidation(
            "token_env must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Result<Config> {
    let pipe_id = cli.pipe_id.clone().or(file.pipe_id).ok_or_else(|| {
        Error::ConfigValidation(format!(
            "pipe_id is required (--pipe-id or pipe_id in {DEFAULT_CONFIG_FILE})"
        ))
    })?;

    Ok(Config {
        pipe_id,
        api_url: file.api_url.unwrap_or_else(|| PIPEFY_API_URL.to_string()),
        token_env: file
            .token_env
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
        page_size: cli
            .page_size
            .or(file.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE),
        cache_ttl: cli
            .cache_ttl
            .or(file.cache_ttl)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS),
        retry: RetryPolicy {
            max_attempts: file.max_attempts.unwrap_or(MAX_ATTEMPTS),
            initial_backoff_ms: file.initial_backoff_ms.unwrap_or(INITIAL_BACKOFF_MS),
        },
        completed_phases: non_empty_or(&cli.completed_phases, file.completed_phases),
        excluded_labels: non_empty_or(&cli.exclude_labels, file.excluded_labels),
        format: cli.format,
        watch: cli.watch,
    })
}

fn non_empty_or(cli: &[String], file: Option<Vec<String>>) -> Vec<String> {
    if cli.is_empty() {
        file.unwrap_or_default()
    } else {
        cli.to_vec()
    }
}
