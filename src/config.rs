use anyhow::{Context, Result, anyhow, bail};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use clap::{Parser, ValueEnum};
use std::{env, path::PathBuf};

use crate::services::{
    config_store::is_valid_table_name,
    manifest::{ManifestOptions, TimeDisplay},
};

const ENV_PREFIX: &str = "DOWNLOAD_LISTER_";

/// Where the configuration record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigBackend {
    Dynamodb,
    Sqlite,
}

/// What the process does after configuration is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Serve,
    Migrate,
    Event(PathBuf),
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: ConfigBackend,
    pub config_table: String,
    pub database_url: String,
    /// Injected bucket; when set, no configuration table is consulted.
    pub data_bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub time_display: TimeDisplay,
    pub keep_temp_artifacts: bool,
    pub max_list_pages: Option<u32>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Lists a user's downloadable files")]
pub struct Args {
    /// Host to bind to (overrides DOWNLOAD_LISTER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides DOWNLOAD_LISTER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Configuration store backend (overrides DOWNLOAD_LISTER_CONFIG_BACKEND)
    #[arg(long, value_enum)]
    pub config_backend: Option<ConfigBackend>,

    /// Configuration table name (overrides DOWNLOAD_LISTER_CONFIG_TABLE)
    #[arg(long)]
    pub config_table: Option<String>,

    /// SQLite URL for the sqlite backend (overrides DOWNLOAD_LISTER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Use this bucket instead of reading the configuration table
    /// (overrides DOWNLOAD_LISTER_DATA_BUCKET)
    #[arg(long)]
    pub data_bucket: Option<String>,

    /// AWS region (overrides DOWNLOAD_LISTER_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint override, e.g. LocalStack (overrides DOWNLOAD_LISTER_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// `local` or an IANA zone for Start/End (overrides DOWNLOAD_LISTER_TIME_ZONE)
    #[arg(long)]
    pub time_zone: Option<String>,

    /// Include `part-*` files in the manifest
    #[arg(long)]
    pub keep_temp_artifacts: bool,

    /// Stop listing after this many pages (overrides DOWNLOAD_LISTER_MAX_LIST_PAGES)
    #[arg(long)]
    pub max_list_pages: Option<u32>,

    /// Create the SQLite configuration table and exit
    #[arg(long)]
    pub migrate: bool,

    /// Handle one request envelope read from this JSON file, print the response and exit
    #[arg(long, conflicts_with = "migrate")]
    pub event: Option<PathBuf>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and run mode.
    pub fn from_env_and_args() -> Result<(Self, RunMode)> {
        Self::from_parts(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge `args` over variables looked up by `env` over defaults.
    pub fn from_parts(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<(Self, RunMode)> {
        let var = |suffix: &str| env(&format!("{ENV_PREFIX}{suffix}")).filter(|v| !v.is_empty());

        let port = match args.port {
            Some(port) => port,
            None => match var("PORT") {
                Some(value) => value
                    .parse::<u16>()
                    .with_context(|| format!("parsing {ENV_PREFIX}PORT value `{}`", value))?,
                None => 3000,
            },
        };

        let backend = match args.config_backend {
            Some(backend) => backend,
            None => match var("CONFIG_BACKEND") {
                Some(value) => ConfigBackend::from_str(&value, true).map_err(|err| {
                    anyhow!("parsing {ENV_PREFIX}CONFIG_BACKEND value `{}`: {}", value, err)
                })?,
                None => ConfigBackend::Dynamodb,
            },
        };

        let config_table = args
            .config_table
            .or_else(|| var("CONFIG_TABLE"))
            .unwrap_or_else(|| "BDDMainTable".into());
        if !is_valid_table_name(&config_table) {
            bail!("invalid configuration table name `{}`", config_table);
        }

        let time_zone = args
            .time_zone
            .or_else(|| var("TIME_ZONE"))
            .unwrap_or_else(|| "America/New_York".into());
        let time_display = TimeDisplay::from_name(&time_zone)
            .ok_or_else(|| anyhow!("unknown time zone `{}`", time_zone))?;

        let keep_temp_artifacts = args.keep_temp_artifacts
            || var("KEEP_TEMP_ARTIFACTS")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false);

        let max_list_pages = match args.max_list_pages {
            Some(pages) => Some(pages),
            None => var("MAX_LIST_PAGES")
                .map(|value| {
                    value.parse::<u32>().with_context(|| {
                        format!("parsing {ENV_PREFIX}MAX_LIST_PAGES value `{}`", value)
                    })
                })
                .transpose()?,
        };
        if max_list_pages == Some(0) {
            bail!("max list pages must be at least 1");
        }

        let cfg = Self {
            host: args
                .host
                .or_else(|| var("HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port,
            backend,
            config_table,
            database_url: args
                .database_url
                .or_else(|| var("DATABASE_URL"))
                .unwrap_or_else(|| "sqlite://./data/config.db".into()),
            data_bucket: args.data_bucket.or_else(|| var("DATA_BUCKET")),
            region: args.region.or_else(|| var("REGION")),
            endpoint_url: args.endpoint_url.or_else(|| var("ENDPOINT_URL")),
            time_display,
            keep_temp_artifacts,
            max_list_pages,
        };

        let mode = match (args.migrate, args.event) {
            (true, _) => RunMode::Migrate,
            (false, Some(path)) => RunMode::Event(path),
            (false, None) => RunMode::Serve,
        };

        Ok((cfg, mode))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn manifest_options(&self) -> ManifestOptions {
        ManifestOptions {
            skip_temp_artifacts: !self.keep_temp_artifacts,
            display: self.time_display,
        }
    }

    /// Load shared AWS SDK configuration with region/endpoint overrides applied.
    pub async fn aws_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        loader.load().await
    }
}
