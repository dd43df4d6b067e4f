//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::types::{Language, LanguagePolicy};

pub use cli::{
    CliArgs, Command, DatabaseOverride, PurgeArgs, ServeArgs, ServeOverrides, WarmArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tarkov-wiki";
const ENV_PREFIX: &str = "TARKOV_WIKI";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_UPSTREAM_ENDPOINT: &str = "https://api.tarkov.dev/graphql";
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_LIST_TTL_SECS: u64 = 2 * 60 * 60;
const DEFAULT_DETAIL_TTL_SECS: u64 = 60 * 60;
const DEFAULT_LANGUAGE: &str = "ja";
const DEFAULT_SUPPORTED_LANGUAGES: [&str; 2] = ["ja", "en"];
const DEFAULT_PAGE_SIZE: u32 = 50;
const DEFAULT_REVALIDATION_TTL_SECS: u64 = 60;
const DEFAULT_REVALIDATION_RESPONSE_LIMIT: u64 = 256;
const DEFAULT_REVALIDATION_BODY_LIMIT_BYTES: u64 = 4 * 1024 * 1024;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u64 = 100;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub upstream: UpstreamSettings,
    pub catalog: CatalogSettings,
    pub revalidation: RevalidationSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub endpoint: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub list_ttl: Duration,
    pub detail_ttl: Duration,
    pub default_language: Language,
    pub supported_languages: Vec<Language>,
    pub default_page_size: NonZeroU32,
}

impl CatalogSettings {
    pub fn language_policy(&self) -> LanguagePolicy {
        LanguagePolicy::new(
            self.default_language.clone(),
            self.supported_languages.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RevalidationSettings {
    pub enabled: bool,
    pub ttl_seconds: NonZeroU32,
    pub response_limit: NonZeroU32,
    pub body_limit_bytes: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window_seconds: NonZeroU32,
    pub max_requests: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("catalog.supported_languages")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Warm(args)) => raw.apply_database_override(&args.database),
        Some(Command::Purge(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    upstream: RawUpstreamSettings,
    catalog: RawCatalogSettings,
    revalidation: RawRevalidationSettings,
    rate_limit: RawRateLimitSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(endpoint) = overrides.upstream_endpoint.as_ref() {
            self.upstream.endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = overrides.upstream_timeout_ms {
            self.upstream.timeout_ms = Some(timeout);
        }
        if let Some(ttl) = overrides.catalog_list_ttl_seconds {
            self.catalog.list_ttl_seconds = Some(ttl);
        }
        if let Some(ttl) = overrides.catalog_detail_ttl_seconds {
            self.catalog.detail_ttl_seconds = Some(ttl);
        }
        if let Some(lang) = overrides.catalog_default_language.as_ref() {
            self.catalog.default_language = Some(lang.clone());
        }
        if !overrides.catalog_supported_languages.is_empty() {
            self.catalog.supported_languages = Some(overrides.catalog_supported_languages.clone());
        }
        if let Some(size) = overrides.catalog_default_page_size {
            self.catalog.default_page_size = Some(size);
        }
        if let Some(enabled) = overrides.revalidation_enabled {
            self.revalidation.enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.revalidation_ttl_seconds {
            self.revalidation.ttl_seconds = Some(ttl);
        }
        if let Some(limit) = overrides.revalidation_response_limit {
            self.revalidation.response_limit = Some(limit);
        }
        if let Some(limit) = overrides.revalidation_body_limit_bytes {
            self.revalidation.body_limit_bytes = Some(limit);
        }
        if let Some(window) = overrides.rate_limit_window_seconds {
            self.rate_limit.window_seconds = Some(window);
        }
        if let Some(max) = overrides.rate_limit_max_requests {
            self.rate_limit.max_requests = Some(max);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            upstream,
            catalog,
            revalidation,
            rate_limit,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            upstream: build_upstream_settings(upstream)?,
            catalog: build_catalog_settings(catalog)?,
            revalidation: build_revalidation_settings(revalidation)?,
            rate_limit: build_rate_limit_settings(rate_limit)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let raw_endpoint = upstream
        .endpoint
        .unwrap_or_else(|| DEFAULT_UPSTREAM_ENDPOINT.to_string());
    let endpoint = Url::parse(raw_endpoint.trim())
        .map_err(|err| LoadError::invalid("upstream.endpoint", format!("{err}")))?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "upstream.endpoint",
            "endpoint must use http or https",
        ));
    }

    let timeout_ms = upstream.timeout_ms.unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "upstream.timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(UpstreamSettings {
        endpoint,
        timeout: Duration::from_millis(timeout_ms),
    })
}

fn build_catalog_settings(catalog: RawCatalogSettings) -> Result<CatalogSettings, LoadError> {
    let list_ttl = positive_seconds(
        catalog.list_ttl_seconds.unwrap_or(DEFAULT_LIST_TTL_SECS),
        "catalog.list_ttl_seconds",
    )?;
    let detail_ttl = positive_seconds(
        catalog.detail_ttl_seconds.unwrap_or(DEFAULT_DETAIL_TTL_SECS),
        "catalog.detail_ttl_seconds",
    )?;

    let default_language = Language::parse(
        catalog
            .default_language
            .as_deref()
            .unwrap_or(DEFAULT_LANGUAGE),
    )
    .map_err(|err| LoadError::invalid("catalog.default_language", err.to_string()))?;

    let supported_languages = match catalog.supported_languages {
        Some(values) => values
            .iter()
            .map(|value| Language::parse(value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| LoadError::invalid("catalog.supported_languages", err.to_string()))?,
        None => DEFAULT_SUPPORTED_LANGUAGES
            .iter()
            .map(|value| Language::parse(value))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| LoadError::invalid("catalog.supported_languages", err.to_string()))?,
    };
    if !supported_languages.contains(&default_language) {
        return Err(LoadError::invalid(
            "catalog.default_language",
            format!("`{default_language}` is not in catalog.supported_languages"),
        ));
    }

    let default_page_size = non_zero_u32(
        catalog
            .default_page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .into(),
        "catalog.default_page_size",
    )?;

    Ok(CatalogSettings {
        list_ttl,
        detail_ttl,
        default_language,
        supported_languages,
        default_page_size,
    })
}

fn build_revalidation_settings(
    revalidation: RawRevalidationSettings,
) -> Result<RevalidationSettings, LoadError> {
    Ok(RevalidationSettings {
        enabled: revalidation.enabled.unwrap_or(true),
        ttl_seconds: non_zero_u32(
            revalidation
                .ttl_seconds
                .unwrap_or(DEFAULT_REVALIDATION_TTL_SECS),
            "revalidation.ttl_seconds",
        )?,
        response_limit: non_zero_u32(
            revalidation
                .response_limit
                .unwrap_or(DEFAULT_REVALIDATION_RESPONSE_LIMIT),
            "revalidation.response_limit",
        )?,
        body_limit_bytes: non_zero_u32(
            revalidation
                .body_limit_bytes
                .unwrap_or(DEFAULT_REVALIDATION_BODY_LIMIT_BYTES),
            "revalidation.body_limit_bytes",
        )?,
    })
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let window_seconds = non_zero_u32(
        rate_limit
            .window_seconds
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        "rate_limit.window_seconds",
    )?;
    let max_requests = non_zero_u32(
        rate_limit
            .max_requests
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
        "rate_limit.max_requests",
    )?;

    Ok(RateLimitSettings {
        window_seconds,
        max_requests,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    endpoint: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCatalogSettings {
    list_ttl_seconds: Option<u64>,
    detail_ttl_seconds: Option<u64>,
    default_language: Option<String>,
    supported_languages: Option<Vec<String>>,
    default_page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidationSettings {
    enabled: Option<bool>,
    ttl_seconds: Option<u64>,
    response_limit: Option<u64>,
    body_limit_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
