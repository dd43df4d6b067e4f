use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the tarkov-wiki binary.
#[derive(Debug, Parser)]
#[command(
    name = "tarkov-wiki",
    version,
    about = "Caching GraphQL proxy for the tarkov wiki"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TARKOV_WIKI_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Refetch list resources into the persisted cache and exit.
    Warm(WarmArgs),
    /// Delete persisted cache rows by key prefix and exit.
    Purge(PurgeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct WarmArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Languages to warm; defaults to every supported language.
    #[arg(long = "lang", value_name = "LANG")]
    pub languages: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Key prefix to delete, e.g. `cache:items:list:ja:`.
    #[arg(long = "prefix", value_name = "PREFIX")]
    pub prefix: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the upstream GraphQL endpoint.
    #[arg(long = "upstream-endpoint", value_name = "URL")]
    pub upstream_endpoint: Option<String>,

    /// Override the upstream request timeout in milliseconds.
    #[arg(long = "upstream-timeout-ms", value_name = "MS")]
    pub upstream_timeout_ms: Option<u64>,

    /// Override how long list resources stay fresh.
    #[arg(long = "catalog-list-ttl-seconds", value_name = "SECONDS")]
    pub catalog_list_ttl_seconds: Option<u64>,

    /// Override how long item details stay fresh.
    #[arg(long = "catalog-detail-ttl-seconds", value_name = "SECONDS")]
    pub catalog_detail_ttl_seconds: Option<u64>,

    /// Override the fallback language.
    #[arg(long = "catalog-default-language", value_name = "LANG")]
    pub catalog_default_language: Option<String>,

    /// Override the supported languages (repeatable).
    #[arg(long = "catalog-supported-language", value_name = "LANG")]
    pub catalog_supported_languages: Vec<String>,

    /// Override the default item page size.
    #[arg(long = "catalog-default-page-size", value_name = "COUNT")]
    pub catalog_default_page_size: Option<u32>,

    /// Toggle the revalidation tag tier.
    #[arg(
        long = "revalidation-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub revalidation_enabled: Option<bool>,

    /// Override how long rendered responses are served.
    #[arg(long = "revalidation-ttl-seconds", value_name = "SECONDS")]
    pub revalidation_ttl_seconds: Option<u64>,

    /// Override the number of rendered responses kept.
    #[arg(long = "revalidation-response-limit", value_name = "COUNT")]
    pub revalidation_response_limit: Option<u64>,

    /// Override the largest response body stored, in bytes.
    #[arg(long = "revalidation-body-limit-bytes", value_name = "BYTES")]
    pub revalidation_body_limit_bytes: Option<u64>,

    /// Override the rate limit window size.
    #[arg(long = "rate-limit-window-seconds", value_name = "SECONDS")]
    pub rate_limit_window_seconds: Option<u64>,

    /// Override the rate limit request ceiling.
    #[arg(long = "rate-limit-max-requests", value_name = "COUNT")]
    pub rate_limit_max_requests: Option<u64>,
}
