use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use tarkov_wiki::{
    application::{
        catalog::{CatalogConfig, CatalogService},
        error::AppError,
        invalidation::InvalidationService,
        repos::{CacheStore, SessionLookup},
        upstream::UpstreamSource,
    },
    cache::{TagTier, TagTierConfig},
    config,
    domain::types::Language,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState, RateLimiter},
        memory::{InMemoryCacheStore, NoSessions},
        telemetry,
        upstream::GraphqlClient,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Warm(args) => run_warm(settings, args).await,
        config::Command::Purge(args) => run_purge(settings, args).await,
    }
}

struct Stores {
    cache: Arc<dyn CacheStore>,
    sessions: Arc<dyn SessionLookup>,
}

async fn init_stores(settings: &config::Settings) -> Result<Stores, AppError> {
    let Some(database_url) = settings.database.url.as_deref() else {
        warn!(
            target: "tarkov_wiki::startup",
            "database url is not configured; using the in-memory cache store"
        );
        return Ok(Stores {
            cache: Arc::new(InMemoryCacheStore::new()),
            sessions: Arc::new(NoSessions),
        });
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    Ok(Stores {
        cache: repositories.clone(),
        sessions: repositories,
    })
}

fn build_catalog(
    settings: &config::Settings,
    store: Arc<dyn CacheStore>,
) -> Result<CatalogService, AppError> {
    let upstream: Arc<dyn UpstreamSource> =
        Arc::new(GraphqlClient::new(&settings.upstream).map_err(AppError::from)?);
    let config = CatalogConfig {
        list_ttl: settings.catalog.list_ttl,
        detail_ttl: settings.catalog.detail_ttl,
    };
    Ok(CatalogService::new(store, upstream, config))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let stores = init_stores(&settings).await?;
    let catalog = Arc::new(build_catalog(&settings, stores.cache.clone())?);

    let tier_config = TagTierConfig::from(&settings.revalidation);
    let tier = tier_config
        .enabled
        .then(|| Arc::new(TagTier::new(tier_config)));
    let invalidation = Arc::new(InvalidationService::new(tier.clone(), stores.cache));

    let state = HttpState {
        catalog,
        invalidation,
        sessions: stores.sessions,
        languages: Arc::new(settings.catalog.language_policy()),
        default_page_size: settings.catalog.default_page_size,
        tier,
        rate_limiter: RateLimiter::from_settings(&settings.rate_limit),
    };

    serve_http(&settings, state).await
}

async fn run_warm(settings: config::Settings, args: config::WarmArgs) -> Result<(), AppError> {
    let policy = settings.catalog.language_policy();
    let languages = if args.languages.is_empty() {
        policy.supported().to_vec()
    } else {
        args.languages
            .iter()
            .map(|raw| {
                let lang = Language::parse(raw)?;
                if policy.supported().contains(&lang) {
                    Ok(lang)
                } else {
                    Err(AppError::validation(format!(
                        "language `{lang}` is not in catalog.supported_languages"
                    )))
                }
            })
            .collect::<Result<Vec<_>, AppError>>()?
    };

    let stores = init_stores(&settings).await?;
    let catalog = build_catalog(&settings, stores.cache)?;

    for lang in &languages {
        let report = catalog
            .warm(lang)
            .await
            .map_err(|err| AppError::unexpected(format!("warming `{lang}` failed: {err}")))?;
        info!(
            target: "tarkov_wiki::warm",
            lang = %lang,
            items = report.items,
            traders = report.traders,
            tasks = report.tasks,
            "Warm completed"
        );
    }
    Ok(())
}

async fn run_purge(settings: config::Settings, args: config::PurgeArgs) -> Result<(), AppError> {
    let prefix = args.prefix.trim();
    if prefix.is_empty() {
        return Err(AppError::validation("purge requires a non-empty --prefix"));
    }

    let stores = init_stores(&settings).await?;
    let purged = stores.cache.delete_by_prefix(prefix).await?;
    info!(target: "tarkov_wiki::purge", prefix, purged, "Purge completed");
    Ok(())
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target: "tarkov_wiki::startup",
        addr = %settings.server.addr,
        "Listening"
    );

    let draining = Arc::new(Notify::new());
    let deadline = draining.notified();
    let trigger = Arc::clone(&draining);
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            trigger.notify_waiters();
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = drain_deadline(deadline, grace) => {
            warn!(
                target: "tarkov_wiki::shutdown",
                grace_seconds = grace.as_secs(),
                "Connections still open after the grace period; exiting"
            );
        }
    }

    Ok(())
}

async fn drain_deadline(started: tokio::sync::futures::Notified<'_>, grace: Duration) {
    started.await;
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(target: "tarkov_wiki::shutdown", "Shutdown signal received; draining connections");
}
