use std::{future::IntoFuture, process, sync::Arc};

use photofeed::{
    application::{
        assembler::PostAssembler,
        content::ContentService,
        error::AppError,
        invalidation::Invalidator,
        repos::{CommentsRepo, PostsRepo, UsersRepo},
        timeline::TimelineService,
        users::UserLookup,
    },
    cache::{CacheClient, CacheConfig, CacheStore, LocalStore},
    config,
    infra::{
        cache::RedisStore,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, DatabaseHealth, HttpState},
        telemetry,
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
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn connect_database(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    Ok(pool)
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    info!("migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let cache_config = CacheConfig::from(&settings.cache);
    let store = build_cache_store(&settings.cache, &cache_config)?;
    let state = build_http_state(repositories, store, cache_config);

    serve_http(&settings, state).await
}

fn build_cache_store(
    settings: &config::CacheSettings,
    cache_config: &CacheConfig,
) -> Result<Arc<dyn CacheStore>, AppError> {
    match settings.url.as_deref() {
        Some(url) => {
            info!(backend = "redis", "cache store configured");
            Ok(Arc::new(RedisStore::connect(url)?))
        }
        None => {
            info!(
                backend = "local",
                capacity = cache_config.local_capacity,
                "cache store configured"
            );
            Ok(Arc::new(LocalStore::new(cache_config)))
        }
    }
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    store: Arc<dyn CacheStore>,
    cache_config: CacheConfig,
) -> HttpState {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let health: Arc<dyn DatabaseHealth> = repositories;

    let cache = CacheClient::new(store, cache_config.timeout);
    let users = UserLookup::new(users_repo.clone(), cache.clone(), cache_config.user_ttl);
    let assembler = PostAssembler::new(
        comments_repo.clone(),
        users.clone(),
        cache_config.page_size,
    );
    let invalidator = Invalidator::new(cache.clone(), users.clone(), posts_repo.clone());

    let timeline = TimelineService::new(
        users_repo.clone(),
        posts_repo.clone(),
        comments_repo.clone(),
        assembler,
        cache,
        cache_config,
    );
    let content = ContentService::new(users_repo, posts_repo, comments_repo, invalidator);

    HttpState {
        users,
        timeline: Arc::new(timeline),
        content: Arc::new(content),
        db: health,
    }
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "listening");

    let shutdown = Arc::new(Notify::new());
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .into_future(),
    );

    tokio::select! {
        joined = &mut server => return server_outcome(joined),
        () = shutdown_signal() => {}
    }

    info!("shutdown signal received, draining connections");
    shutdown.notify_one();
    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(joined) => server_outcome(joined),
        Err(_) => {
            warn!(
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out"
            );
            Ok(())
        }
    }
}

fn server_outcome(
    joined: Result<Result<(), std::io::Error>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(result) => result.map_err(|err| AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
