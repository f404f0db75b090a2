mod cli;

use crate::cli::{LogFormat, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use pinhole_core::Repository;
use pinhole_generator::RandomGenerator;
use pinhole_proto_schema::v1::shortener_service_server::ShortenerServiceServer;
use pinhole_shortener::{ShortenerConfig, ShortenerGrpcServer, ShortenerService};
use pinhole_storage::{InMemoryRepository, SqliteRepository};
use tokio::signal;
use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = CLI::try_parse()?;
    init_tracing(cli.log_format);

    let config = ShortenerConfig::builder()
        .code_length(cli.code_length)
        .max_attempts(cli.max_attempts)
        .reuse_existing_alias(cli.reuse_existing_alias)
        .operation_timeout(cli.request_timeout())
        .build();

    info!(
        listen_addr = %cli.listen_addr,
        storage_backend = %cli.storage,
        url_uniqueness = ?cli.url_uniqueness,
        code_length = config.code_length,
        max_attempts = config.max_attempts,
        reuse_existing_alias = config.reuse_existing_alias,
        "starting shortener gRPC server"
    );

    match cli.storage {
        StorageBackendArg::InMemory => {
            let repository = InMemoryRepository::with_url_uniqueness(cli.url_uniqueness.into());
            run_server(&cli, repository, config).await?;
        }
        StorageBackendArg::Sqlite => {
            let sqlite_url = cli
                .sqlite_url
                .as_deref()
                .context("sqlite url is required when storage backend is sqlite")?;
            let repository = SqliteRepository::connect(sqlite_url, cli.url_uniqueness.into())
                .await
                .with_context(|| format!("failed to open sqlite database at {sqlite_url}"))?;
            run_server(&cli, repository, config).await?;
        }
    }

    info!("shortener gRPC server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run_server<R: Repository>(
    cli: &CLI,
    repository: R,
    config: ShortenerConfig,
) -> anyhow::Result<()> {
    let service = ShortenerService::try_new(repository, RandomGenerator::new(), config)
        .context("invalid shortener configuration")?;
    let grpc = ShortenerGrpcServer::new(service);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ShortenerServiceServer<ShortenerGrpcServer<ShortenerService<R, RandomGenerator>>>>()
        .await;

    let mut builder = Server::builder();
    if let Some(timeout) = cli.request_timeout() {
        builder = builder.timeout(timeout);
    }

    builder
        .add_service(health_service)
        .add_service(grpc.into_service())
        .serve_with_shutdown(cli.listen_addr, shutdown_signal())
        .await
        .with_context(|| format!("gRPC server on {} failed", cli.listen_addr))
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
