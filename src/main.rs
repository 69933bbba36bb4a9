mod config;
mod constants;
mod context;
mod database;
mod errors;
mod handlers;
mod middleware;
mod models;
mod openapi;
mod repositories;
mod routes;
mod services;
mod utils;
mod validators;

use std::io;
use std::sync::Arc;

use actix_governor::Governor;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::config::{init_logger, Config};
use crate::context::ContextSettings;
use crate::database::Database;
use crate::errors::error_chain;
use crate::middleware::{build_cors, build_rate_limiter_config, RequestIdMiddleware};
use crate::repositories::{PgUserRepository, UserRepository};
use crate::services::{UserService, UserServiceImpl};

const ACCESS_LOG_FORMAT: &str = "%{x-request-id}o %a \"%r\" %s %b %Dms \"%{User-Agent}i\"";

#[actix_web::main]
async fn main() -> io::Result<()> {
    // A missing .env file is fine; the process environment is authoritative
    dotenv::dotenv().ok();
    let config = Config::from_env().map_err(startup_error)?;
    init_logger(&config).map_err(io::Error::other)?;
    info!("Loaded configuration: {:?}", config);

    info!("Connecting to PostgreSQL...");
    let database = Database::connect(&config.pool_settings())
        .await
        .map_err(startup_error)?;
    database.migrate().await.map_err(startup_error)?;
    info!("Database migrations applied");

    let repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(database.clone()));
    let user_service: Arc<dyn UserService> = Arc::new(UserServiceImpl::new(repository));
    let user_service = web::Data::from(user_service);

    let shutdown = CancellationToken::new();
    let context_settings =
        web::Data::new(ContextSettings::new(config.write_timeout, shutdown.clone()));
    let rate_limiter =
        build_rate_limiter_config(config.rate_limit_max, config.rate_limit_expiration)
            .map_err(startup_error)?;
    let cors_origins = config.cors_origins.clone();

    info!("Starting server at http://{}:{}", config.host, config.port);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(user_service.clone())
            .app_data(context_settings.clone())
            .configure(routes::configure_routes)
            .wrap(NormalizePath::trim())
            .wrap(Governor::new(&rate_limiter))
            .wrap(build_cors(&cors_origins))
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(ACCESS_LOG_FORMAT))
    })
    .client_request_timeout(config.read_timeout)
    .keep_alive(config.idle_timeout)
    .shutdown_timeout(config.shutdown_timeout.as_secs())
    .disable_signals()
    .bind((config.host.as_str(), config.port))?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping server");
        shutdown.cancel();
        handle.stop(true).await;
    });

    server.await?;

    database.close().await;
    info!("Server stopped");
    log::logger().flush();
    Ok(())
}

fn startup_error(err: impl std::error::Error) -> io::Error {
    io::Error::other(error_chain(&err))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
        }
    }
}
