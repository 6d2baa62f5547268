//! # Agora API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[cfg(feature = "rate-limit")]
use {
    agora_infra::InMemoryRateLimiter, middleware::rate_limit::RateLimitMiddleware,
    std::sync::Arc,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry);

    let config = AppConfig::from_env();

    tracing::info!(
        service = %telemetry.service_name,
        "Starting Agora API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await;

    #[cfg(feature = "rate-limit")]
    let limiter = {
        let limiter = InMemoryRateLimiter::new(config.rate_limit.clone())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let limiter = Arc::new(limiter);

        // Idle buckets would otherwise accumulate one entry per client forever
        let pruned = Arc::clone(&limiter);
        let every = config.rate_limit.window;
        actix_rt::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                pruned.prune();
            }
        });
        limiter
    };

    tokio::fs::create_dir_all(&config.media.root).await?;
    let media_root = config.media.root.clone();
    let media_prefix = config.media.url_prefix.clone();

    HttpServer::new(move || {
        let app = App::new();

        #[cfg(feature = "rate-limit")]
        let app = app.wrap(RateLimitMiddleware::new(limiter.clone()));

        app.wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .service(actix_files::Files::new(&media_prefix, &media_root))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
