//! # Exam Prep Backend
//!
//! Backend for an exam-preparation platform with two surfaces:
//!
//! - **Question API**: Gemini-backed MCQ paper generation, syllabus lookup,
//!   and test evaluation under `/api/v1`
//! - **Interview relay**: the `/interview` WebSocket, which streams candidate
//!   audio to a Gemini Live session and relays AI speech and transcripts back
//!
//! ## Modules
//! - **config**: TOML + environment configuration
//! - **state**: shared state, metrics, and the generated-paper cache
//! - **gemini**: REST client for the Gemini generateContent API
//! - **questions**: generation, parsing, validation, caching, evaluation
//! - **interview**: WebSocket actor, session adapter, moderation, registry
//! - **health / middleware / handlers / error**: HTTP plumbing

mod config;
mod error;
mod gemini;
mod handlers;
mod health;
mod interview;
mod middleware;
mod questions;
mod state;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use interview::registry::InterviewRegistry;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting exam-prep-backend v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: {}:{}",
        config.server.host, config.server.port
    );
    if config.gemini.api_key.is_none() {
        // Interviews and generation will fail until the key is provided
        tracing::warn!("GEMINI_API_KEY is not set");
    }

    let app_state = AppState::new(config.clone());
    let registry = web::Data::new(InterviewRegistry::new(
        config.interview.max_concurrent_interviews,
    ));
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(registry.clone())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::MetricsMiddleware)
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health::health_check))
                    .route("/metrics", web::get().to(health::detailed_metrics))
                    .route("/config", web::get().to(handlers::get_config))
                    .route("/config", web::put().to(handlers::update_config))
                    .route(
                        "/questions/generate",
                        web::post().to(handlers::generate_questions),
                    )
                    .route("/syllabus/{exam}", web::get().to(handlers::get_syllabus))
                    .route("/evaluate", web::post().to(handlers::evaluate_test)),
            )
            .route(
                "/interview",
                web::get().to(interview::websocket::interview_websocket),
            )
            .route("/health", web::get().to(health::health_check))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "exam_prep_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
