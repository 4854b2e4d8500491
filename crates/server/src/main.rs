//! collexo-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, extract::DefaultBodyLimit, middleware};
use collexo_api::{AppState, router as api_router, trusted_society_header};
use collexo_common::{Config, LocalStorage};
use collexo_core::{FormService, SubmissionService};
use collexo_db::repositories::{FormRepository, FormResponseRepository};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the HTTP application.
fn build_app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn(trusted_society_header))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collexo=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting collexo-rs server...");

    // Load configuration
    let config = match std::env::var("COLLEXO_CONFIG") {
        Ok(path) => Config::from_file(&path),
        Err(_) => Config::load(),
    }
    .context("failed to load configuration")?;

    // Connect to database
    let db = Arc::new(collexo_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    collexo_db::migrate(&db).await?;
    info!("Migrations completed");

    // Prepare upload storage
    tokio::fs::create_dir_all(&config.uploads.path)
        .await
        .with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.uploads.path.display()
            )
        })?;
    let storage = Arc::new(LocalStorage::new(config.uploads.path.clone()));

    // Initialize repositories
    let form_repo = FormRepository::new(Arc::clone(&db));
    let response_repo = FormResponseRepository::new(Arc::clone(&db));

    // Initialize services
    let form_service = FormService::new(form_repo.clone(), response_repo.clone(), &config.forms);
    let submission_service = SubmissionService::new(
        form_repo,
        response_repo,
        storage,
        &config.uploads,
        &config.forms,
    );

    let state = AppState {
        form_service,
        submission_service,
    };

    let app = build_app(state, config.uploads.max_body_bytes);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use collexo_common::{
        NoOpStorage,
        config::{FormsConfig, UploadConfig},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let form_repo = FormRepository::new(Arc::clone(&db));
        let response_repo = FormResponseRepository::new(db);
        let forms = FormsConfig::default();

        AppState {
            form_service: FormService::new(form_repo.clone(), response_repo.clone(), &forms),
            submission_service: SubmissionService::new(
                form_repo,
                response_repo,
                Arc::new(NoOpStorage),
                &UploadConfig::default(),
                &forms,
            ),
        }
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = build_app(test_state(), 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/forms/show")
                    .header(header::ORIGIN, "https://students.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = build_app(test_state(), 1024);
        let title = "x".repeat(4096);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/forms/create")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("X-Society-Id", "soc1")
                    .body(Body::from(format!(r#"{{"title":"{title}","formSchema":[]}}"#)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
