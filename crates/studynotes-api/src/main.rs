//! studynotes-api - HTTP API server for studynotes

mod config;
mod handlers;

use std::sync::Arc;

use axum::http::{header, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use studynotes_core::{seed_notes, seed_subjects};
use studynotes_store::{
    create_pool, BackedNoteRepository, BackedSubjectDirectory, ContentFetchTracker,
    MemoryObjectStore, MemoryTableStore, MockSearchFunction, PgObjectStore, PgTableStore,
};

use config::{ApiConfig, BackendKind};
use handlers::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

async fn build_state(config: &ApiConfig) -> anyhow::Result<AppState> {
    let (tables, objects): (
        Arc<dyn studynotes_core::TableStore>,
        Arc<dyn studynotes_core::ObjectStore>,
    ) = match config.backend {
        BackendKind::Memory => (
            Arc::new(MemoryTableStore::new()),
            Arc::new(MemoryObjectStore::new()),
        ),
        BackendKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .expect("checked by ApiConfig::from_env");
            let pool = create_pool(url).await?;
            (
                Arc::new(PgTableStore::new(pool.clone())),
                Arc::new(PgObjectStore::new(pool)),
            )
        }
    };

    let notes = BackedNoteRepository::new(Arc::clone(&tables), Arc::clone(&objects))
        .with_seed(seed_notes())
        .with_max_upload_bytes(config.max_upload_bytes);
    let subjects = BackedSubjectDirectory::new(tables).with_seed(seed_subjects());

    Ok(AppState {
        notes: Arc::new(notes),
        subjects: Arc::new(subjects),
        objects: Arc::clone(&objects),
        functions: Arc::new(MockSearchFunction::new()),
        fetches: Arc::new(ContentFetchTracker::new(objects)),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG wins; LOG_FORMAT=json switches to structured output and
    // LOG_FILE redirects to a daily-rotated file.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studynotes_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    let json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");
    let _file_guard = if let Ok(path) = std::env::var("LOG_FILE") {
        let path = std::path::PathBuf::from(path);
        let dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("studynotes-api.log");
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file));
        if json {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
        Some(guard)
    } else {
        if json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
        None
    };

    let config = ApiConfig::from_env()?;
    info!(
        backend = ?config.backend,
        bind = %config.bind,
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded"
    );

    let state = build_state(&config).await?;

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        )
        // Multipart overhead on top of the blob itself.
        .layer(RequestBodyLimitLayer::new(
            config.max_upload_bytes as usize + 64 * 1024,
        ));

    info!("Starting server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
