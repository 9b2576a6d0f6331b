//! talenta-api - HTTP API server for the talenta evaluation service.

mod handlers;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use talenta_core::{defaults, EmbeddingBackend, FileRepository, GenerationBackend, TextExtractor};
use talenta_db::{Database, PgFileRepository};
use talenta_inference::{GeminiBackend, ModelInvoker};
use talenta_jobs::{EvaluationPipeline, EvaluationWorker, PdfTextExtractor, WorkerConfig};
use talenta_retrieval::{QdrantIndex, RubricRetriever};

use handlers::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation across request → job → provider calls.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   RUST_LOG    - standard env filter (default: "talenta_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "talenta_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("talenta-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/talenta".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Ensure the upload directory exists
    let upload_dir = PathBuf::from(
        std::env::var("UPLOAD_DIR").unwrap_or_else(|_| defaults::UPLOAD_DIR.to_string()),
    );
    tokio::fs::create_dir_all(&upload_dir).await?;
    info!(upload_dir = %upload_dir.display(), "Upload directory ready");

    // Construct provider clients once and inject them
    let gemini = Arc::new(GeminiBackend::from_env());
    let qdrant = Arc::new(QdrantIndex::from_env());

    let invoker = if gemini.has_api_key() {
        info!(
            model = GenerationBackend::model_name(gemini.as_ref()),
            "Model backend initialized"
        );
        Some(ModelInvoker::new(
            gemini.clone() as Arc<dyn GenerationBackend>
        ))
    } else {
        warn!("GEMINI_API_KEY is not set; evaluations will use the heuristic fallback");
        None
    };

    // Create and start the evaluation worker
    let worker_config = WorkerConfig::from_env();
    let _worker_handle = if worker_config.enabled {
        info!("Starting evaluation worker...");
        let retriever = RubricRetriever::new(
            gemini.clone() as Arc<dyn EmbeddingBackend>,
            qdrant.clone(),
        );
        let pipeline = EvaluationPipeline::new(
            Arc::new(PgFileRepository::new(db.pool.clone())) as Arc<dyn FileRepository>,
            Arc::new(PdfTextExtractor) as Arc<dyn TextExtractor>,
            retriever,
            invoker,
        );
        let worker = EvaluationWorker::new(
            Arc::new(talenta_db::PgJobRepository::new(db.pool.clone())),
            Arc::new(talenta_db::PgEvaluationRepository::new(db.pool.clone())),
            pipeline,
            worker_config,
        );
        let handle = worker.start();
        info!("Evaluation worker started");
        Some(handle)
    } else {
        info!("Evaluation worker disabled");
        None
    };

    // Build the router
    let state = AppState {
        db,
        upload_dir: Arc::new(upload_dir),
    };

    let app = Router::new()
        .route("/upload", post(handlers::upload::handle_upload))
        .route("/evaluate", post(handlers::evaluate::handle_evaluate))
        .route("/result/:id", get(handlers::result::handle_get_result))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(defaults::MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
