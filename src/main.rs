use clap::Parser;
use segserve_api::{AppState, RestApi};
use segserve_core::FeatureSchema;
use segserve_storage::{load_schema, ModelStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Serve streaming-segment predictions over HTTP
#[derive(Parser, Debug)]
#[command(name = "segserve")]
#[command(about = "Prediction server for streaming-segment classifiers", long_about = None)]
struct Args {
    /// Path to the model artifact
    #[arg(short, long, default_value = "./model/forest.json")]
    model: PathBuf,

    /// Path to a JSON feature schema (defaults to the built-in streaming schema)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// Bearer token enabling the model reload/install endpoints
    #[arg(long)]
    admin_token: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting segserve v{}", env!("CARGO_PKG_VERSION"));

    let schema = match &args.schema {
        Some(path) => load_schema(path)?,
        None => FeatureSchema::streaming_default(),
    };
    info!("Expected features: {:?}", schema.field_names());

    let models = Arc::new(ModelStore::new(&args.model, schema.len()));
    if let Err(e) = models.load() {
        warn!("No model loaded ({:#}); /predict answers 503 until a reload succeeds", e);
    }

    let mut state = AppState::new(Arc::new(schema), models.clone());
    if let Some(token) = args.admin_token {
        state = state.with_admin_token(token);
    } else {
        info!("Model management endpoints disabled (no --admin-token)");
    }

    let host = args.host.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, host, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("segserve started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    models.unload();
    Ok(())
}
