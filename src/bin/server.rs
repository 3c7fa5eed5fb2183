use std::{
    error::Error,
    fs::OpenOptions,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::{ArgGroup, Parser};
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use sales_explorer::{
    AppState, DEFAULT_MAX_RECORDS, InMemorySalesStore, PaginationConfig, SQLiteSalesStore,
    SalesStore, build_router, graceful_shutdown, load_sales_csv,
};

/// The JSON API server for exploring retail sales.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .multiple(true)
        .args(["data_path", "db_path"]),
))]
struct Args {
    /// File path to a CSV export of sales.
    ///
    /// Without `--db-path` the sales are held in memory. With it, they
    /// replace the contents of the database.
    #[arg(long, env = "SALES_DATA_PATH")]
    data_path: Option<PathBuf>,

    /// File path to a SQLite database of sales, see the `import_sales` binary.
    #[arg(long, env = "SALES_DB_PATH")]
    db_path: Option<PathBuf>,

    /// The maximum number of rows to read from the CSV file.
    #[arg(long, env = "MAX_RECORDS", default_value_t = DEFAULT_MAX_RECORDS)]
    max_records: usize,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// The number of transactions per page when a request does not say.
    #[arg(long, default_value_t = 10)]
    page_size: u64,

    /// File path to append debug logs to.
    #[arg(long, default_value = "debug.log")]
    log_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(&args.log_path)?;

    let store = open_store(&args)?;
    tracing::info!("Serving {} sales", store.count()?);

    let pagination_config = PaginationConfig {
        default_page_size: args.page_size,
        ..Default::default()
    };
    let router = add_tracing_layer(build_router(AppState::new(store, pagination_config)));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

/// Open the SQLite store if a database was given, otherwise load the CSV file
/// into memory.
fn open_store(args: &Args) -> Result<Arc<dyn SalesStore>, Box<dyn Error>> {
    let transactions = args
        .data_path
        .as_deref()
        .map(|data_path| load_sales_csv(data_path, args.max_records))
        .transpose()?;

    match (&args.db_path, transactions) {
        (Some(db_path), transactions) => {
            tracing::info!("Opening sales database at {}", db_path.display());
            let store = SQLiteSalesStore::new(Connection::open(db_path)?)?;

            if let Some(transactions) = transactions {
                store.replace_all(&transactions)?;
            }

            Ok(Arc::new(store))
        }
        (None, Some(transactions)) => Ok(Arc::new(InMemorySalesStore::new(transactions)?)),
        (None, None) => Err("either --data-path or --db-path must be given".into()),
    }
}

fn setup_logging(log_path: &Path) -> Result<(), std::io::Error> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Failures are already logged by the handlers.
        .on_failure(());

    router.layer(tracing_layer)
}
