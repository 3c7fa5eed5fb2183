//! Sales Explorer is a JSON API for searching, filtering, sorting and paging a
//! data set of retail sales transactions.
//!
//! Every query returns one page of transactions together with a summary of
//! the whole filtered set. Queries run against one of two interchangeable
//! stores chosen at start up: an in-memory store loaded from a CSV export, or
//! a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::{Deserialize, Serialize};
use tokio::signal;

mod app_state;
mod csv_import;
mod endpoints;
mod filter_options;
mod logging;
mod not_found;
mod pagination;
mod query;
mod routing;
mod sales;
mod store;
mod summary;
mod transaction;

pub use app_state::AppState;
pub use csv_import::{DEFAULT_MAX_RECORDS, load_sales_csv, read_sales_csv};
pub use filter_options::{AgeRange, FilterOptions, get_filter_options};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::{PageWindow, Pagination, PaginationConfig};
pub use query::{SalesFilter, SalesQuery, SalesSort, SearchTerms, SortKey, SortOrder};
pub use routing::build_router;
pub use sales::{SalesPage, SalesService};
pub use store::{CategoryField, InMemorySalesStore, SQLiteSalesStore, SalesStore};
pub use summary::{Summary, Totals};
pub use transaction::{SourceRow, Transaction, normalize_record, parse_sale_date};

use crate::not_found::get_404_not_found_response;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The sales data could not be read at all, e.g. the CSV file is missing.
    #[error("the sales data is unavailable: {0}")]
    DataSourceUnavailable(String),

    /// Two sales with the same transaction ID were written to the database.
    #[error("the transaction ID \"{0}\" already exists in the database")]
    DuplicateTransactionId(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBody {
    /// Always `false`.
    pub success: bool,
    /// A short description of what failed.
    pub error: String,
    /// The underlying cause, for failures the client cannot fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FailureBody {
    fn new(error: &str, message: Option<String>) -> Self {
        Self {
            success: false,
            error: error.to_owned(),
            message,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            error => error.into_failure_response("Internal server error"),
        }
    }
}

impl Error {
    /// Convert the error into a JSON failure response where `description`
    /// says what the client was trying to do, e.g. "Failed to fetch sales data".
    fn into_failure_response(self, description: &str) -> Response {
        match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Json(FailureBody::new(description, None)),
            )
                .into_response(),
            error => {
                tracing::error!("{description}: {error}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(FailureBody::new(description, Some(error.to_string()))),
                )
                    .into_response()
            }
        }
    }
}
