//! The JSON endpoints for querying sales.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};

use crate::{Error, query::SalesQuery};

use super::SalesService;

/// The body of a successful response, `body` is flattened next to `success`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    /// Always `true`.
    pub success: bool,
    /// The payload.
    #[serde(flatten)]
    pub body: T,
}

impl<T> ApiSuccess<T> {
    fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// A payload wrapped in a `data` field.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    /// The payload.
    pub data: T,
}

/// The size of the data set.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// The number of transactions in the data set.
    pub total_records: u64,
}

/// The result of a health check.
#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    /// "ok" or "error".
    pub status: String,
    /// "connected" when the store can be queried, otherwise "disconnected".
    pub database: String,
    /// The number of transactions, if the store could be queried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    /// Why the store could not be queried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Get one page of transactions, with the summary and pagination of the whole
/// filtered set.
pub async fn get_sales(
    State(sales): State<SalesService>,
    Query(query): Query<SalesQuery>,
) -> Response {
    match sales.query(&query) {
        Ok(page) => Json(ApiSuccess::new(page)).into_response(),
        Err(error) => error.into_failure_response("Failed to fetch sales data"),
    }
}

/// Get the choices for every filter.
pub async fn get_filters(State(sales): State<SalesService>) -> Response {
    match sales.filter_options() {
        Ok(options) => Json(ApiSuccess::new(Data { data: options })).into_response(),
        Err(error) => error.into_failure_response("Failed to fetch filter options"),
    }
}

/// Get the number of transactions in the data set.
pub async fn get_stats(State(sales): State<SalesService>) -> Response {
    match sales.count() {
        Ok(total_records) => Json(ApiSuccess::new(Data {
            data: Stats { total_records },
        }))
        .into_response(),
        Err(error) => error.into_failure_response("Failed to fetch statistics"),
    }
}

/// Get a single transaction by its transaction ID.
pub async fn get_sale(
    State(sales): State<SalesService>,
    Path(transaction_id): Path<String>,
) -> Response {
    match sales.get_by_id(&transaction_id) {
        Ok(Some(transaction)) => Json(ApiSuccess::new(Data { data: transaction })).into_response(),
        Ok(None) => Error::NotFound.into_failure_response("Transaction not found"),
        Err(error) => error.into_failure_response("Failed to fetch transaction"),
    }
}

/// Check that the store can be queried.
pub async fn get_health(State(sales): State<SalesService>) -> Response {
    match sales.count() {
        Ok(records) => Json(Health {
            status: "ok".to_owned(),
            database: "connected".to_owned(),
            records: Some(records),
            error: None,
        })
        .into_response(),
        Err(error) => {
            tracing::error!("Health check failed: {error}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Health {
                    status: "error".to_owned(),
                    database: "disconnected".to_owned(),
                    records: None,
                    error: Some(error.to_string()),
                }),
            )
                .into_response()
        }
    }
}
