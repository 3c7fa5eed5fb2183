use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::FailureBody;

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(FailureBody::new("Route not found", None)),
    )
        .into_response()
}
