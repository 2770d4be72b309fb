//! Full-page responses for requests that cannot be served.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// The 404 page shown for unknown routes and missing records.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            error_view(
                "Not Found",
                "404",
                "Sorry, we couldn't find that page.",
                "It may have been deleted, or the address may be wrong.",
            ),
        )
            .into_response()
    }
}

/// The 400 page shown when a page request has invalid parameters.
pub struct BadRequestError<'a> {
    pub status_code: StatusCode,
    pub description: &'a str,
}

impl IntoResponse for BadRequestError<'_> {
    fn into_response(self) -> Response {
        (
            self.status_code,
            error_view(
                "Bad Request",
                self.status_code.as_str(),
                self.description,
                "Check the address and try again.",
            ),
        )
            .into_response()
    }
}

/// The 500 page. The details stay in the server logs.
pub struct InternalServerError;

impl IntoResponse for InternalServerError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_view(
                "Internal Server Error",
                "500",
                "Sorry, something went wrong.",
                "Try again later or check the server logs",
            ),
        )
            .into_response()
    }
}

pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}
