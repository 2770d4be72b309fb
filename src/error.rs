//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    alert::Alert,
    category::CategoryId,
    client::ClientId,
    error_pages::{BadRequestError, InternalServerError, NotFoundError},
    member::MemberId,
    money::Money,
};

/// The broad classes of [Error], used to pick status codes and for callers that
/// only care about what went wrong in general terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, missing or out-of-range input, detected before any write.
    Validation,
    /// A unique constraint was violated.
    Conflict,
    /// The record does not exist or has been deleted.
    NotFound,
    /// A referenced record (category, client, member, user) does not exist.
    Referential,
    /// The database failed in some unexpected way.
    Store,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A form field was missing or did not pass validation.
    ///
    /// `field` is the name of the form input so the form can show the
    /// message next to it.
    #[error("{reason}")]
    InvalidField {
        /// The name of the offending form field.
        field: &'static str,
        /// A human readable explanation.
        reason: String,
    },

    /// A monetary amount could not be parsed or has more than two decimal places.
    #[error("\"{0}\" is not a valid amount, use a number with at most two decimal places")]
    InvalidAmount(String),

    /// A transaction item had an amount of zero or less.
    ///
    /// `index` is the zero-based position of the item in the submitted list.
    #[error("item {} has the amount {amount}, item amounts must be greater than zero", .index + 1)]
    NonPositiveItemAmount {
        /// Position of the item in the submitted list.
        index: usize,
        /// The rejected amount.
        amount: Money,
    },

    /// The item amounts add up to more than a stored amount can hold.
    #[error("the items add up to {0}, a transaction total must be less than 100000000")]
    TotalAmountTooLarge(Money),

    /// A transaction was submitted without any items.
    #[error("a transaction needs at least one item")]
    NoTransactionItems,

    /// The date used to filter transactions was not in the format YYYY-MM-DD.
    #[error("\"{0}\" is not a valid date, use the format YYYY-MM-DD")]
    InvalidDateFilter(String),

    /// The client name already exists in the database.
    #[error("the client \"{0}\" already exists")]
    DuplicateClientName(String),

    /// Another member already uses this email address.
    #[error("a member with the email \"{0}\" already exists")]
    DuplicateMemberEmail(String),

    /// Another user already uses this email address.
    #[error("a user with the email \"{0}\" already exists")]
    DuplicateUserEmail(String),

    /// The category ID does not refer to a category.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The client ID does not refer to a client.
    #[error("the client ID {0} does not refer to a valid client")]
    InvalidClient(ClientId),

    /// The member ID does not refer to a current member.
    #[error("the member ID {0} does not refer to a valid member")]
    InvalidMember(MemberId),

    /// The acting user does not exist.
    #[error("the user recording the transaction does not exist")]
    InvalidUser,

    /// A foreign key constraint failed for a reference that was not checked up front.
    #[error("a referenced record does not exist")]
    InvalidReference,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a member that does not exist
    #[error("tried to update a member that is not in the database")]
    UpdateMissingMember,

    /// Tried to delete a member that does not exist
    #[error("tried to delete a member that is not in the database")]
    DeleteMissingMember,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidReference,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Whether `error` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )
    )
}

impl Error {
    /// The class of error, see [ErrorKind].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidField { .. }
            | Error::InvalidAmount(_)
            | Error::NonPositiveItemAmount { .. }
            | Error::TotalAmountTooLarge(_)
            | Error::NoTransactionItems
            | Error::InvalidDateFilter(_) => ErrorKind::Validation,
            Error::DuplicateClientName(_)
            | Error::DuplicateMemberEmail(_)
            | Error::DuplicateUserEmail(_) => ErrorKind::Conflict,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingMember
            | Error::DeleteMissingMember => ErrorKind::NotFound,
            Error::InvalidCategory(_)
            | Error::InvalidClient(_)
            | Error::InvalidMember(_)
            | Error::InvalidUser
            | Error::InvalidReference => ErrorKind::Referential,
            Error::SqlError(_) | Error::DatabaseLockError => ErrorKind::Store,
        }
    }

    /// The form field the error should be displayed next to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::InvalidField { field, .. } => Some(field),
            Error::DuplicateMemberEmail(_) => Some("email"),
            Error::DuplicateClientName(_) => Some("name"),
            Error::InvalidAmount(_)
            | Error::NonPositiveItemAmount { .. }
            | Error::TotalAmountTooLarge(_) => Some("item_amount"),
            Error::NoTransactionItems => Some("items"),
            Error::InvalidDateFilter(_) => Some("date"),
            Error::InvalidCategory(_) => Some("category_id"),
            Error::InvalidClient(_) => Some("client_id"),
            Error::InvalidMember(_) => Some("member_id"),
            _ => None,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Referential => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        let alert = match self {
            Error::UpdateMissingTransaction => Alert::Error {
                message: "Could not update transaction".to_owned(),
                details: "The transaction could not be found.".to_owned(),
            },
            Error::DeleteMissingTransaction => Alert::Error {
                message: "Could not delete transaction".to_owned(),
                details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            },
            Error::UpdateMissingMember => Alert::Error {
                message: "Could not update member".to_owned(),
                details: "The member could not be found.".to_owned(),
            },
            Error::DeleteMissingMember => Alert::Error {
                message: "Could not delete member".to_owned(),
                details: "The member could not be found. \
                    Try refreshing the page to see if the member has already been deleted."
                    .to_owned(),
            },
            Error::NotFound => Alert::ErrorSimple {
                message: "Not found. Try refreshing the page.".to_owned(),
            },
            Error::DuplicateClientName(name) => Alert::Error {
                message: "Duplicate Client Name".to_owned(),
                details: format!(
                    "The client {name} already exists. Select the existing client instead."
                ),
            },
            Error::DuplicateMemberEmail(email) => Alert::Error {
                message: "Duplicate Email".to_owned(),
                details: format!(
                    "The email {email} is already used by another member. \
                    Choose a different email address."
                ),
            },
            error @ (Error::InvalidCategory(_)
            | Error::InvalidClient(_)
            | Error::InvalidMember(_)
            | Error::InvalidUser
            | Error::InvalidReference) => Alert::Error {
                message: "Invalid reference".to_owned(),
                details: format!("{error}. Refresh the page and try again."),
            },
            error if error.kind() == ErrorKind::Validation => Alert::Error {
                message: "Invalid input".to_owned(),
                details: error.to_string(),
            },
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                }
            }
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Convert the error into an HTTP response with a JSON body of the form
    /// `{"message": "...", "field": "..."}`.
    pub fn into_json_response(self) -> Response {
        let status_code = self.status_code();

        if self.kind() == ErrorKind::Store {
            tracing::error!("An unexpected error occurred: {self}");
            return (
                status_code,
                Json(json!({ "message": "An unexpected error occurred", "field": null })),
            )
                .into_response();
        }

        let body = json!({ "message": self.to_string(), "field": self.field() });

        (status_code, Json(body)).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::NotFound => NotFoundError.into_response(),
            ErrorKind::Validation | ErrorKind::Referential | ErrorKind::Conflict => {
                BadRequestError {
                    status_code: self.status_code(),
                    description: &self.to_string(),
                }
                .into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            ErrorKind::Store => {
                tracing::error!("An unexpected error occurred: {}", self);
                InternalServerError.into_response()
            }
        }
    }
}
