//! Bookkeeper is a web app for keeping the books of a club or association.
//!
//! It tracks members, clients and transactions, where each transaction is
//! made up of one or more line items that are each booked against a category.
//!
//! This library provides a REST API that directly serves HTML pages, plus a
//! small JSON surface for the client typeahead and transaction details.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod category;
mod client;
mod database_id;
mod date;
mod db;
mod endpoints;
mod error;
mod error_pages;
mod html;
mod logging;
mod member;
mod money;
mod navigation;
mod pagination;
mod routing;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::{Category, CategoryId, CategoryType, get_all_categories};
pub use client::{Client, ClientId, ClientName, get_or_create_client};
pub use db::initialize as initialize_db;
pub use error::{Error, ErrorKind};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use member::{Member, MemberId, NewMember, create_member};
pub use money::Money;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use transaction::{
    NewTransaction, NewTransactionItem, PaymentMethod, create_transaction_with_items,
};
pub use user::{User, UserID, get_or_create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Received termination signal, shutting down gracefully.");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
