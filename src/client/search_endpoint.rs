//! The typeahead endpoint used by the transaction form to pick a client.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, client::search_clients};

/// The state needed to search clients.
#[derive(Debug, Clone)]
pub struct SearchClientsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SearchClientsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientSearchQuery {
    /// Text the client name must contain.
    pub q: Option<String>,
}

/// Respond with `[{"id": .., "name": ..}]` for clients matching `?q=`.
pub async fn search_clients_endpoint(
    State(state): State<SearchClientsState>,
    Query(query): Query<ClientSearchQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match search_clients(query.q.as_deref().unwrap_or_default(), &connection) {
        Ok(clients) => Json(clients).into_response(),
        Err(error) => {
            tracing::error!("Could not search clients with {query:?}: {error}");
            error.into_json_response()
        }
    }
}
