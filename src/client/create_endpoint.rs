//! Defines the endpoint for creating a client from the transaction form.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    client::{ClientName, create_client},
};

/// The state needed to create a client.
#[derive(Debug, Clone)]
pub struct CreateClientState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateClientState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a client.
#[derive(Debug, Deserialize)]
pub struct NewClientBody {
    pub name: String,
}

/// Create a client, responding with `201 Created` and the new client as JSON.
///
/// A duplicate name is answered with `409 Conflict`.
pub async fn create_client_endpoint(
    State(state): State<CreateClientState>,
    Json(body): Json<NewClientBody>,
) -> Response {
    let name = match ClientName::new(&body.name) {
        Ok(name) => name,
        Err(error) => return error.into_json_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match create_client(name, &connection) {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(error) => {
            tracing::warn!("Could not create client: {error}");
            error.into_json_response()
        }
    }
}
