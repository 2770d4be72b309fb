//! Member deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    member::{MemberId, delete_member},
};

/// The state needed for deleting a member.
#[derive(Debug, Clone)]
pub struct DeleteMemberState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteMemberState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle member deletion. Returns success alert or error.
///
/// Transaction items that referenced the member are kept and lose their
/// member reference.
pub async fn delete_member_endpoint(
    Path(member_id): Path<MemberId>,
    State(state): State<DeleteMemberState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_member(member_id, &connection) {
        Ok(0) => Alert::SuccessSimple {
            message: "Member deleted successfully".to_owned(),
        }
        .into_response(),
        Ok(unlinked_items) => Alert::Success {
            message: "Member deleted successfully".to_owned(),
            details: format!("Removed the member from {unlinked_items} transaction item(s)."),
        }
        .into_response(),
        Err(Error::DeleteMissingMember) => Error::DeleteMissingMember.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting member {member_id}: {error}");
            error.into_alert_response()
        }
    }
}
