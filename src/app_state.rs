//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, UserID, db::initialize, pagination::PaginationConfig, user::get_or_create_user};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The user that new transactions are recorded under.
    ///
    /// There is no log in, so every request acts as this operator.
    pub operator_id: UserID,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models,
    /// seeding the categories, and looking up (or creating) the operator user identified by
    /// `operator_email`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        operator_name: &str,
        operator_email: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let operator = get_or_create_user(operator_name, operator_email, &db_connection)?;
        tracing::info!("Recording transactions as {} <{}>", operator.name, operator.email);

        Ok(Self {
            operator_id: operator.id,
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
