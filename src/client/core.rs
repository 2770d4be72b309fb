//! Client domain types and database queries.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId, error::is_unique_violation};

/// Database identifier for a client.
pub type ClientId = DatabaseId;

/// The maximum number of clients returned by [search_clients].
pub const CLIENT_SEARCH_LIMIT: usize = 20;

const MAX_NAME_LENGTH: usize = 255;

/// A validated client name: trimmed, non-empty and at most 255 characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct ClientName(String);

impl ClientName {
    /// Create a client name.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidField] for the `name` field if `name` is
    /// blank or longer than 255 characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::InvalidField {
                field: "name",
                reason: "Client name cannot be empty".to_owned(),
            });
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::InvalidField {
                field: "name",
                reason: format!("Client name cannot be longer than {MAX_NAME_LENGTH} characters"),
            });
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a client name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for ClientName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ClientName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person or business that pays or is paid by the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Hash)]
pub struct Client {
    pub id: ClientId,
    pub name: ClientName,
}

/// Create the client table.
pub fn create_client_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS client (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE INDEX IF NOT EXISTS idx_client_name ON client(name);",
    )?;

    Ok(())
}

/// Create a client and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateClientName] if a client with the same name exists.
pub fn create_client(name: ClientName, connection: &Connection) -> Result<Client, Error> {
    connection
        .execute("INSERT INTO client (name) VALUES (?1)", (name.as_ref(),))
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateClientName(name.to_string())
            } else {
                error.into()
            }
        })?;

    let id = connection.last_insert_rowid();

    Ok(Client { id, name })
}

/// Get the client called `name`, creating it if it does not exist yet.
///
/// The insert is attempted first and a unique constraint violation falls back
/// to a lookup, so two requests racing to create the same client both end up
/// with the same row.
pub fn get_or_create_client(name: ClientName, connection: &Connection) -> Result<Client, Error> {
    match create_client(name.clone(), connection) {
        Ok(client) => Ok(client),
        Err(Error::DuplicateClientName(_)) => connection
            .prepare("SELECT id, name FROM client WHERE name = :name")?
            .query_row(&[(":name", name.as_ref())], map_row)
            .map_err(|error| error.into()),
        Err(error) => Err(error),
    }
}

/// Find clients whose name contains `query`, ignoring case.
///
/// Case is folded with Unicode rules, so "joão" matches "JOÃO". Returns at
/// most [CLIENT_SEARCH_LIMIT] clients ordered by name. A blank `query` matches
/// every client.
pub fn search_clients(query: &str, connection: &Connection) -> Result<Vec<Client>, Error> {
    let needle = query.trim().to_lowercase();

    // SQLite's LIKE only folds ASCII letters, so matching happens here.
    connection
        .prepare("SELECT id, name FROM client ORDER BY name ASC")?
        .query_map([], map_row)?
        .filter(|maybe_client| match maybe_client {
            Ok(client) => client.name.as_ref().to_lowercase().contains(&needle),
            Err(_) => true,
        })
        .take(CLIENT_SEARCH_LIMIT)
        .map(|maybe_client| maybe_client.map_err(Error::from))
        .collect()
}

/// Retrieve all clients ordered alphabetically by name.
pub fn get_all_clients(connection: &Connection) -> Result<Vec<Client>, Error> {
    connection
        .prepare("SELECT id, name FROM client ORDER BY name ASC")?
        .query_map([], map_row)?
        .map(|maybe_client| maybe_client.map_err(Error::from))
        .collect()
}

fn map_row(row: &Row) -> Result<Client, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;

    Ok(Client {
        id,
        name: ClientName::new_unchecked(&raw_name),
    })
}
