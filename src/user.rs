//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, error::is_unique_violation};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The operator who records transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address, unique across users.
    pub email: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateUserEmail] if the email is taken, or
/// [Error::SqlError] if some other SQL error occurred.
pub fn create_user(name: &str, email: &str, connection: &Connection) -> Result<User, Error> {
    let email = email.trim().to_lowercase();

    connection
        .execute(
            "INSERT INTO user (name, email) VALUES (?1, ?2)",
            (name.trim(), &email),
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateUserEmail(email.clone())
            } else {
                error.into()
            }
        })?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        name: name.trim().to_owned(),
        email,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, email FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user with `email`, creating it with `name` if it does not exist yet.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn get_or_create_user(name: &str, email: &str, connection: &Connection) -> Result<User, Error> {
    let email = email.trim().to_lowercase();

    let existing = connection
        .prepare("SELECT id, name, email FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_row);

    match existing {
        Ok(user) => Ok(user),
        Err(rusqlite::Error::QueryReturnedNoRows) => create_user(name, &email, connection),
        Err(error) => Err(error.into()),
    }
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        user::{UserID, create_user, create_user_table, get_or_create_user, get_user_by_id},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        connection
    }

    #[test]
    fn create_user_lowercases_email() {
        let connection = get_test_connection();

        let user = create_user("Ana", "Ana@Example.com", &connection).unwrap();

        assert_eq!(user.email, "ana@example.com");
        assert_eq!(get_user_by_id(user.id, &connection), Ok(user));
    }

    #[test]
    fn create_user_fails_on_duplicate_email() {
        let connection = get_test_connection();
        create_user("Ana", "ana@example.com", &connection).unwrap();

        let result = create_user("Another Ana", "ana@example.com", &connection);

        assert_eq!(
            result,
            Err(Error::DuplicateUserEmail("ana@example.com".to_owned()))
        );
    }

    #[test]
    fn get_user_fails_on_unknown_id() {
        let connection = get_test_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_or_create_user_reuses_existing_user() {
        let connection = get_test_connection();
        let first = get_or_create_user("Operator", "operator@example.com", &connection).unwrap();

        let second = get_or_create_user("Operator", "OPERATOR@example.com", &connection).unwrap();

        assert_eq!(first, second);
    }
}
