//! Sets up the application's database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    category::{create_category_table, seed_categories},
    client::create_client_table,
    member::create_member_table,
    transaction::create_transaction_tables,
    user::create_user_table,
};

/// Create the tables for all domain models and seed the fixed categories.
///
/// Safe to call on an existing database, tables that already exist are kept
/// as they are and categories are only inserted when missing.
///
/// # Errors
///
/// Returns [Error::SqlError] if any of the statements fail. No tables are
/// created in that case.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are enforced per connection and cannot be enabled inside a transaction.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    seed_categories(&transaction)?;
    create_client_table(&transaction)?;
    create_member_table(&transaction)?;
    create_transaction_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
