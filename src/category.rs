//! Categories that transaction items are booked against.
//!
//! The set of categories is fixed and seeded when the database is initialized.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::Serialize;

use crate::{Error, database_id::DatabaseId};

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// Whether money booked against a category comes in or goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Money received, e.g. a membership fee.
    Income,
    /// Money paid out.
    Expense,
}

impl CategoryType {
    fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A category such as "Mensalidade" (membership fee) or "Pagamento" (payment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// The category's ID.
    pub id: CategoryId,
    /// The display name.
    pub name: String,
    /// Whether the category is income or an expense.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// The categories every database starts with.
pub const DEFAULT_CATEGORIES: [(&str, CategoryType); 7] = [
    ("Mensalidade", CategoryType::Income),
    ("Estacionamento", CategoryType::Income),
    ("Bazar", CategoryType::Income),
    ("Livraria", CategoryType::Income),
    ("Doação Espontânea", CategoryType::Income),
    ("Outros", CategoryType::Income),
    ("Pagamento", CategoryType::Expense),
];

/// Create the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense'))
        )",
        (),
    )?;

    Ok(())
}

/// Insert the [DEFAULT_CATEGORIES] that are not in the table yet.
pub fn seed_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO category (name, type) VALUES (?1, ?2)")?;

    for (name, category_type) in DEFAULT_CATEGORIES {
        statement.execute((name, category_type))?;
    }

    Ok(())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type FROM category ORDER BY name ASC")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: row.get(2)?,
    })
}
