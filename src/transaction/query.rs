//! Database query helpers for the transactions page.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    category::{Category, get_all_categories},
    client::{Client, get_all_clients},
    date::parse_iso_date,
    member::{MemberOption, get_member_options},
    pagination::{Page, empty_page, page_limit, page_offset},
    transaction::TransactionRow,
};

/// The number of transactions shown per page.
pub const TRANSACTIONS_PAGE_SIZE: u64 = 15;

/// Which transactions to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only list transactions on this day.
    pub date: Option<Date>,
}

impl TransactionFilter {
    /// Build a filter from the `?date=` query parameter.
    ///
    /// A missing or blank date lists every transaction.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDateFilter] if `date` is not in the format
    /// `YYYY-MM-DD`.
    pub fn parse(date: Option<&str>) -> Result<Self, Error> {
        let date = match date.map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                Some(parse_iso_date(text).ok_or_else(|| Error::InvalidDateFilter(text.to_owned()))?)
            }
        };

        Ok(Self { date })
    }
}

/// The choices offered by the transaction form.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLookups {
    pub categories: Vec<Category>,
    pub members: Vec<MemberOption>,
    pub clients: Vec<Client>,
}

/// Get the categories, live members and clients, each ordered by name.
pub fn get_transaction_lookups(connection: &Connection) -> Result<TransactionLookups, Error> {
    Ok(TransactionLookups {
        categories: get_all_categories(connection)?,
        members: get_member_options(connection)?,
        clients: get_all_clients(connection)?,
    })
}

/// Get one page of live transactions, most recently created first.
///
/// Each row carries the names of its user and client. A page past the last one
/// has no rows.
pub fn get_transactions_page(
    filter: TransactionFilter,
    page: u64,
    page_size: u64,
    connection: &Connection,
) -> Result<Page<TransactionRow>, Error> {
    let date = filter.date.map(|date| date.to_string());

    let total_count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM \"transaction\"
        WHERE deleted_at IS NULL AND (?1 IS NULL OR transaction_date = ?1)",
        (&date,),
        |row| row.get(0),
    )?;

    let offset = match page_offset(page, page_size) {
        Some(offset) if offset < total_count => offset,
        _ => return Ok(empty_page(page, page_size, total_count)),
    };

    // The ID breaks ties between rows created in the same instant.
    let items = connection
        .prepare(
            "SELECT t.id, t.total_amount, t.transaction_date, t.payment_method, t.description,
                user.name, client.name
            FROM \"transaction\" t
            INNER JOIN user ON user.id = t.user_id
            INNER JOIN client ON client.id = t.client_id
            WHERE t.deleted_at IS NULL AND (?1 IS NULL OR t.transaction_date = ?1)
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT ?2 OFFSET ?3",
        )?
        .query_map((&date, page_limit(page_size), offset), |row| {
            Ok(TransactionRow {
                id: row.get(0)?,
                total_amount: row.get(1)?,
                transaction_date: row.get(2)?,
                payment_method: row.get(3)?,
                description: row.get(4)?,
                user_name: row.get(5)?,
                client_name: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        number: page.max(1),
        size: page_size,
        total_count: total_count.unsigned_abs(),
    })
}
