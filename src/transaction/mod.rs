//! Transactions and their items.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` and `TransactionItem` models and the `NewTransaction` input
//! - The aggregate writer that stores a transaction and its items atomically
//! - The paginated listing and the lookups the transaction form needs
//! - View handlers for transaction-related web pages

mod core;
mod create;
mod db;
mod delete;
mod detail;
mod edit;
mod form;
mod query;
mod transactions_page;

pub use core::{
    NewTransaction, NewTransactionItem, PaymentMethod, Transaction, TransactionItem,
    TransactionRow,
};
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use db::{
    create_transaction_tables, create_transaction_with_items, delete_transaction,
    get_transaction, update_transaction_with_items,
};
pub use delete::delete_transaction_endpoint;
pub use detail::get_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use transactions_page::get_transactions_page_endpoint;
