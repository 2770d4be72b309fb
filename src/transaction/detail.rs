//! The transaction detail page, also served as JSON.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::{HeaderMap, header::ACCEPT},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    endpoints,
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    transaction::{Transaction, get_transaction},
};

/// The state needed to show a transaction.
#[derive(Debug, Clone)]
pub struct TransactionDetailState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Show a transaction with its items.
///
/// Responds with JSON when the `Accept` header asks for `application/json`,
/// otherwise with the HTML detail page.
pub async fn get_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionDetailState>,
    headers: HeaderMap,
) -> Response {
    let wants_json = headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return if wants_json {
                Error::DatabaseLockError.into_json_response()
            } else {
                Error::DatabaseLockError.into_response()
            };
        }
    };

    match (get_transaction(transaction_id, &connection), wants_json) {
        (Ok(transaction), true) => Json(transaction).into_response(),
        (Ok(transaction), false) => transaction_view(&transaction).into_response(),
        (Err(error), true) => error.into_json_response(),
        (Err(error), false) => error.into_response(),
    }
}

fn transaction_view(transaction: &Transaction) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transaction #" (transaction.id) }
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }
                }

                dl class="grid grid-cols-2 gap-x-6 gap-y-2 text-sm"
                {
                    dt class="font-semibold" { "Date" }
                    dd { (transaction.transaction_date) }

                    dt class="font-semibold" { "Client" }
                    dd { (transaction.client_name) }

                    dt class="font-semibold" { "Payment method" }
                    dd { span class=(BADGE_STYLE) { (transaction.payment_method) } }

                    dt class="font-semibold" { "Description" }
                    dd { (transaction.description.as_deref().unwrap_or("-")) }

                    dt class="font-semibold" { "Recorded by" }
                    dd { (transaction.user_name) }

                    dt class="font-semibold" { "Total" }
                    dd data-total { (format_currency(transaction.total_amount)) }
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Member" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Reference" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Vehicle" }
                            }
                        }

                        tbody
                        {
                            @for item in &transaction.items {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (item.category_name) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(item.item_amount)) }
                                    td class=(TABLE_CELL_STYLE) { (item.item_description.as_deref().unwrap_or("-")) }
                                    td class=(TABLE_CELL_STYLE) { (item.member_name.as_deref().unwrap_or("-")) }
                                    td class=(TABLE_CELL_STYLE) { (item.reference_months.as_deref().unwrap_or("-")) }
                                    td class=(TABLE_CELL_STYLE) { (item.vehicle_type.as_deref().unwrap_or("-")) }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base(&format!("Transaction #{}", transaction.id), &[], &content)
}
