//! The paginated transactions page with its date filter.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    pagination::{Page, PaginationConfig, create_pagination_indicators, pagination_view},
    transaction::{
        TransactionRow,
        query::{TRANSACTIONS_PAGE_SIZE, TransactionFilter, get_transactions_page},
    },
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters of the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Only show transactions on this day, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// The page number to display. Starts from 1.
    pub page: Option<u64>,
}

/// Render a page of transactions, most recently created first.
///
/// # Errors
///
/// Responds with a 400 page when `date` is not a `YYYY-MM-DD` date.
pub async fn get_transactions_page_endpoint(
    State(state): State<TransactionsPageState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let filter = TransactionFilter::parse(query.date.as_deref())?;
    let config = &state.pagination_config;
    let page_number = query.page.unwrap_or(config.default_page).max(1);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page = get_transactions_page(filter, page_number, TRANSACTIONS_PAGE_SIZE, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions: {error}"))?;

    Ok(transactions_view(&page, filter, config.max_pages).into_response())
}

fn transactions_view(page: &Page<TransactionRow>, filter: TransactionFilter, max_pages: u64) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let indicators = create_pagination_indicators(page.number, page.page_count(), max_pages);
    let date_value = filter.date.map(|date| date.to_string());
    let page_url = |page: u64| {
        let page = page.to_string();
        let query = match &date_value {
            Some(date) => serde_urlencoded::to_string([("date", date.as_str()), ("page", page.as_str())]),
            None => serde_urlencoded::to_string([("page", page.as_str())]),
        };

        match query {
            Ok(query) => format!("{}?{query}", endpoints::TRANSACTIONS_VIEW),
            Err(error) => {
                tracing::error!("could not encode the page link query: {error}");
                endpoints::TRANSACTIONS_VIEW.to_owned()
            }
        }
    };

    let table_row = |row: &TransactionRow| {
        let view_url = endpoints::format_endpoint(endpoints::TRANSACTION_VIEW, row.id);
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, row.id);
        let delete_url = endpoints::format_endpoint(endpoints::TRANSACTION, row.id);
        let confirm_message = format!(
            "Are you sure you want to delete the transaction of {} from {}?",
            format_currency(row.total_amount),
            row.client_name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    a href=(view_url) class=(LINK_STYLE) { (row.transaction_date) }
                }
                td class=(TABLE_CELL_STYLE) { (row.client_name) }
                td class=(TABLE_CELL_STYLE) { (row.description.as_deref().unwrap_or("-")) }
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(BADGE_STYLE) { (row.payment_method) }
                }
                td class="px-6 py-4 text-right tabular-nums" { (format_currency(row.total_amount)) }
                td class=(TABLE_CELL_STYLE) { (row.user_name) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-6xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    form method="get" action=(endpoints::TRANSACTIONS_VIEW) class="flex items-end gap-2"
                    {
                        input
                            type="date"
                            name="date"
                            value=[date_value.as_deref()]
                            aria-label="Transaction date"
                            class=(FORM_TEXT_INPUT_STYLE);

                        button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }

                        @if date_value.is_some() {
                            a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Clear" }
                        }
                    }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "New Transaction" }
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Client" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Payment" }
                                th scope="col" class="px-6 py-4 text-right" { "Total" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Recorded by" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in &page.items {
                                (table_row(row))
                            }

                            @if page.items.is_empty() {
                                tr
                                {
                                    td
                                        colspan="7"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions found. "
                                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                                        {
                                            "Record a transaction"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_view(&indicators, page_url))
            }
        }
    );

    base("Transactions", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{Date, macros::date};

    use crate::{
        Error,
        client::{ClientName, create_client},
        db::initialize,
        money::Money,
        pagination::PaginationConfig,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{
            NewTransaction, NewTransactionItem, PaymentMethod, create_transaction_with_items,
            get_transactions_page_endpoint,
        },
        user::create_user,
    };

    use super::{TransactionsPageState, TransactionsQuery};

    fn get_state(dates: &[Date]) -> TransactionsPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user("Operador", "operador@example.com", &connection).unwrap();
        let client = create_client(ClientName::new_unchecked("Acme"), &connection).unwrap();
        for date in dates {
            create_transaction_with_items(
                &NewTransaction {
                    transaction_date: *date,
                    payment_method: PaymentMethod::Pix,
                    description: None,
                    client_id: client.id,
                    items: vec![NewTransactionItem::new(1, Money::from_cents(2500))],
                },
                user.id,
                &connection,
            )
            .unwrap();
        }

        TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig::default(),
        }
    }

    fn row_count(html: &scraper::Html) -> usize {
        let selector = Selector::parse("tbody tr").unwrap();
        html.select(&selector).count()
    }

    #[tokio::test]
    async fn shows_transactions_with_joined_names() {
        let state = get_state(&[date!(2025 - 01 - 15), date!(2025 - 01 - 16)]);

        let response = get_transactions_page_endpoint(State(state), Query(TransactionsQuery::default()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(row_count(&html), 2);
        let first_row = html
            .select(&Selector::parse("tbody tr").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(first_row.contains("2025-01-16"), "most recent first, got {first_row}");
        assert!(first_row.contains("Acme"));
        assert!(first_row.contains("Operador"));
        assert!(first_row.contains("R$ 25,00"));
    }

    #[tokio::test]
    async fn filters_by_date() {
        let state = get_state(&[date!(2025 - 01 - 15), date!(2025 - 01 - 16), date!(2025 - 01 - 15)]);

        let response = get_transactions_page_endpoint(
            State(state),
            Query(TransactionsQuery {
                date: Some("2025-01-15".to_owned()),
                page: None,
            }),
        )
        .await
        .into_response();

        let html = parse_html_document(response).await;
        assert_eq!(row_count(&html), 2);
    }

    #[tokio::test]
    async fn invalid_date_is_rejected() {
        let state = get_state(&[]);

        let result = get_transactions_page_endpoint(
            State(state),
            Query(TransactionsQuery {
                date: Some("15-01-2025".to_owned()),
                page: None,
            }),
        )
        .await;

        assert_eq!(
            result.err(),
            Some(Error::InvalidDateFilter("15-01-2025".to_owned()))
        );
    }

    #[tokio::test]
    async fn huge_page_number_renders_empty_page() {
        let state = get_state(&[date!(2025 - 01 - 15)]);

        let response = get_transactions_page_endpoint(
            State(state),
            Query(TransactionsQuery {
                date: None,
                page: Some(u64::MAX),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        let body = html.root_element().text().collect::<String>();
        assert!(body.contains("No transactions found."));
    }

    #[tokio::test]
    async fn page_links_keep_date_filter() {
        let dates = vec![date!(2025 - 03 - 01); 20];
        let state = get_state(&dates);

        let response = get_transactions_page_endpoint(
            State(state),
            Query(TransactionsQuery {
                date: Some("2025-03-01".to_owned()),
                page: Some(1),
            }),
        )
        .await
        .into_response();

        let html = parse_html_document(response).await;
        assert_eq!(row_count(&html), 15);
        let next = Selector::parse("nav.pagination a[role='button']").unwrap();
        let next = html.select(&next).next().expect("next page link missing");
        assert_eq!(
            next.value().attr("href"),
            Some("/transactions?date=2025-03-01&page=2")
        );
    }
}
