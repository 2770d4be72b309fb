//! The new transaction page and the endpoint the form is submitted to.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// axum_extra's Form collects repeated keys into a Vec.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, ErrorKind, UserID, endpoints,
    html::{HeadElement, WIDE_FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{
        create_transaction_with_items,
        form::{TransactionFormAction, TransactionFormData, transaction_form_view},
        query::{TransactionLookups, get_transaction_lookups},
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The user new transactions are recorded under.
    pub operator_id: UserID,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            operator_id: state.operator_id,
        }
    }
}

/// Render the new transaction page with one empty item row.
pub async fn get_new_transaction_page(
    State(state): State<CreateTransactionState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let lookups = get_transaction_lookups(&connection)
        .inspect_err(|error| tracing::error!("Could not get transaction form choices: {error}"))?;

    let form = TransactionFormData {
        transaction_date: OffsetDateTime::now_utc().date().to_string(),
        ..Default::default()
    };

    Ok(new_transaction_view(&form, &lookups).into_response())
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
///
/// Invalid input re-renders the form with the error next to the offending field.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = form
        .to_new_transaction(&connection)
        .and_then(|new_transaction| {
            create_transaction_with_items(&new_transaction, state.operator_id, &connection)
        });

    match result {
        Ok(transaction) => {
            tracing::info!(
                "Created transaction {} with {} item(s) totalling {}",
                transaction.id,
                transaction.items.len(),
                transaction.total_amount
            );

            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) if matches!(error.kind(), ErrorKind::Validation | ErrorKind::Referential) => {
            match get_transaction_lookups(&connection) {
                Ok(lookups) => new_transaction_form_view(&form, &lookups, Some(&error)).into_response(),
                Err(lookup_error) => lookup_error.into_alert_response(),
            }
        }
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

fn new_transaction_view(form: &TransactionFormData, lookups: &TransactionLookups) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div class=(WIDE_FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "New Transaction" }
            (new_transaction_form_view(form, lookups, None))
        }
    };

    base(
        "New Transaction",
        &[HeadElement::ScriptLink("/static/app.js".to_owned())],
        &content,
    )
}

fn new_transaction_form_view(
    form: &TransactionFormData,
    lookups: &TransactionLookups,
    error: Option<&Error>,
) -> Markup {
    transaction_form_view(
        TransactionFormAction::Create(endpoints::TRANSACTIONS_API),
        form,
        lookups,
        error,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        client::{ClientName, create_client},
        db::initialize,
        endpoints,
        money::Money,
        test_utils::{
            assert_form_error_message, assert_form_input, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document, parse_html_fragment,
        },
        transaction::{
            create_transaction_endpoint, form::TransactionFormData, get_new_transaction_page,
            get_transaction,
        },
        user::create_user,
    };

    use super::CreateTransactionState;

    fn get_state() -> CreateTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user("Operador", "operador@example.com", &connection).unwrap();
        create_client(ClientName::new_unchecked("Acme"), &connection).unwrap();

        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            operator_id: user.id,
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    fn form() -> TransactionFormData {
        TransactionFormData {
            transaction_date: "2025-01-15".to_owned(),
            payment_method: "Dinheiro".to_owned(),
            client_id: "1".to_owned(),
            client_name: "Acme".to_owned(),
            category_id: strings(&["1", "2"]),
            item_amount: strings(&["12.50", "7.25"]),
            ..Default::default()
        }
    }

    fn count_transactions(state: &CreateTransactionState) -> i64 {
        state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn new_transaction_page_renders_form() {
        let response = get_new_transaction_page(State(get_state()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "transaction_date", "date");
        assert_form_input(&form, "client_name", "text");
        assert_form_input(&form, "item_amount", "number");

        let category_options = Selector::parse("#transaction-items select[name='category_id'] option").unwrap();
        // One placeholder plus the seven seeded categories.
        assert_eq!(form.select(&category_options).count(), 8);
    }

    #[tokio::test]
    async fn creates_transaction_and_redirects() {
        let state = get_state();

        let response = create_transaction_endpoint(State(state.clone()), Form(form())).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let transaction = get_transaction(1, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transaction.total_amount, Money::from_cents(1975));
        assert_eq!(transaction.items.len(), 2);
        assert_eq!(transaction.user_name, "Operador");
    }

    #[tokio::test]
    async fn no_items_shows_error_and_writes_nothing() {
        let state = get_state();
        let form = TransactionFormData {
            category_id: vec![],
            item_amount: vec![],
            ..form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: a transaction needs at least one item");
        assert_eq!(count_transactions(&state), 0);
    }

    #[tokio::test]
    async fn unknown_category_shows_error() {
        let state = get_state();
        let form = TransactionFormData {
            category_id: strings(&["1", "999"]),
            ..form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(
            &form,
            "Error: the category ID 999 does not refer to a valid category",
        );
        assert_eq!(count_transactions(&state), 0);
    }
}
