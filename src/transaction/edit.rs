//! Transaction editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, ErrorKind,
    database_id::TransactionId,
    endpoints,
    html::{HeadElement, WIDE_FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{
        form::{TransactionFormAction, TransactionFormData, transaction_form_view},
        get_transaction,
        query::{TransactionLookups, get_transaction_lookups},
        update_transaction_with_items,
    },
};

/// The state needed for the edit transaction page and endpoint.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the edit page with the transaction's current values and items.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
        }
    })?;
    let lookups = get_transaction_lookups(&connection)
        .inspect_err(|error| tracing::error!("Could not get transaction form choices: {error}"))?;

    Ok(edit_transaction_view(
        transaction_id,
        &TransactionFormData::from(&transaction),
        &lookups,
    )
    .into_response())
}

/// Handle the edit form, replacing the transaction's items with the submitted ones.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
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
            update_transaction_with_items(transaction_id, &new_transaction, &connection)
        });

    match result {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) if matches!(error.kind(), ErrorKind::Validation | ErrorKind::Referential) => {
            match get_transaction_lookups(&connection) {
                Ok(lookups) => {
                    edit_transaction_form_view(transaction_id, &form, &lookups, Some(&error))
                        .into_response()
                }
                Err(lookup_error) => lookup_error.into_alert_response(),
            }
        }
        Err(Error::UpdateMissingTransaction) => {
            Error::UpdateMissingTransaction.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating transaction {transaction_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_transaction_view(
    transaction_id: TransactionId,
    form: &TransactionFormData,
    lookups: &TransactionLookups,
) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction_id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();

    let content = html! {
        (nav_bar)
        div class=(WIDE_FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "Edit Transaction" }
            (edit_transaction_form_view(transaction_id, form, lookups, None))
        }
    };

    base(
        "Edit Transaction",
        &[HeadElement::ScriptLink("/static/app.js".to_owned())],
        &content,
    )
}

fn edit_transaction_form_view(
    transaction_id: TransactionId,
    form: &TransactionFormData,
    lookups: &TransactionLookups,
    error: Option<&Error>,
) -> Markup {
    let update_endpoint = endpoints::format_endpoint(endpoints::TRANSACTION, transaction_id);

    transaction_form_view(
        TransactionFormAction::Update(&update_endpoint),
        form,
        lookups,
        error,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        Error,
        client::{ClientName, create_client},
        db::initialize,
        endpoints,
        money::Money,
        test_utils::{
            assert_form_error_message, assert_form_input_with_value, assert_hx_endpoint,
            assert_hx_redirect, assert_valid_html, must_get_form, parse_html_document,
            parse_html_fragment,
        },
        transaction::{
            NewTransaction, NewTransactionItem, PaymentMethod, create_transaction_with_items,
            delete_transaction, form::TransactionFormData, get_edit_transaction_page,
            get_transaction, update_transaction_endpoint,
        },
        user::create_user,
    };

    use super::EditTransactionState;

    fn get_state() -> EditTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user("Operador", "operador@example.com", &connection).unwrap();
        let client = create_client(ClientName::new_unchecked("Acme"), &connection).unwrap();
        create_transaction_with_items(
            &NewTransaction {
                transaction_date: date!(2025 - 01 - 15),
                payment_method: PaymentMethod::Pix,
                description: Some("Mensalidades".to_owned()),
                client_id: client.id,
                items: vec![
                    NewTransactionItem::new(1, Money::from_cents(5000)),
                    NewTransactionItem::new(1, Money::from_cents(5000)),
                ],
            },
            user.id,
            &connection,
        )
        .unwrap();

        EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[tokio::test]
    async fn page_shows_transaction_values() {
        let response = get_edit_transaction_page(Path(1), State(get_state()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::TRANSACTION, 1),
            "hx-put",
        );
        assert_form_input_with_value(&form, "transaction_date", "date", "2025-01-15");
        assert_form_input_with_value(&form, "client_name", "text", "Acme");

        let rows = Selector::parse("#transaction-items [data-item-row]").unwrap();
        assert_eq!(form.select(&rows).count(), 2);
    }

    #[tokio::test]
    async fn page_for_missing_transaction_is_not_found() {
        let result = get_edit_transaction_page(Path(99), State(get_state())).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn update_replaces_items() {
        let state = get_state();
        let form = TransactionFormData {
            transaction_date: "2025-01-20".to_owned(),
            payment_method: "Cartão de débito".to_owned(),
            client_id: "1".to_owned(),
            client_name: "Acme".to_owned(),
            category_id: strings(&["3"]),
            item_amount: strings(&["30.00"]),
            ..Default::default()
        };

        let response = update_transaction_endpoint(Path(1), State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let transaction = get_transaction(1, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transaction.items.len(), 1);
        assert_eq!(transaction.total_amount, Money::from_cents(3000));
        assert_eq!(transaction.payment_method, PaymentMethod::DebitCard);
        assert_eq!(transaction.description, None);
    }

    #[tokio::test]
    async fn invalid_amount_shows_error_in_form() {
        let state = get_state();
        let form = TransactionFormData {
            transaction_date: "2025-01-20".to_owned(),
            payment_method: "PIX".to_owned(),
            client_id: "1".to_owned(),
            category_id: strings(&["3"]),
            item_amount: strings(&["-5"]),
            ..Default::default()
        };

        let response = update_transaction_endpoint(Path(1), State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(
            &form,
            "Error: item 1 has the amount -5.00, item amounts must be greater than zero",
        );
        let transaction = get_transaction(1, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transaction.items.len(), 2);
    }

    #[tokio::test]
    async fn update_deleted_transaction_returns_not_found() {
        let state = get_state();
        delete_transaction(1, &state.db_connection.lock().unwrap()).unwrap();
        let form = TransactionFormData {
            transaction_date: "2025-01-20".to_owned(),
            payment_method: "PIX".to_owned(),
            client_id: "1".to_owned(),
            category_id: strings(&["3"]),
            item_amount: strings(&["5"]),
            ..Default::default()
        };

        let response = update_transaction_endpoint(Path(1), State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
