//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    client::{create_client_endpoint, search_clients_endpoint},
    endpoints,
    error_pages::get_404_not_found,
    member::{
        create_member_endpoint, delete_member_endpoint, get_edit_member_page,
        get_members_page_endpoint, get_new_member_page, update_member_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_edit_transaction_page,
        get_new_transaction_page, get_transaction_endpoint, get_transactions_page_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(
            endpoints::TRANSACTIONS_VIEW,
            get(get_transactions_page_endpoint),
        )
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(endpoints::TRANSACTION_VIEW, get(get_transaction_endpoint))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::MEMBERS_VIEW, get(get_members_page_endpoint))
        .route(endpoints::NEW_MEMBER_VIEW, get(get_new_member_page))
        .route(endpoints::EDIT_MEMBER_VIEW, get(get_edit_member_page));

    let api_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::MEMBERS_API,
            post(create_member_endpoint),
        )
        .route(
            endpoints::MEMBER,
            put(update_member_endpoint).delete(delete_member_endpoint),
        )
        .route(
            endpoints::CLIENTS_API,
            get(search_clients_endpoint).post(create_client_endpoint),
        );

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the transactions page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}
