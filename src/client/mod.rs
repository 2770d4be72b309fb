//! Clients, the counterparties that transactions are recorded against.

mod core;
mod create_endpoint;
mod search_endpoint;

pub use core::{
    Client, ClientId, ClientName, create_client, create_client_table, get_all_clients,
    get_or_create_client, search_clients,
};
pub use create_endpoint::create_client_endpoint;
pub use search_endpoint::search_clients_endpoint;
