//! Member creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, ErrorKind, endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    member::{
        MemberFormData, NewMember, create_member,
        form::{MemberFormAction, member_form_view},
    },
    navigation::NavBar,
};

/// The state needed for creating a member.
#[derive(Debug, Clone)]
pub struct CreateMemberState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateMemberState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the member creation page.
pub async fn get_new_member_page() -> Response {
    new_member_view().into_response()
}

/// Handle member creation form submission.
///
/// Invalid input and a taken email re-render the form with the message next
/// to the offending field.
pub async fn create_member_endpoint(
    State(state): State<CreateMemberState>,
    Form(form): Form<MemberFormData>,
) -> Response {
    let new_member = match NewMember::new(&form) {
        Ok(new_member) => new_member,
        Err(error) => return new_member_form_view(&form, Some(&error)).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_member(&new_member, &connection) {
        Ok(member) => {
            tracing::info!("Created member {} ({})", member.id, member.name);
            (
                HxRedirect(endpoints::MEMBERS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) if error.kind() == ErrorKind::Conflict => {
            new_member_form_view(&form, Some(&error)).into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a member: {error}");
            error.into_alert_response()
        }
    }
}

fn new_member_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_MEMBER_VIEW).into_html();
    let form = new_member_form_view(&MemberFormData::default(), None);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "New Member" }
            (form)
        }
    };

    base("Create Member", &[], &content)
}

fn new_member_form_view(form: &MemberFormData, error: Option<&Error>) -> Markup {
    member_form_view(MemberFormAction::Create(endpoints::MEMBERS_API), form, error)
}
