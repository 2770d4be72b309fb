//! Member editing page and endpoint.

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
    AppState, Error, ErrorKind, endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    member::{
        MemberFormData, MemberId, NewMember,
        form::{MemberFormAction, member_form_view},
        get_member, update_member,
    },
    navigation::NavBar,
};

/// The state needed for the edit member page and endpoint.
#[derive(Debug, Clone)]
pub struct EditMemberState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditMemberState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the member editing page, or the 404 page for a missing member.
pub async fn get_edit_member_page(
    Path(member_id): Path<MemberId>,
    State(state): State<EditMemberState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let member = get_member(member_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve member {member_id}: {error}");
        }
    })?;

    Ok(edit_member_view(member_id, &MemberFormData::from(&member)).into_response())
}

/// Handle member update form submission.
pub async fn update_member_endpoint(
    Path(member_id): Path<MemberId>,
    State(state): State<EditMemberState>,
    Form(form): Form<MemberFormData>,
) -> Response {
    let new_member = match NewMember::new(&form) {
        Ok(new_member) => new_member,
        Err(error) => return edit_member_form_view(member_id, &form, Some(&error)).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_member(member_id, &new_member, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::MEMBERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) if error.kind() == ErrorKind::Conflict => {
            edit_member_form_view(member_id, &form, Some(&error)).into_response()
        }
        Err(Error::UpdateMissingMember) => Error::UpdateMissingMember.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating member {member_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn edit_member_view(member_id: MemberId, form: &MemberFormData) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_MEMBER_VIEW, member_id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let form = edit_member_form_view(member_id, form, None);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "Edit Member" }
            (form)
        }
    };

    base("Edit Member", &[], &content)
}

fn edit_member_form_view(
    member_id: MemberId,
    form: &MemberFormData,
    error: Option<&Error>,
) -> Markup {
    let update_endpoint = endpoints::format_endpoint(endpoints::MEMBER, member_id);

    member_form_view(MemberFormAction::Update(&update_endpoint), form, error)
}
