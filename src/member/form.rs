//! The member form shared by the create and edit pages.

use maud::{Markup, html};

use crate::{
    Error,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, field_error},
    member::MemberFormData,
};

/// Where and how the member form is submitted.
pub(super) enum MemberFormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

/// Render the member form filled with `form`.
///
/// `error` is shown under the field it names, or above the submit button if it
/// does not name a member field.
pub(super) fn member_form_view(
    action: MemberFormAction,
    form: &MemberFormData,
    error: Option<&Error>,
) -> Markup {
    let message = error.map(|error| format!("Error: {error}"));
    let error_for = |field: &str| {
        message
            .as_deref()
            .filter(|_| error.and_then(Error::field) == Some(field))
    };
    let general_error = message.as_deref().filter(|_| {
        !matches!(
            error.and_then(Error::field),
            Some("name" | "email" | "phone" | "join_date")
        )
    });

    let (post_url, put_url, submit_text) = match action {
        MemberFormAction::Create(url) => (Some(url), None, "Create Member"),
        MemberFormAction::Update(url) => (None, Some(url), "Save Member"),
    };

    html! {
        form
            hx-post=[post_url]
            hx-put=[put_url]
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(form.name)
                    maxlength="255"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(error_for("name")))
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    id="email"
                    type="email"
                    name="email"
                    value=(form.email)
                    maxlength="255"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(error_for("email")))
            }

            div
            {
                label for="phone" class=(FORM_LABEL_STYLE) { "Phone (optional)" }

                input
                    id="phone"
                    type="tel"
                    name="phone"
                    value=(form.phone)
                    maxlength="255"
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(error_for("phone")))
            }

            div
            {
                label for="join_date" class=(FORM_LABEL_STYLE) { "Join Date" }

                input
                    id="join_date"
                    type="date"
                    name="join_date"
                    value=(form.join_date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(error_for("join_date")))
            }

            (field_error(general_error))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
