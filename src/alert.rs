//! Alert fragments for reporting the outcome of form submissions and deletions.
//!
//! Alerts are swapped into the `#alert-container` element of the page layout,
//! either as the error target of a form or out-of-band.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

const SUCCESS_STYLE: &str = "flex items-start gap-3 p-4 mb-4 text-sm rounded-lg \
    text-green-800 bg-green-50 border border-green-300 \
    dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start gap-3 p-4 mb-4 text-sm rounded-lg \
    text-red-800 bg-red-50 border border-red-300 \
    dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

/// A message shown to the user after an action completes or fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with further details.
    Success {
        /// The headline.
        message: String,
        /// Extra context shown under the headline.
        details: String,
    },
    /// A success message with only a headline.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// An error message with details on how to fix it.
    Error {
        /// The headline.
        message: String,
        /// What went wrong and how to fix it.
        details: String,
    },
    /// An error message with only a headline.
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

impl Alert {
    /// Render the alert as an out-of-band swap for `#alert-container`.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, None),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div role="alert" class=(style)
                {
                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if let Some(details) = details {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        class="ms-auto font-bold"
                        onclick="this.closest('#alert-container').replaceChildren()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
