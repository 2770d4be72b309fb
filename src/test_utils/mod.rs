//! Assertions and parsers shared by the handler tests.
#![allow(missing_docs)]

mod body;
mod form;
mod http;

pub(crate) use body::{assert_valid_html, parse_html_document, parse_html_fragment, parse_json};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_submit_button_with_text, assert_hx_endpoint, must_get_form,
};
pub(crate) use http::{assert_content_type, assert_hx_redirect};
