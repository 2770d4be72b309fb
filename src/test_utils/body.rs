use axum::{body::Body, response::Response};
use scraper::Html;
use serde::de::DeserializeOwned;

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read the response body");

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse a full page, e.g. the output of [crate::html::base].
pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&body_text(response).await)
}

/// Parse a partial response such as a re-rendered form or an alert.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&body_text(response).await)
}

pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let text = body_text(response).await;

    serde_json::from_str(&text).unwrap_or_else(|error| panic!("invalid JSON {text:?}: {error}"))
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "HTML has parse errors: {:?}",
        html.errors
    );
}
