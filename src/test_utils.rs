#![allow(missing_docs)]

use axum::{body::Body, response::Response};
use scraper::{ElementRef, Html, Selector};

async fn response_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    String::from_utf8_lossy(&body).to_string()
}

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&response_text(response).await)
}

pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&response_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {got:?}"
    );
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    let selector = Selector::parse(&format!("input[name='{name}']")).unwrap();
    let input = form
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""));

    let input_type = input.value().attr("type").unwrap_or_default();
    let input_value = input.value().attr("value").unwrap_or_default();

    assert_eq!(
        input_type, type_,
        "want input with type \"{type_}\", got {input_type:?}"
    );
    assert_eq!(
        input_value, value,
        "want input with value \"{value}\", got {input_value:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input with name {name} to have the required attribute but got none"
    );
}
