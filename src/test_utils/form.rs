use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    let selector = Selector::parse("form").unwrap();

    html.select(&selector).next().expect("no form in the HTML")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("form has no {attribute} attribute"));

    assert_eq!(got, endpoint, "want {attribute}=\"{endpoint}\", got {got:?}");
}

/// Find the input called `name` and check it is a required input of type `type_`.
#[track_caller]
fn must_get_required_input<'a>(form: &ElementRef<'a>, name: &str, type_: &str) -> ElementRef<'a> {
    let selector = Selector::parse(&format!("input[name=\"{name}\"]")).unwrap();
    let input = form
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("no input named \"{name}\""));

    let got_type = input.value().attr("type").unwrap_or_default();
    assert_eq!(got_type, type_, "want input {name} of type \"{type_}\", got {got_type:?}");
    assert!(
        input.value().attr("required").is_some(),
        "want input {name} to be required"
    );

    input
}

#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    must_get_required_input(form, name, type_);
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    let input = must_get_required_input(form, name, type_);
    let got_value = input.value().attr("value").unwrap_or_default();

    assert_eq!(got_value, value, "want input {name} with value \"{value}\", got {got_value:?}");
}

#[track_caller]
pub(crate) fn assert_form_submit_button_with_text(form: &ElementRef<'_>, text: &str) {
    let selector = Selector::parse("button[type=submit]").unwrap();
    let button = form
        .select(&selector)
        .next()
        .expect("no submit button in the form");

    assert_eq!(button.text().collect::<String>().trim(), text);
}

/// Check the first paragraph in the form, which is where field errors are rendered.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want: &str) {
    let selector = Selector::parse("p").unwrap();
    let message = form
        .select(&selector)
        .next()
        .expect("no error message in the form")
        .text()
        .collect::<String>();

    assert_eq!(message.trim(), want);
}
