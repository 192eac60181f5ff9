use crate::error::AppError;
use actix_web::http::header;
use actix_web::HttpRequest;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

fn header_value(req: &HttpRequest, name: header::HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Browsers submitting the site forms send `Accept: text/html`.
pub fn accepts_html(req: &HttpRequest) -> bool {
    header_value(req, header::ACCEPT).contains("text/html")
}

pub fn is_form_post(req: &HttpRequest) -> bool {
    header_value(req, header::CONTENT_TYPE).contains(FORM_CONTENT_TYPE)
}

/// First value of `name` in the query string. Repeated or malformed keys
/// never fail the request.
pub fn query_param(req: &HttpRequest, name: &str) -> Option<String> {
    form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Parses a request body sent either as a urlencoded form or as JSON.
///
/// Form bodies are chosen by content type; anything else is tried as JSON
/// first and as a form second. An empty body parses as an empty object.
pub fn parse_form_or_json<T: DeserializeOwned>(req: &HttpRequest, body: &[u8]) -> Result<T, AppError> {
    let value = if body.iter().all(|b| b.is_ascii_whitespace()) {
        JsonValue::Object(Map::new())
    } else if is_form_post(req) {
        form_to_json(body)
    } else {
        serde_json::from_slice::<JsonValue>(body).unwrap_or_else(|_| form_to_json(body))
    };

    serde_json::from_value(value).map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

fn form_to_json(body: &[u8]) -> JsonValue {
    let fields: Map<String, JsonValue> = form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), JsonValue::String(value.into_owned())))
        .collect();
    JsonValue::Object(fields)
}
