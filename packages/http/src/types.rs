use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP method for requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
            Method::PATCH => http::Method::PATCH,
        }
    }
}

/// Render ordered query pairs as a form-encoded query string (no leading `?`).
///
/// Pair order is preserved exactly.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// A full HTTP request specification, as handed to an [`HttpExecutor`].
///
/// [`HttpExecutor`]: crate::HttpExecutor
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HttpRequest {
    #[serde(default)]
    pub method: Method,

    /// Absolute URL without the query string.
    #[serde(default)]
    pub url: String,

    /// Query parameters, in wire order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Serialized request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json_body(mut self, body: &serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Length of the body in bytes, 0 when there is none.
    pub fn content_length(&self) -> usize {
        self.body.as_ref().map_or(0, |b| b.len())
    }

    /// The URL with its query string appended.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, encode_query(&self.query))
        }
    }
}

/// HTTP response from a request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Response headers
    pub headers: HashMap<String, String>,

    /// Response body as JSON value
    /// Will be null if body was empty or not valid JSON
    pub body: serde_json::Value,

    /// Raw body as string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

impl HttpResponse {
    /// Build a response from a status and raw body text.
    pub fn from_text(status: u16, status_text: impl Into<String>, body_text: String) -> Self {
        let body = serde_json::from_str(&body_text).unwrap_or(serde_json::Value::Null);
        Self {
            status,
            status_text: status_text.into(),
            headers: HashMap::new(),
            body,
            body_text: Some(body_text),
        }
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Raw body text, empty if the body was not captured.
    pub fn text(&self) -> &str {
        self.body_text.as_deref().unwrap_or("")
    }

    /// Try to deserialize the body into a specific type
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_keeps_insertion_order() {
        let request = HttpRequest::get("https://example.com/items")
            .with_query("pageSize", "10")
            .with_query("orderBy", "name")
            .with_query("showMissing", "true");

        assert_eq!(
            request.full_url(),
            "https://example.com/items?pageSize=10&orderBy=name&showMissing=true"
        );
    }

    #[test]
    fn query_values_are_form_encoded() {
        let pairs = vec![
            ("readTime".to_string(), "2024-01-01T00:00:00Z".to_string()),
            ("filter".to_string(), "a b".to_string()),
        ];
        assert_eq!(
            encode_query(&pairs),
            "readTime=2024-01-01T00%3A00%3A00Z&filter=a+b"
        );
    }

    #[test]
    fn full_url_without_query() {
        let request = HttpRequest::delete("https://example.com/x");
        assert_eq!(request.full_url(), "https://example.com/x");
        assert_eq!(request.method, Method::DELETE);
    }

    #[test]
    fn content_length_tracks_body() {
        let request = HttpRequest::post("https://example.com").with_body("{\"a\":1}");
        assert_eq!(request.content_length(), 7);
        assert_eq!(HttpRequest::get("https://example.com").content_length(), 0);
    }

    #[test]
    fn response_from_text_parses_json() {
        let response = HttpResponse::from_text(200, "OK", r#"{"name":"doc"}"#.to_string());
        assert!(response.is_success());
        assert_eq!(response.body["name"], "doc");
        assert_eq!(response.text(), r#"{"name":"doc"}"#);

        let plain = HttpResponse::from_text(503, "Service Unavailable", "busy".to_string());
        assert!(plain.is_server_error());
        assert_eq!(plain.body, serde_json::Value::Null);
    }

    #[test]
    fn method_conversion() {
        assert_eq!(http::Method::from(Method::PATCH), http::Method::PATCH);
        assert_eq!(Method::POST.to_string(), "POST");
    }
}
