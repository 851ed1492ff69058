//! HTTP transport types for the SAS9API proxy.
//!
//! # Design
//! Requests and responses are described as plain data. `Sas9ApiClient`
//! builds `HttpRequest` values and classifies `HttpResponse` values; only a
//! `Transport` touches the network. Building and parsing therefore stay
//! deterministic and can be tested without a server.
//!
//! Query parameters are kept as an ordered list so the emitted query string
//! matches the order in which each endpoint assembles its parameters.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is the absolute URL without a query string; `endpoint` is the same
/// path relative to the client's base URL and is what errors and log events
/// report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The absolute URL including the percent-encoded query string.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.url)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Join `base_url` and a relative `endpoint` with exactly one `/` between
/// them.
///
/// Surrounding whitespace on `base_url` is ignored. The URL is not
/// validated.
pub fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_adds_missing_separator() {
        assert_eq!(join_url("http://host/api", "sas/"), "http://host/api/sas/");
    }

    #[test]
    fn join_url_keeps_single_existing_separator() {
        assert_eq!(join_url("http://host/api/", "sas/"), "http://host/api/sas/");
    }

    #[test]
    fn join_url_collapses_separators_on_both_sides() {
        assert_eq!(
            join_url("http://host/api//", "/sas/license"),
            "http://host/api/sas/license"
        );
    }

    #[test]
    fn join_url_ignores_surrounding_whitespace() {
        assert_eq!(join_url(" http://host:8080/ ", "sas/servers"), "http://host:8080/sas/servers");
    }

    #[test]
    fn full_url_encodes_query_in_order() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://host/sas/meta/search".to_string(),
            endpoint: "sas/meta/search".to_string(),
            query: vec![
                ("repositoryName".to_string(), "Foundation".to_string()),
                ("location".to_string(), "/Shared Data".to_string()),
            ],
            headers: Vec::new(),
            body: None,
        };
        assert_eq!(
            req.full_url(),
            "http://host/sas/meta/search?repositoryName=Foundation&location=%2FShared%20Data"
        );
        assert_eq!(req.query_value("location"), Some("/Shared Data"));
        assert_eq!(req.query_value("missing"), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            method: HttpMethod::Put,
            url: "http://host/sas/cmd".to_string(),
            endpoint: "sas/cmd".to_string(),
            query: Vec::new(),
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Some("proc print; run;".to_string()),
        };
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.method.to_string(), "PUT");
    }

    #[test]
    fn success_range_is_2xx() {
        let response = |status| HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(301).is_success());
        assert!(!response(404).is_success());
    }
}
