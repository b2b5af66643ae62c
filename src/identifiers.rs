//! Identifier templating.
//!
//! Every `id` in an emitted document is produced by filling a configured
//! template with the request's scheme and host and the entity identifier.

use std::sync::OnceLock;

use axum::http::HeaderMap;
use regex::{Captures, Regex};

/// Scheme and host a request was addressed to, after proxy forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBase {
    pub scheme: String,
    pub host: String,
}

impl RequestBase {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Prefer `X-Forwarded-Proto`/`X-Forwarded-Host`, falling back to `http` and `Host`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            scheme: header("x-forwarded-proto").unwrap_or_else(|| "http".to_string()),
            host: header("x-forwarded-host")
                .or_else(|| header("host"))
                .unwrap_or_else(|| "localhost".to_string()),
        }
    }

    /// `{scheme}://{host}{path}`
    pub fn url(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, path)
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"))
}

/// Fill `template` for `identifier`. `range` fills `{range}` for range identifiers;
/// unknown placeholders are left as they are.
pub fn get_identifier(
    base: &RequestBase,
    identifier: &str,
    template: &str,
    range: Option<&str>,
) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "scheme" => base.scheme.clone(),
            "host" => base.host.clone(),
            "identifier" => identifier.to_string(),
            "range" => range.map(str::to_string).unwrap_or_else(|| caps[0].to_string()),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_headers_win() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:8001"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("iiif.example.org"));

        let base = RequestBase::from_headers(&headers);
        assert_eq!(base, RequestBase::new("https", "iiif.example.org"));
    }

    #[test]
    fn test_falls_back_to_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:8001"));
        let base = RequestBase::from_headers(&headers);
        assert_eq!(base.url("/info.json"), "http://internal:8001/info.json");
    }

    #[test]
    fn test_template_fill() {
        let base = RequestBase::new("https", "iiif.example.org");
        let id = get_identifier(&base, "abc", "{scheme}://{host}/iiif/manifest/{identifier}.json", None);
        assert_eq!(id, "https://iiif.example.org/iiif/manifest/abc.json");

        let range = get_identifier(&base, "abc", "{scheme}://{host}/iiif/range/{identifier}/{range}", Some("LOG_0001"));
        assert_eq!(range, "https://iiif.example.org/iiif/range/abc/LOG_0001");
    }

    #[test]
    fn test_unknown_placeholders_survive() {
        let base = RequestBase::new("http", "h");
        let id = get_identifier(&base, "x", "{scheme}://{host}/{identifier}/{other}/{range}", None);
        assert_eq!(id, "http://h/x/{other}/{range}");
    }
}
