//! Request accessor used by utility calls and link building
//!
//! The engine never talks to an HTTP layer directly. Hosts implement [`Request`] for their
//! request type; [`SimpleRequest`] covers tests and the command line.

use crate::locale::Locale;
use crate::value::Value;

/// Read access to the request a document is rendered for
pub trait Request {
    /// Request URI including the query string
    fn uri(&self) -> &str;

    /// Header value by case-insensitive name
    fn header(&self, name: &str) -> Option<&str>;

    /// Query parameter, percent-decoded
    fn parameter(&self, name: &str) -> Option<String> {
        let (_, query) = self.uri().split_once('?')?;
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if decode(key) == name {
                Some(decode(value))
            } else {
                None
            }
        })
    }

    /// Cookie value from the `Cookie` header
    fn cookie(&self, name: &str) -> Option<String> {
        self.header("Cookie")?.split(';').find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.trim_matches('"').to_string())
        })
    }

    /// Credentials of the authenticated user, an object with `username` and `role` members
    fn credentials(&self) -> Value {
        Value::Null
    }

    /// Context name of the application, prefixed to absolute `@{/...}` links
    fn context_name(&self) -> &str {
        ""
    }

    fn locale(&self) -> Locale {
        self.header("Accept-Language")
            .map(Locale::from_accept_language)
            .unwrap_or_default()
    }
}

fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    urlencoding::decode(&s)
        .map(|c| c.into_owned())
        .unwrap_or(s)
}

/// A plain request value
#[derive(Debug, Clone, Default)]
pub struct SimpleRequest {
    uri: String,
    headers: Vec<(String, String)>,
    credentials: Value,
    context_name: String,
}

impl SimpleRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_credentials(mut self, credentials: Value) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_context_name(mut self, context_name: impl Into<String>) -> Self {
        self.context_name = context_name.into();
        self
    }
}

impl Request for SimpleRequest {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn credentials(&self) -> Value {
        self.credentials.clone()
    }

    fn context_name(&self) -> &str {
        &self.context_name
    }
}
