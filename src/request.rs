use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use url::form_urlencoded;

use crate::{QueryValue, Result};

/// HTTP methods the backend accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one logical call.
///
/// Built once and reused verbatim by every retry attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: Vec<(String, QueryValue)>,
    body: Option<serde_json::Value>,
    headers: BTreeMap<String, String>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends a query parameter. Insertion order is kept on the wire.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Appends several query parameters in iteration order.
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<QueryValue>,
    {
        self.query
            .extend(pairs.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Adds a per-call header that overrides a default header of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON body.
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` and sets it as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        Ok(self.body(value))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, QueryValue)] {
        &self.query
    }

    pub fn body_value(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn extra_headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Joins `base_url` and `path`, appending non-omitted query parameters as
/// `application/x-www-form-urlencoded` pairs.
pub(crate) fn build_url(base_url: &str, path: &str, query: &[(String, QueryValue)]) -> String {
    let mut url = format!("{base_url}{path}");

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut appended = 0usize;
    for (name, value) in query {
        if value.is_omitted() {
            continue;
        }
        serializer.append_pair(name, &value.to_query_string());
        appended += 1;
    }

    if appended > 0 {
        url.push(if path.contains('?') { '&' } else { '?' });
        url.push_str(&serializer.finish());
    }
    url
}

/// Overlays `extra` on top of `defaults`.
pub(crate) fn merge_headers(
    defaults: &BTreeMap<String, String>,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = defaults.clone();
    merged.extend(extra.iter().map(|(name, value)| (name.clone(), value.clone())));
    merged
}

/// Masks the `password` query value for logging.
pub fn redact_url(url: &str) -> String {
    let Some((head, query)) = url.split_once('?') else {
        return url.to_owned();
    };
    let query = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("password=") {
                "password=[HIDDEN]"
            } else {
                pair
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{head}?{query}")
}
