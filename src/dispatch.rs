//! Request assembly, dispatch and response classification
//!
//! Builds the final header set for a request, sends it through a blocking
//! reqwest client and turns the response into a JSON value or an error.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::headers::{merge_missing, parse_header};

const APPLICATION_JSON: &str = "application/json";

/// Per-call request settings: extra headers, query parameters, JSON body.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header. Caller headers win over schema defaults, but not over credentials.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// How the request URL of an operation is determined.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Resolve the operation's path template with these path parameters
    Params(&'a [(&'a str, &'a str)]),
    /// Use this URL as-is, skipping schema resolution
    Url(&'a str),
}

impl Default for Target<'_> {
    fn default() -> Self {
        Self::Params(&[])
    }
}

impl<'a> From<&'a [(&'a str, &'a str)]> for Target<'a> {
    fn from(params: &'a [(&'a str, &'a str)]) -> Self {
        Self::Params(params)
    }
}

impl<'a, const N: usize> From<&'a [(&'a str, &'a str); N]> for Target<'a> {
    fn from(params: &'a [(&'a str, &'a str); N]) -> Self {
        Self::Params(params)
    }
}

/// Build the header set for a request.
///
/// Caller headers come first; `Accept`/`Content-Type` and schema headers only
/// fill in names that are still missing; credentials always overwrite.
pub(crate) fn assemble_headers(
    caller: &[(String, String)],
    schema_headers: &BTreeMap<String, String>,
    credentials: Option<HeaderMap>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in caller {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }

    headers
        .entry(ACCEPT)
        .or_insert(HeaderValue::from_static(APPLICATION_JSON));
    headers
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(APPLICATION_JSON));
    merge_missing(
        &mut headers,
        schema_headers.iter().map(|(name, value)| (name.as_str(), value.as_str())),
    )?;

    if let Some(credentials) = credentials {
        headers.extend(credentials);
    }

    Ok(headers)
}

/// A response whose body has been read and, where possible, decoded.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

pub(crate) fn send_request(
    http: &HttpClient,
    method: Method,
    url: Url,
    headers: HeaderMap,
    options: &RequestOptions,
) -> Result<RawResponse> {
    let mut req = http.request(method, url).headers(headers);

    if !options.query.is_empty() {
        req = req.query(&options.query);
    }
    if let Some(body) = &options.json {
        req = req.json(body);
    }
    if let Some(timeout) = options.timeout {
        req = req.timeout(timeout);
    }

    let resp = req.send().map_err(Error::Request)?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let text = resp.text().map_err(Error::Request)?;

    Ok(RawResponse {
        status,
        headers,
        body: decode_body(&text),
    })
}

/// Decode a JSON body; anything that isn't JSON counts as no body.
pub(crate) fn decode_body(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Map the response status to the call outcome.
pub(crate) fn classify(
    status: StatusCode,
    expected: StatusCode,
    body: Option<Value>,
) -> Result<Value> {
    if status.is_client_error() {
        return Err(Error::ClientError { status, body });
    }
    if status.is_server_error() {
        return Err(Error::ServerError { status, body });
    }
    if status != expected {
        return Err(Error::UnexpectedStatus {
            expected,
            status,
            body,
        });
    }
    Ok(body.unwrap_or(Value::Null))
}

pub(crate) fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
