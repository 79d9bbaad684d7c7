//! Schema-driven REST client
//!
//! `Client` resolves request paths and mandatory headers from the API's
//! OpenAPI schema, adds credentials, and performs one blocking HTTP call per
//! operation.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::auth::{ClientAuth, Credentials};
use crate::config::{parse_url, ClientConfig, DEFAULT_SCHEMA_LOCATION};
use crate::dispatch::{
    assemble_headers, classify, header_pairs, send_request, RequestOptions, Target,
};
use crate::error::{Error, Result};
use crate::headers::{get_headers, parse_header};
use crate::hooks::{NoHooks, RequestHook};
use crate::log::{LogEntry, LoggedRequest, LoggedResponse, RequestLog};
use crate::params::{extract_params, Params};
use crate::spec::{operation_pattern, operation_url};

/// Response header that may announce the schema's OpenAPI version.
pub const OAS_VERSION_HEADER: &str = "X-OAS-Version";

/// The semantic operations every resource may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl Action {
    pub fn method(self) -> Method {
        match self {
            Self::List | Self::Retrieve => Method::GET,
            Self::Create => Method::POST,
            Self::Update => Method::PUT,
            Self::PartialUpdate => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    pub fn expected_status(self) -> StatusCode {
        match self {
            Self::Create => StatusCode::CREATED,
            Self::Delete => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        }
    }
}

/// `operationId` suffixes appended to a resource name, per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSuffixes {
    pub list: String,
    pub retrieve: String,
    pub create: String,
    pub update: String,
    pub partial_update: String,
    pub delete: String,
}

impl Default for OperationSuffixes {
    fn default() -> Self {
        Self {
            list: "_list".into(),
            retrieve: "_read".into(),
            create: "_create".into(),
            update: "_update".into(),
            partial_update: "_partial_update".into(),
            delete: "_delete".into(),
        }
    }
}

impl OperationSuffixes {
    pub fn suffix(&self, action: Action) -> &str {
        match action {
            Action::List => &self.list,
            Action::Retrieve => &self.retrieve,
            Action::Create => &self.create,
            Action::Update => &self.update,
            Action::PartialUpdate => &self.partial_update,
            Action::Delete => &self.delete,
        }
    }

    pub fn operation_id(&self, resource: &str, action: Action) -> String {
        format!("{resource}{}", self.suffix(action))
    }
}

/// Client for one API, configured by its root URL and described by its schema.
///
/// The schema is fetched on first use and kept for the lifetime of the client.
pub struct Client {
    service: String,
    config: ClientConfig,
    base_url: Url,
    http: HttpClient,
    auth: Option<Arc<dyn Credentials>>,
    hooks: Arc<dyn RequestHook>,
    suffixes: OperationSuffixes,
    schema: Mutex<Option<Arc<Value>>>,
    log: RequestLog,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("service", &self.service)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client for the API rooted at `api_root`.
    pub fn new(api_root: &str) -> Result<Self> {
        Self::from_config(api_root, ClientConfig::from_api_root(api_root)?)
    }

    /// Create a client from a config, naming it `service` in the request log.
    pub fn from_config(service: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let base_url = parse_url(&config.api_root())?;
        let auth = config
            .auth
            .clone()
            .map(|auth| Arc::new(ClientAuth::new(auth)) as Arc<dyn Credentials>);

        Ok(Self {
            service: service.into(),
            config,
            base_url,
            http: HttpClient::new(),
            auth,
            hooks: Arc::new(NoHooks),
            suffixes: OperationSuffixes::default(),
            schema: Mutex::new(None),
            log: RequestLog::global(),
        })
    }

    /// Create a client for the API serving the given resource URL.
    pub fn from_detail_url(detail_url: &str) -> Result<Self> {
        let config = ClientConfig::from_detail_url(detail_url)?;
        Self::from_config(config.base_url(), config)
    }

    pub fn with_auth(mut self, auth: impl Credentials + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    pub fn with_hooks(mut self, hooks: impl RequestHook + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Use a preconfigured HTTP client (timeouts, TLS, proxies).
    pub fn with_http_client(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    pub fn with_operation_suffixes(mut self, suffixes: OperationSuffixes) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn with_log(mut self, log: RequestLog) -> Self {
        self.log = log;
        self
    }

    /// Use an already parsed schema instead of fetching it.
    pub fn with_schema(self, schema: Value) -> Self {
        *self.schema.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(schema));
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        self.base_url = parse_url(base_url)?;
        Ok(())
    }

    /// Request log entries recorded for this client's service.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.log.entries_for(&self.service)
    }

    /// The API schema, fetched on first access.
    pub fn schema(&self) -> Result<Arc<Value>> {
        let mut cached = self.schema.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(schema) = cached.as_ref() {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.fetch_schema_document()?);
        *cached = Some(Arc::clone(&schema));
        Ok(schema)
    }

    /// Make sure the schema is loaded. Fetches at most once per client.
    pub fn fetch_schema(&self) -> Result<()> {
        self.schema().map(drop)
    }

    fn schema_url(&self) -> Result<Url> {
        let location = self
            .config
            .schema_location
            .as_deref()
            .unwrap_or(DEFAULT_SCHEMA_LOCATION);
        self.join_url(location)
    }

    fn fetch_schema_document(&self) -> Result<Value> {
        let url = self.schema_url()?;
        info!(%url, "fetching schema");

        let resp = self.http.get(url).send().map_err(Error::Request)?;
        let status = resp.status();
        let header_version = resp
            .headers()
            .get(OAS_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp.text().map_err(Error::Request)?;

        if !status.is_success() {
            classify(status, StatusCode::OK, None)?;
        }

        let document: Value = serde_yaml::from_str(&text).map_err(Error::SchemaParse)?;
        check_schema_version(header_version, &document)?;
        Ok(document)
    }

    /// Resolve the request path of an operation below this client's base URL.
    pub fn operation_path(&self, operation_id: &str, params: &[(&str, &str)]) -> Result<String> {
        let schema = self.schema()?;
        operation_url(
            &schema,
            operation_id,
            Some(self.base_url.as_str()),
            params.iter().copied(),
        )
    }

    /// Recover the path parameters of an operation from one of its concrete URLs.
    pub fn params_from_url(&self, operation_id: &str, url: &str) -> Result<Params> {
        let schema = self.schema()?;
        let pattern = operation_pattern(&schema, operation_id, None)?;
        Ok(extract_params(url, &pattern))
    }

    pub fn list(
        &self,
        resource: &str,
        params: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<Value> {
        self.call(Action::List, resource, Target::Params(params), None, options)
    }

    pub fn retrieve<'a>(
        &self,
        resource: &str,
        target: impl Into<Target<'a>>,
        options: RequestOptions,
    ) -> Result<Value> {
        self.call(Action::Retrieve, resource, target.into(), None, options)
    }

    pub fn create(
        &self,
        resource: &str,
        data: Value,
        params: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<Value> {
        self.call(Action::Create, resource, Target::Params(params), Some(data), options)
    }

    pub fn update<'a>(
        &self,
        resource: &str,
        data: Value,
        target: impl Into<Target<'a>>,
        options: RequestOptions,
    ) -> Result<Value> {
        self.call(Action::Update, resource, target.into(), Some(data), options)
    }

    pub fn partial_update<'a>(
        &self,
        resource: &str,
        data: Value,
        target: impl Into<Target<'a>>,
        options: RequestOptions,
    ) -> Result<Value> {
        self.call(Action::PartialUpdate, resource, target.into(), Some(data), options)
    }

    pub fn delete<'a>(
        &self,
        resource: &str,
        target: impl Into<Target<'a>>,
        options: RequestOptions,
    ) -> Result<Value> {
        self.call(Action::Delete, resource, target.into(), None, options)
    }

    /// Call any operation by its `operationId`. Expects HTTP 200.
    pub fn operation<'a>(
        &self,
        operation_id: &str,
        method: Method,
        data: Option<Value>,
        target: impl Into<Target<'a>>,
        mut options: RequestOptions,
    ) -> Result<Value> {
        let path = self.target_path(operation_id, target.into())?;
        if data.is_some() {
            options.json = data;
        }
        self.request(&path, operation_id, method, StatusCode::OK, options)
    }

    fn call(
        &self,
        action: Action,
        resource: &str,
        target: Target<'_>,
        data: Option<Value>,
        mut options: RequestOptions,
    ) -> Result<Value> {
        let operation_id = self.suffixes.operation_id(resource, action);
        let path = self.target_path(&operation_id, target)?;
        if data.is_some() {
            options.json = data;
        }
        self.request(
            &path,
            &operation_id,
            action.method(),
            action.expected_status(),
            options,
        )
    }

    fn target_path(&self, operation_id: &str, target: Target<'_>) -> Result<String> {
        match target {
            Target::Url(url) => Ok(url.to_string()),
            Target::Params(params) => self.operation_path(operation_id, params),
        }
    }

    fn join_url(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path).map_err(|source| Error::InvalidUrl {
            url: path.to_string(),
            source,
        })
    }

    /// Perform a request for `operation_id` against `path`.
    ///
    /// `path` is joined onto the base URL, so it may be relative, absolute
    /// (`/api/v1/...`) or a full URL. Returns the decoded JSON body, or
    /// `Value::Null` when the response has none.
    pub fn request(
        &self,
        path: &str,
        operation_id: &str,
        method: Method,
        expected_status: StatusCode,
        mut options: RequestOptions,
    ) -> Result<Value> {
        let url = self.join_url(path)?;

        let schema = self.schema()?;
        let schema_headers = get_headers(&schema, operation_id)?;
        let credentials = self
            .auth
            .as_ref()
            .map(|auth| auth.credentials())
            .transpose()?;
        let headers = assemble_headers(&options.headers, &schema_headers, credentials)?;
        options.headers = header_pairs(&headers);

        let token = self.hooks.pre_request(&method, &url, &mut options);
        let headers = to_header_map(&options.headers)?;

        debug!(%method, %url, operation_id, "sending request");
        let response = send_request(&self.http, method.clone(), url.clone(), headers, &options)?;
        debug!(%method, %url, status = %response.status, "received response");

        let mut body = response.body;
        self.hooks.post_response(token, body.as_mut());

        self.log.add(LogEntry {
            timestamp: Utc::now(),
            service: self.service.clone(),
            request: LoggedRequest {
                url: url.to_string(),
                method: method.to_string(),
                headers: options.headers,
                params: options.query,
                data: options.json,
            },
            response: LoggedResponse {
                status: response.status.as_u16(),
                headers: header_pairs(&response.headers),
                data: body.clone(),
            },
        });

        classify(response.status, expected_status, body)
    }
}

fn to_header_map(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let (name, value) = parse_header(name, value)?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Only OpenAPI 3.0.x documents are supported.
fn check_schema_version(header_version: Option<String>, document: &Value) -> Result<()> {
    let version = header_version.or_else(|| {
        ["openapi", "swagger"]
            .iter()
            .find_map(|key| document.get(key))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    });

    match version {
        Some(v) if v.starts_with("3.0") => Ok(()),
        version => Err(Error::UnsupportedSchemaVersion { version }),
    }
}
