//! Client configuration
//!
//! A `ClientConfig` describes where one API lives and how to authenticate with
//! it. Several services can be described in one YAML file, keyed by alias:
//!
//! ```yaml
//! zrc:
//!   scheme: https
//!   host: zaken.example.com
//!   port: 8443            # optional, defaults to the scheme's port
//!   base_path: /api/v1/   # optional
//!   auth:                 # optional
//!     client_id: some-client-id
//!     secret: very-secret
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use url::Url;
use uuid::{Uuid, Variant};

use crate::auth::AuthConfig;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_PATH: &str = "/api/v1/";
pub const DEFAULT_SCHEMA_LOCATION: &str = "schema/openapi.yaml";

/// Connection details for one API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct ClientConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Schema location, relative to the API root or absolute
    #[serde(default)]
    pub schema_location: Option<String>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: None,
            base_path: default_base_path(),
            schema_location: None,
            auth: None,
        }
    }
}

impl ClientConfig {
    /// Build a config from an API root such as `https://example.com/api/v1/`.
    pub fn from_api_root(api_root: &str) -> Result<Self> {
        let url = parse_url(api_root)?;
        let host = url.host_str().ok_or_else(|| Error::InvalidConfig {
            reason: format!("API root {api_root} has no host"),
        })?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port: url.port(),
            base_path: url.path().to_string(),
            ..Self::default()
        })
    }

    /// Build a config from the URL of a single resource.
    ///
    /// Detail URLs look like `/<base_path>/<collection>/<uuid>[/...]`, so the
    /// base path is everything before the collection preceding the first UUID.
    pub fn from_detail_url(detail_url: &str) -> Result<Self> {
        let url = parse_url(detail_url)?;
        let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

        let uuid_at = segments
            .iter()
            .position(|segment| is_uuid4(segment))
            .unwrap_or(segments.len());
        let collection_parent = &segments[..uuid_at.saturating_sub(1)];

        let mut config = Self::from_api_root(url.as_str())?;
        config.base_path = if collection_parent.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", collection_parent.join("/"))
        };
        Ok(config)
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_schema_location(mut self, location: impl Into<String>) -> Self {
        self.schema_location = Some(location.into());
        self
    }

    /// Scheme, host and non-default port, without the base path.
    pub fn base_url(&self) -> String {
        let base = format!("{}://{}", self.scheme, self.host);
        match self.port {
            Some(port) if Some(port) != default_port(&self.scheme) => format!("{base}:{port}"),
            _ => base,
        }
    }

    /// The full API root, e.g. `https://example.com/api/v1/`.
    ///
    /// `base_path` is always taken relative to the host, with or without its
    /// leading `/`.
    pub fn api_root(&self) -> String {
        let base_path = self.base_path.trim_start_matches('/');
        format!("{}/{base_path}", self.base_url())
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "https" => Some(443),
        "http" => Some(80),
        _ => None,
    }
}

/// Hyphenated version 4 UUID with the RFC 4122 variant, in either case.
fn is_uuid4(segment: &str) -> bool {
    segment.len() == 36
        && Uuid::parse_str(segment).is_ok_and(|uuid| {
            uuid.get_version_num() == 4 && uuid.get_variant() == Variant::RFC4122
        })
}

pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| Error::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// Load service configs from a YAML file mapping alias → config.
pub fn load_configs(path: impl AsRef<Path>) -> Result<HashMap<String, ClientConfig>> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    tracing::info!(path = %shown, "loading client config");

    let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: shown.clone(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| Error::ConfigParse {
        path: shown,
        source,
    })
}
