//! Blocking REST client driven by an OpenAPI 3.0 schema.
//!
//! Request paths are resolved from `operationId`s, mandatory headers are read
//! from the schema's header parameters, and requests are authenticated with a
//! JWT bearer token.
//!
//! # Usage
//!
//! ```no_run
//! use oas_client::{Client, ClientConfig, AuthConfig, RequestOptions};
//! use serde_json::json;
//!
//! let config = ClientConfig::from_api_root("https://zaken.example.com/api/v1/")?
//!     .with_auth(AuthConfig::new("my-client", "my-secret"));
//! let client = Client::from_config("zrc", config)?;
//!
//! let zaak = client.create("zaak", json!({"omschrijving": "test"}), &[], RequestOptions::new())?;
//! let uuid = zaak["uuid"].as_str().unwrap_or_default();
//! let same = client.retrieve("zaak", &[("uuid", uuid)], RequestOptions::new())?;
//! # Ok::<(), oas_client::Error>(())
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod hooks;
pub mod log;
pub mod params;
pub mod spec;

pub use auth::{AuthConfig, ClientAuth, Credentials};
pub use client::{Action, Client, OperationSuffixes};
pub use config::{load_configs, ClientConfig};
pub use dispatch::{RequestOptions, Target};
pub use error::{Error, Result};
pub use headers::get_headers;
pub use hooks::{HookToken, NoHooks, RequestHook};
pub use log::{LogEntry, RequestLog};
pub use params::{extract_params, Params};
pub use spec::{find_operation, operation_pattern, operation_url};

// Re-export dependencies for downstream crates
pub use reqwest;
pub use serde_json;
