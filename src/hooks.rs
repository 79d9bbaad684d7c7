//! Request/response hooks
//!
//! A `RequestHook` sees every request right before it is sent and the decoded
//! body right after it arrives. Transforms such as URL rewriting of request
//! and response bodies plug in here.

use std::any::Any;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::dispatch::RequestOptions;

/// Opaque value handed from `pre_request` to the matching `post_response`.
pub type HookToken = Option<Box<dyn Any + Send>>;

pub trait RequestHook: Send + Sync {
    /// Called before dispatch. `options` may be modified in place.
    fn pre_request(
        &self,
        _method: &Method,
        _url: &Url,
        _options: &mut RequestOptions,
    ) -> HookToken {
        None
    }

    /// Called with the decoded response body (`None` when it was not JSON).
    fn post_response(&self, _token: HookToken, _body: Option<&mut Value>) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl RequestHook for NoHooks {}
