//! JWT bearer credentials
//!
//! `ClientAuth` signs a HS256 token with the client id as issuer plus audit
//! claims, and hands it out as an `Authorization: Bearer <token>` header.

use std::sync::Mutex;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const JWT_ALG: Algorithm = Algorithm::HS256;

/// Anything that can produce authentication headers for a request.
pub trait Credentials: Send + Sync {
    /// Headers to set on every request. They override any header of the same name.
    fn credentials(&self) -> Result<HeaderMap>;
}

/// Authentication settings as found in a client config file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuthConfig {
    pub client_id: String,
    pub secret: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_representation: String,
    /// Extra claims forwarded to the token payload as-is
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl AuthConfig {
    pub fn new(client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: secret.into(),
            user_id: String::new(),
            user_representation: String::new(),
            claims: Map::new(),
        }
    }
}

/// JWT-based client authentication.
///
/// The token is generated on first use and reused for the lifetime of the
/// value, so `iat` reflects the first call to [`Credentials::credentials`].
#[derive(Debug)]
pub struct ClientAuth {
    config: AuthConfig,
    token: Mutex<Option<String>>,
}

impl ClientAuth {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            token: Mutex::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    pub fn secret(&self) -> &str {
        &self.config.secret
    }

    /// The encoded token, generating it on first use.
    pub fn token(&self) -> Result<String> {
        let mut cached = self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = encode(
            &Header::new(JWT_ALG),
            &self.payload(),
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(Error::Token)?;
        *cached = Some(token.clone());
        Ok(token)
    }

    fn payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("iss".into(), self.config.client_id.clone().into());
        payload.insert("iat".into(), chrono::Utc::now().timestamp().into());
        payload.insert("client_id".into(), self.config.client_id.clone().into());
        payload.insert("user_id".into(), self.config.user_id.clone().into());
        payload.insert(
            "user_representation".into(),
            self.config.user_representation.clone().into(),
        );
        for (claim, value) in &self.config.claims {
            payload.insert(claim.clone(), value.clone());
        }
        payload
    }
}

impl Credentials for ClientAuth {
    fn credentials(&self) -> Result<HeaderMap> {
        let bearer = format!("Bearer {}", self.token()?);
        let value = HeaderValue::from_str(&bearer).map_err(|_| Error::InvalidHeader {
            name: AUTHORIZATION.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
    use serde_json::json;

    fn bearer_token(auth: &ClientAuth) -> String {
        let headers = auth.credentials().unwrap();
        let value = headers[AUTHORIZATION].to_str().unwrap().to_string();
        let (scheme, token) = value.split_once(' ').unwrap();
        assert_eq!(scheme, "Bearer");
        token.to_string()
    }

    fn claims(token: &str, secret: &str) -> Map<String, Value> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let key = DecodingKey::from_secret(secret.as_bytes());
        decode::<Map<String, Value>>(token, &key, &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn credentials_are_a_bearer_jwt() {
        let auth = ClientAuth::new(AuthConfig::new("client_id", "secret"));
        let token = bearer_token(&auth);
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn token_carries_client_claims() {
        let auth = ClientAuth::new(AuthConfig::new("client id", "secret"));
        let payload = claims(&bearer_token(&auth), "secret");

        assert_eq!(payload["client_id"], "client id");
        assert_eq!(payload["iss"], "client id");
        assert!(payload["iat"].is_i64());
        assert!(!payload.contains_key("zds"));
    }

    #[test]
    fn token_forwards_extra_claims() {
        let mut config = AuthConfig::new("client", "secret");
        config.user_id = "u-1".into();
        config.claims.insert("scopes".into(), json!(["read"]));
        let payload = claims(&bearer_token(&ClientAuth::new(config)), "secret");

        assert_eq!(payload["user_id"], "u-1");
        assert_eq!(payload["scopes"], json!(["read"]));
    }

    #[test]
    fn token_uses_hs256() {
        let auth = ClientAuth::new(AuthConfig::new("dummy", "dummy"));
        let header = decode_header(&bearer_token(&auth)).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn credentials_are_cached() {
        let auth = ClientAuth::new(AuthConfig::new("dummy", "dummy"));
        assert_eq!(bearer_token(&auth), bearer_token(&auth));
    }
}
