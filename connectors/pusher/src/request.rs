//! Outbound request descriptors and signing.
//!
//! A [`RequestDescriptor`] says what to call; [`RequestSigner`] adds the
//! `auth_*` metadata, signs the canonical string and produces the exact query
//! string and body the transport must send.

use std::sync::Arc;

use tracing::debug;

use crate::AUTH_VERSION;
use crate::canonical::{self, Method};
use crate::clock::{Clock, SystemClock};
use crate::config::Credentials;
use crate::error::{PusherError, PusherResult};
use crate::json::{CompactJsonEncoder, JsonEncoder};
use crate::params::{ParamValue, Params, params_to_json};
use crate::signature::{HmacSigner, body_md5};

/// Query keys reserved for signing metadata.
pub const RESERVED_PARAMS: [&str; 5] = [
    "auth_key",
    "auth_timestamp",
    "auth_version",
    "auth_signature",
    "body_md5",
];

/// Description of a REST call, before signing.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    params: Params,
}

impl RequestDescriptor {
    /// Create a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidValue`] if `path` is empty or does not
    /// start with `/`, or if `params` uses a reserved signing key.
    pub fn new(method: Method, path: impl Into<String>, params: Params) -> PusherResult<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(PusherError::invalid_value(format!(
                "request path must start with '/': {path:?}"
            )));
        }
        if let Some(key) = params.keys().find(|k| RESERVED_PARAMS.contains(&k.as_str())) {
            return Err(PusherError::invalid_value(format!(
                "parameter {key:?} is reserved for request signing"
            )));
        }
        Ok(Self {
            method,
            path,
            params,
        })
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }
}

/// A signed request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Final query string, `auth_signature` last.
    pub query: String,
    /// JSON body for POST requests.
    pub body: Option<String>,
}

impl SignedRequest {
    /// Path and query joined, relative to the API base URL.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        format!("{}?{}", self.path, self.query)
    }
}

/// Signs outbound REST requests.
#[derive(Clone)]
pub struct RequestSigner {
    key: String,
    signer: HmacSigner,
    clock: Arc<dyn Clock>,
    encoder: Arc<dyn JsonEncoder>,
}

impl RequestSigner {
    /// Create a signer using the system clock and compact JSON bodies.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_parts(
            credentials,
            Arc::new(SystemClock),
            Arc::new(CompactJsonEncoder),
        )
    }

    /// Create a signer with an explicit clock and body encoder.
    #[must_use]
    pub fn with_parts(
        credentials: &Credentials,
        clock: Arc<dyn Clock>,
        encoder: Arc<dyn JsonEncoder>,
    ) -> Self {
        Self {
            key: credentials.key().to_string(),
            signer: HmacSigner::new(credentials.secret()),
            clock,
            encoder,
        }
    }

    /// Sign a request at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter cannot be encoded.
    pub fn sign(&self, request: &RequestDescriptor) -> PusherResult<SignedRequest> {
        self.sign_at(request, self.clock.now().timestamp())
    }

    /// Sign a request with an explicit unix timestamp in seconds.
    ///
    /// GET parameters travel in the query string. POST parameters are encoded
    /// as a JSON body, and only its `body_md5` joins the query.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Encoding`] if a parameter cannot be encoded.
    pub fn sign_at(
        &self,
        request: &RequestDescriptor,
        timestamp: i64,
    ) -> PusherResult<SignedRequest> {
        let (mut query_params, body) = match request.method {
            Method::Get => (request.params.clone(), None),
            Method::Post => {
                let body = self.encoder.encode(&params_to_json(&request.params)?)?;
                let mut query = Params::new();
                query.insert("body_md5".into(), body_md5(body.as_bytes()).into());
                (query, Some(body))
            }
        };

        query_params.insert("auth_key".into(), self.key.clone().into());
        query_params.insert("auth_timestamp".into(), ParamValue::from(timestamp));
        query_params.insert("auth_version".into(), AUTH_VERSION.into());

        let canonical = canonical::build(request.method, &request.path, &query_params)?;
        let signature = self.signer.sign(canonical.as_str());

        debug!(
            method = %request.method,
            path = %request.path,
            timestamp,
            "Signed Pusher API request"
        );

        Ok(SignedRequest {
            method: request.method,
            path: request.path.clone(),
            query: format!("{}&auth_signature={signature}", canonical.query()),
            body,
        })
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key", &self.key)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
