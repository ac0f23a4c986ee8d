//! Inbound webhook validation.
//!
//! Validation runs in a fixed order: type check, key check, signature check,
//! parse, freshness check. Every authentication failure yields `Ok(None)` so
//! callers cannot tell which check failed; the reason is only logged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::DEFAULT_TIMESTAMP_TOLERANCE;
use crate::clock::{Clock, SystemClock};
use crate::config::Credentials;
use crate::error::{PusherError, PusherResult};
use crate::signature::HmacSigner;

/// Header carrying the application key.
pub const KEY_HEADER: &str = "X-Pusher-Key";

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Pusher-Signature";

/// An authenticated webhook body.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    time_ms: i64,
    body: Value,
}

impl WebhookPayload {
    /// Milliseconds since the epoch at which the webhook was sent.
    #[must_use]
    pub const fn time_ms(&self) -> i64 {
        self.time_ms
    }

    /// Events carried by the webhook, if any.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        self.body
            .get("events")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The full parsed body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the payload, returning the parsed body.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.body
    }
}

/// Validates webhooks sent by Pusher.
#[derive(Clone)]
pub struct WebhookValidator {
    key: String,
    signer: HmacSigner,
    clock: Arc<dyn Clock>,
    tolerance: Duration,
}

impl WebhookValidator {
    /// Create a validator reading the system clock.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_clock(credentials, Arc::new(SystemClock))
    }

    /// Create a validator with an explicit clock.
    #[must_use]
    pub fn with_clock(credentials: &Credentials, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: credentials.key().to_string(),
            signer: HmacSigner::new(credentials.secret()),
            clock,
            tolerance: DEFAULT_TIMESTAMP_TOLERANCE,
        }
    }

    /// Set the freshness window.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Current freshness window.
    #[must_use]
    pub const fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Validate a webhook from its raw key, signature and body.
    ///
    /// Returns `Ok(None)` for a wrong key, a bad signature, an unparseable
    /// body, or a timestamp outside the freshness window. The clock is read
    /// at most once, and only after the signature has been verified.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidType`] if any input is not UTF-8 text.
    pub fn validate(
        &self,
        key: &[u8],
        signature: &[u8],
        body: &[u8],
    ) -> PusherResult<Option<WebhookPayload>> {
        let key = as_text(key, "webhook key")?;
        let signature = as_text(signature, "webhook signature")?;
        let body = as_text(body, "webhook body")?;

        if key != self.key {
            warn!(reason = "key_mismatch", "Rejected webhook");
            return Ok(None);
        }

        if !self.signer.verify(body, signature) {
            warn!(reason = "bad_signature", "Rejected webhook");
            return Ok(None);
        }

        let parsed: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                warn!(reason = "malformed_body", error = %e, "Rejected webhook");
                return Ok(None);
            }
        };

        let Some(time_ms) = parsed.get("time_ms").and_then(Value::as_i64) else {
            warn!(reason = "missing_time_ms", "Rejected webhook");
            return Ok(None);
        };

        let now_ms = self.clock.now().timestamp_millis();
        let age_ms = now_ms.abs_diff(time_ms);
        if u128::from(age_ms) > self.tolerance.as_millis() {
            warn!(
                reason = "stale_timestamp",
                age_ms,
                tolerance_secs = self.tolerance.as_secs(),
                "Rejected webhook"
            );
            return Ok(None);
        }

        debug!(time_ms, "Validated webhook");
        Ok(Some(WebhookPayload {
            time_ms,
            body: parsed,
        }))
    }

    /// Validate a webhook using the `X-Pusher-Key` and `X-Pusher-Signature`
    /// headers, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidType`] if a header is missing, appears
    /// under more than one spelling, or any input is not UTF-8 text.
    pub fn validate_headers(
        &self,
        headers: &HashMap<String, String>,
        body: &[u8],
    ) -> PusherResult<Option<WebhookPayload>> {
        let key = find_header(headers, KEY_HEADER)?;
        let signature = find_header(headers, SIGNATURE_HEADER)?;
        self.validate(key.as_bytes(), signature.as_bytes(), body)
    }
}

impl std::fmt::Debug for WebhookValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookValidator")
            .field("key", &self.key)
            .field("signer", &self.signer)
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

fn as_text<'a>(bytes: &'a [u8], what: &str) -> PusherResult<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|_| PusherError::invalid_type(format!("{what} must be text")))
}

/// Case-insensitive header lookup. Two spellings of the same header are
/// rejected rather than picked between.
fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> PusherResult<&'a str> {
    let mut matches = headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str());

    let value = matches
        .next()
        .ok_or_else(|| PusherError::invalid_type(format!("missing {name} header")))?;
    if matches.next().is_some() {
        return Err(PusherError::invalid_type(format!("{name} header given more than once")));
    }
    Ok(value)
}
