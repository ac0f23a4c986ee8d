//! Webhook Validation Fuzz Target
//!
//! Feeds arbitrary key, signature and body bytes through the validator.
//! Goal: never panic, and never accept a body whose signature was not
//! produced with the app secret.

#![no_main]

use std::sync::Arc;

use fcp_pusher::{FixedClock, PusherConfig, WebhookValidator, signature};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(credentials) = PusherConfig::new("4", "key", "secret").credentials() else {
        return;
    };
    let validator =
        WebhookValidator::with_clock(&credentials, Arc::new(FixedClock::from_unix_secs(1200)));

    // Split input into key | signature | body on the first two 0xff bytes.
    let mut parts = data.splitn(3, |b| *b == 0xff);
    let key = parts.next().unwrap_or_default();
    let sig = parts.next().unwrap_or_default();
    let body = parts.next().unwrap_or_default();

    let _ = validator.validate(key, sig, body);

    // A correctly signed body must never be rejected with an error.
    let signed = signature::sign(b"secret", &String::from_utf8_lossy(body));
    let body = String::from_utf8_lossy(body);
    assert!(
        validator
            .validate(b"key", signed.as_bytes(), body.as_bytes())
            .is_ok()
    );
});
