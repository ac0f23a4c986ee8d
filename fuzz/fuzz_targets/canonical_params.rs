//! Canonical String Fuzz Target
//!
//! Converts arbitrary JSON objects into request parameters and builds the
//! canonical signing string from them.

#![no_main]

use fcp_pusher::{Method, ParamValue, Params, canonical};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let mut params = Params::new();
    for (key, value) in &object {
        if let Ok(value) = ParamValue::try_from(value) {
            params.insert(key.clone(), value);
        }
    }

    if let Ok(canonical) = canonical::build(Method::Get, "/apps/4/channels", &params) {
        assert!(canonical.as_str().starts_with("GET\n/apps/4/channels\n"));
        assert!(!canonical.query().contains(' '));
    }
});
