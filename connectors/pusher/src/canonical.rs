//! Canonical request strings.
//!
//! The canonical string is the exact input to the request signature:
//!
//! ```text
//! METHOD\nPATH\nk1=v1&k2=v2...
//! ```
//!
//! Keys are sorted by byte value, list values are comma-joined, and both keys
//! and values are percent-encoded per RFC 3986 (unreserved characters
//! `A-Z a-z 0-9 - . _ ~` pass through, everything else becomes `%XX`, so a
//! space is `%20`, never `+`).

use std::str::FromStr;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::{PusherError, PusherResult};
use crate::params::Params;

/// Characters escaped in canonical query strings: all but RFC 3986 unreserved.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// HTTP methods accepted by the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
}

impl Method {
    /// Uppercase method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PusherError;

    fn from_str(s: &str) -> PusherResult<Self> {
        if s.eq_ignore_ascii_case("GET") {
            Ok(Self::Get)
        } else if s.eq_ignore_ascii_case("POST") {
            Ok(Self::Post)
        } else {
            Err(PusherError::invalid_value(format!(
                "unsupported HTTP method: {s:?}"
            )))
        }
    }
}

/// A canonical, signable request string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalString {
    value: String,
    query_start: usize,
}

impl CanonicalString {
    /// The full string to sign.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The sorted, encoded query string portion.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.value[self.query_start..]
    }
}

impl std::fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Percent-encode a key or value for the canonical query string.
#[must_use]
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, QUERY_ENCODE_SET).to_string()
}

/// Build the sorted, encoded query string for `params`.
///
/// # Errors
///
/// Returns [`PusherError::Encoding`] if a value has no textual form.
pub fn encode_query(params: &Params) -> PusherResult<String> {
    let pairs = params
        .iter()
        .map(|(k, v)| {
            v.to_canonical()
                .map(|text| format!("{}={}", encode_component(k), encode_component(&text)))
        })
        .collect::<PusherResult<Vec<_>>>()?;
    Ok(pairs.join("&"))
}

/// Build the canonical string for a request.
///
/// # Errors
///
/// Returns [`PusherError::InvalidValue`] if `path` is empty and
/// [`PusherError::Encoding`] if a parameter cannot be stringified.
pub fn build(method: Method, path: &str, params: &Params) -> PusherResult<CanonicalString> {
    if path.is_empty() {
        return Err(PusherError::invalid_value("request path must not be empty"));
    }

    let query = encode_query(params)?;
    let head = format!("{method}\n{path}\n");
    let query_start = head.len();

    Ok(CanonicalString {
        value: head + &query,
        query_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamValue, Scalar};

    fn params(pairs: &[(&str, ParamValue)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("hello world"), "hello%20world");
        assert_eq!(encode_component("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(encode_component("test-_.~"), "test-_.~");
        assert_eq!(encode_component("a,b"), "a%2Cb");
        assert_eq!(encode_component("\u{e9}"), "%C3%A9");
    }

    #[test]
    fn test_build_sorts_keys() {
        let p = params(&[
            ("auth_version", "1.0".into()),
            ("auth_key", "key".into()),
            ("info", ParamValue::list(["user_count", "subscription_count"])),
        ]);

        let canonical = build(Method::Get, "/apps/4/channels", &p).unwrap();
        assert_eq!(
            canonical.as_str(),
            "GET\n/apps/4/channels\nauth_key=key&auth_version=1.0&info=user_count%2Csubscription_count"
        );
        assert_eq!(
            canonical.query(),
            "auth_key=key&auth_version=1.0&info=user_count%2Csubscription_count"
        );
    }

    #[test]
    fn test_build_empty_params() {
        let canonical = build(Method::Post, "/apps/4/events", &Params::new()).unwrap();
        assert_eq!(canonical.as_str(), "POST\n/apps/4/events\n");
        assert_eq!(canonical.query(), "");
    }

    #[test]
    fn test_build_rejects_empty_path() {
        assert!(matches!(
            build(Method::Get, "", &Params::new()),
            Err(PusherError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_build_rejects_unencodable_value() {
        let p = params(&[("ratio", ParamValue::Scalar(Scalar::Float(f64::INFINITY)))]);
        assert!(matches!(
            build(Method::Get, "/x", &p),
            Err(PusherError::Encoding(_))
        ));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
        assert!(matches!(
            "PUT".parse::<Method>(),
            Err(PusherError::InvalidValue(_))
        ));
    }
}
