//! Channel authorization tokens.
//!
//! Clients subscribing to `private-` and `presence-` channels ask the
//! application server for an [`AuthToken`]. The signed string is
//! `socket_id:channel`, with `:channel_data` appended for presence data.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::channel::{validate_channel, validate_socket_id};
use crate::config::Credentials;
use crate::error::{PusherError, PusherResult};
use crate::json::{CompactJsonEncoder, JsonEncoder};
use crate::signature::HmacSigner;

/// Authorization response returned to subscribing clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// `<key>:<hex hmac>`.
    pub auth: String,

    /// Encoded presence data, present only when custom data was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<String>,
}

/// Builds channel authorization tokens.
#[derive(Clone)]
pub struct ChannelAuthorizer {
    key: String,
    signer: HmacSigner,
    encoder: Arc<dyn JsonEncoder>,
}

impl ChannelAuthorizer {
    /// Create an authorizer using the compact JSON encoder.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_encoder(credentials, Arc::new(CompactJsonEncoder))
    }

    /// Create an authorizer with a custom JSON encoder for `channel_data`.
    #[must_use]
    pub fn with_encoder(credentials: &Credentials, encoder: Arc<dyn JsonEncoder>) -> Self {
        Self {
            key: credentials.key().to_string(),
            signer: HmacSigner::new(credentials.secret()),
            encoder,
        }
    }

    /// Authorize `socket_id` to subscribe to `channel`.
    ///
    /// An empty `custom_data` object is treated the same as `None`: no
    /// `channel_data` is produced and the encoder is not called.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidType`] if `custom_data` is not a JSON
    /// object, and [`PusherError::InvalidValue`] for a malformed channel name
    /// or socket id.
    pub fn authorize(
        &self,
        channel: &str,
        socket_id: &str,
        custom_data: Option<&Value>,
    ) -> PusherResult<AuthToken> {
        if custom_data.is_some_and(|data| !data.is_object()) {
            return Err(PusherError::invalid_type("custom data must be a JSON object"));
        }
        validate_channel(channel)?;
        validate_socket_id(socket_id)?;

        let channel_data = custom_data
            .filter(|data| data.as_object().is_some_and(|object| !object.is_empty()))
            .map(|data| self.encoder.encode(data))
            .transpose()?;

        let string_to_sign = match &channel_data {
            Some(data) => format!("{socket_id}:{channel}:{data}"),
            None => format!("{socket_id}:{channel}"),
        };

        debug!(
            channel,
            presence_data = channel_data.is_some(),
            "Authorized channel subscription"
        );

        Ok(AuthToken {
            auth: format!("{}:{}", self.key, self.signer.sign(&string_to_sign)),
            channel_data,
        })
    }
}

impl std::fmt::Debug for ChannelAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAuthorizer")
            .field("key", &self.key)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn authorizer() -> ChannelAuthorizer {
        ChannelAuthorizer::new(&Credentials::new("4", "foo", "bar").unwrap())
    }

    #[test]
    fn test_private_channel() {
        let token = authorizer().authorize("private-channel", "345.23", None).unwrap();
        assert_eq!(
            token.auth,
            "foo:89955e77e1b40e33df6d515a5ecbba86a01dc816a5b720da18a06fd26f7d92ff"
        );
        assert_eq!(token.channel_data, None);
    }

    #[test]
    fn test_presence_channel() {
        let custom_data = json!({"user_id": "fred", "user_info": {"key": "value"}});
        let token = authorizer()
            .authorize("presence-channel", "345.43245", Some(&custom_data))
            .unwrap();

        assert_eq!(
            token.channel_data.as_deref(),
            Some(r#"{"user_id":"fred","user_info":{"key":"value"}}"#)
        );
        assert_eq!(
            token.auth,
            "foo:e80ba6439492c2113022c39297a87a948de14061cc67b5788e045645a68b8ccd"
        );
    }

    #[test]
    fn test_serialized_shape_omits_absent_channel_data() {
        let token = authorizer().authorize("private-channel", "345.23", None).unwrap();
        let encoded = serde_json::to_value(&token).unwrap();
        assert_eq!(
            encoded,
            json!({"auth": "foo:89955e77e1b40e33df6d515a5ecbba86a01dc816a5b720da18a06fd26f7d92ff"})
        );
    }

    #[test]
    fn test_empty_custom_data_treated_as_absent() {
        let auth = authorizer();
        let with_empty = auth
            .authorize("presence-channel", "345.23", Some(&json!({})))
            .unwrap();
        let without = auth.authorize("presence-channel", "345.23", None).unwrap();

        assert_eq!(with_empty, without);
        assert_eq!(with_empty.channel_data, None);
    }

    #[test]
    fn test_rejects_invalid_input() {
        let auth = authorizer();
        assert!(matches!(
            auth.authorize("::", "345345", None),
            Err(PusherError::InvalidValue(_))
        ));
        assert!(matches!(
            auth.authorize("private-channel", "1:2", None),
            Err(PusherError::InvalidValue(_))
        ));
        assert!(matches!(
            auth.authorize("private-channel", "", None),
            Err(PusherError::InvalidValue(_))
        ));
        assert!(matches!(
            auth.authorize("presence-channel", "1.2", Some(&json!("fred"))),
            Err(PusherError::InvalidType(_))
        ));
    }
}
