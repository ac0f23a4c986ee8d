//! Channel, event and socket id validation.
//!
//! Every check here runs before anything is signed or sent.

use crate::error::{PusherError, PusherResult};

/// Prefix of channels that require authorization.
pub const PRIVATE_PREFIX: &str = "private-";

/// Prefix of presence channels.
pub const PRESENCE_PREFIX: &str = "presence-";

/// Maximum channel name length.
pub const MAX_CHANNEL_NAME_LEN: usize = 200;

/// Maximum event name length.
pub const MAX_EVENT_NAME_LEN: usize = 200;

/// Channel kind derived from the name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// No authorization required.
    Public,
    /// `private-` channel.
    Private,
    /// `presence-` channel.
    Presence,
}

impl ChannelKind {
    /// Classify a channel name by its prefix.
    #[must_use]
    pub fn of(channel: &str) -> Self {
        if channel.starts_with(PRESENCE_PREFIX) {
            Self::Presence
        } else if channel.starts_with(PRIVATE_PREFIX) {
            Self::Private
        } else {
            Self::Public
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Presence => write!(f, "presence"),
        }
    }
}

const fn is_channel_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'_' | b'-' | b'=' | b'@' | b',' | b'.' | b';')
}

/// Validate a channel name.
///
/// # Errors
///
/// Returns [`PusherError::InvalidValue`] if the name is empty, too long, or
/// contains characters outside `[A-Za-z0-9_\-=@,.;]`.
pub fn validate_channel(channel: &str) -> PusherResult<()> {
    if channel.is_empty() {
        return Err(PusherError::invalid_value("channel name must not be empty"));
    }
    if channel.len() > MAX_CHANNEL_NAME_LEN {
        return Err(PusherError::invalid_value(format!(
            "channel name exceeds {MAX_CHANNEL_NAME_LEN} characters"
        )));
    }
    if !channel.bytes().all(is_channel_byte) {
        return Err(PusherError::invalid_value(format!(
            "invalid channel name: {channel:?}"
        )));
    }
    Ok(())
}

/// Validate a socket id.
///
/// # Errors
///
/// Returns [`PusherError::InvalidValue`] if the id is empty or contains the
/// reserved `:` delimiter.
pub fn validate_socket_id(socket_id: &str) -> PusherResult<()> {
    if socket_id.is_empty() {
        return Err(PusherError::invalid_value("socket id must not be empty"));
    }
    if socket_id.contains(':') {
        return Err(PusherError::invalid_value(format!(
            "invalid socket id: {socket_id:?}"
        )));
    }
    Ok(())
}

/// Validate an event name.
///
/// # Errors
///
/// Returns [`PusherError::InvalidValue`] if the name is empty or too long.
pub fn validate_event_name(event_name: &str) -> PusherResult<()> {
    if event_name.is_empty() {
        return Err(PusherError::invalid_value("event name must not be empty"));
    }
    if event_name.chars().count() > MAX_EVENT_NAME_LEN {
        return Err(PusherError::invalid_value(format!(
            "event name exceeds {MAX_EVENT_NAME_LEN} characters"
        )));
    }
    Ok(())
}
