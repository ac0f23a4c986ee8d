//! FCP Pusher - Pusher Channels REST client
//!
//! This crate provides the authentication side of the Pusher Channels API:
//!
//! - **Request Signing**: canonical query strings signed with HMAC-SHA256
//! - **Channel Authorization**: `auth` / `channel_data` tokens for private and
//!   presence channels
//! - **Webhook Validation**: key and signature checks with replay protection
//! - **Endpoints**: trigger, batch trigger, channel and presence queries
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fcp_pusher::{PusherClient, PusherConfig};
//!
//! let client = PusherClient::new(
//!     PusherConfig::new("app_id", "key", "secret").with_cluster("eu"),
//! )?;
//!
//! // Publish an event
//! client.trigger("my-channel", "my-event", &json!({"message": "hi"}), None).await?;
//!
//! // Authorize a private channel subscription
//! let token = client.authenticate("private-orders", &socket_id, None)?;
//!
//! // Validate an inbound webhook
//! if let Some(payload) = client.validate_webhook(key, signature, body)? {
//!     for event in payload.events() { /* ... */ }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod canonical;
pub mod channel;
pub mod clock;
mod client;
mod config;
mod error;
pub mod json;
pub mod params;
pub mod request;
pub mod signature;
pub mod webhook;

pub use auth::{AuthToken, ChannelAuthorizer};
pub use canonical::{CanonicalString, Method};
pub use clock::{Clock, FixedClock, SystemClock};
pub use client::{BatchEvent, Channels, PusherClient};
pub use config::{Credentials, DEFAULT_HOST, PusherConfig};
pub use error::{PusherError, PusherResult};
pub use json::{CompactJsonEncoder, JsonEncoder};
pub use params::{ParamValue, Params, Scalar};
pub use request::{RequestDescriptor, RequestSigner, SignedRequest};
pub use signature::HmacSigner;
pub use webhook::{WebhookPayload, WebhookValidator};

use std::time::Duration;

/// Default webhook timestamp tolerance for replay protection.
pub const DEFAULT_TIMESTAMP_TOLERANCE: Duration = Duration::from_secs(300); // 5 minutes

/// Value of the `auth_version` query parameter.
pub const AUTH_VERSION: &str = "1.0";

/// Maximum channels per trigger.
pub const MAX_TRIGGER_CHANNELS: usize = 100;

/// Maximum events per batch trigger.
pub const MAX_BATCH_EVENTS: usize = 10;

/// Maximum encoded event data size.
pub const MAX_EVENT_DATA_BYTES: usize = 10 * 1024; // 10KB
