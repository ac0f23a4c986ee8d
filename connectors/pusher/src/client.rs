//! Pusher REST API client.
//!
//! Endpoint builders (`*_request`) validate their inputs and produce a
//! [`RequestDescriptor`]; the async methods of the same name sign and send it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::auth::{AuthToken, ChannelAuthorizer};
use crate::canonical::Method;
use crate::channel::{
    ChannelKind, validate_channel, validate_event_name, validate_socket_id,
};
use crate::clock::{Clock, SystemClock};
use crate::config::{Credentials, PusherConfig};
use crate::error::{PusherError, PusherResult};
use crate::json::{CompactJsonEncoder, JsonEncoder};
use crate::params::{ParamValue, Params};
use crate::request::{RequestDescriptor, RequestSigner, SignedRequest};
use crate::webhook::{WebhookPayload, WebhookValidator};
use crate::{MAX_BATCH_EVENTS, MAX_EVENT_DATA_BYTES, MAX_TRIGGER_CHANNELS};

/// One or many channel names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channels {
    /// A single channel.
    One(String),
    /// Several channels.
    Many(Vec<String>),
}

impl Channels {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(channel) => vec![channel],
            Self::Many(channels) => channels,
        }
    }
}

impl From<&str> for Channels {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for Channels {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for Channels {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl From<&[&str]> for Channels {
    fn from(value: &[&str]) -> Self {
        Self::Many(value.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Channels {
    fn from(value: [&str; N]) -> Self {
        Self::Many(value.iter().map(|s| (*s).to_string()).collect())
    }
}

/// One event of a batch trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEvent {
    /// Target channel.
    pub channel: String,
    /// Event name.
    pub name: String,
    /// Event data; strings are sent verbatim, anything else is JSON encoded.
    pub data: Value,
    /// Socket id to exclude from delivery.
    pub socket_id: Option<String>,
}

impl BatchEvent {
    /// Create a batch event.
    #[must_use]
    pub fn new(channel: impl Into<String>, name: impl Into<String>, data: Value) -> Self {
        Self {
            channel: channel.into(),
            name: name.into(),
            data,
            socket_id: None,
        }
    }

    /// Exclude a socket from delivery.
    #[must_use]
    pub fn with_socket_id(mut self, socket_id: impl Into<String>) -> Self {
        self.socket_id = Some(socket_id.into());
        self
    }
}

/// Pusher Channels REST client.
#[derive(Clone)]
pub struct PusherClient {
    config: PusherConfig,
    credentials: Credentials,
    http: Client,
    base_url: String,
    clock: Arc<dyn Clock>,
    encoder: Arc<dyn JsonEncoder>,
    request_signer: RequestSigner,
    authorizer: ChannelAuthorizer,
    webhook_validator: WebhookValidator,
}

impl PusherClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: PusherConfig) -> PusherResult<Self> {
        config.validate()?;
        let credentials = config.credentials()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("fcp-pusher/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let encoder: Arc<dyn JsonEncoder> = Arc::new(CompactJsonEncoder);

        Ok(Self {
            base_url: config.base_url(),
            request_signer: RequestSigner::with_parts(&credentials, clock.clone(), encoder.clone()),
            authorizer: ChannelAuthorizer::with_encoder(&credentials, encoder.clone()),
            webhook_validator: WebhookValidator::with_clock(&credentials, clock.clone()),
            config,
            credentials,
            http,
            clock,
            encoder,
        })
    }

    /// Create a client from a `http[s]://key:secret@host/apps/{app_id}` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn from_url(url: &str) -> PusherResult<Self> {
        Self::new(PusherConfig::from_url(url)?)
    }

    /// Replace the clock used for signing timestamps and webhook freshness.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.rebuild_components()
    }

    /// Replace the JSON encoder used for event data, bodies and
    /// `channel_data`.
    #[must_use]
    pub fn with_json_encoder(mut self, encoder: Arc<dyn JsonEncoder>) -> Self {
        self.encoder = encoder;
        self.rebuild_components()
    }

    /// Replace the webhook freshness window.
    #[must_use]
    pub fn with_webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.webhook_validator = self.webhook_validator.with_tolerance(tolerance);
        self
    }

    fn rebuild_components(mut self) -> Self {
        let tolerance = self.webhook_validator.tolerance();
        self.request_signer =
            RequestSigner::with_parts(&self.credentials, self.clock.clone(), self.encoder.clone());
        self.authorizer = ChannelAuthorizer::with_encoder(&self.credentials, self.encoder.clone());
        self.webhook_validator = WebhookValidator::with_clock(&self.credentials, self.clock.clone())
            .with_tolerance(tolerance);
        self
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &PusherConfig {
        &self.config
    }

    /// Application key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.credentials.key()
    }

    fn app_path(&self, suffix: &str) -> String {
        format!("/apps/{}{suffix}", self.credentials.app_id())
    }

    fn encode_data(&self, data: &Value) -> PusherResult<String> {
        let encoded = match data {
            Value::String(s) => s.clone(),
            other => self.encoder.encode(other)?,
        };
        if encoded.len() > MAX_EVENT_DATA_BYTES {
            return Err(PusherError::invalid_value(format!(
                "event data exceeds {MAX_EVENT_DATA_BYTES} bytes"
            )));
        }
        Ok(encoded)
    }

    /// Build a trigger request.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidValue`] for invalid channels, event name,
    /// socket id or oversized data.
    pub fn trigger_request(
        &self,
        channels: impl Into<Channels>,
        event_name: &str,
        data: &Value,
        socket_id: Option<&str>,
    ) -> PusherResult<RequestDescriptor> {
        let channels = channels.into().into_vec();
        if channels.is_empty() {
            return Err(PusherError::invalid_value("at least one channel is required"));
        }
        if channels.len() > MAX_TRIGGER_CHANNELS {
            return Err(PusherError::invalid_value(format!(
                "cannot trigger on more than {MAX_TRIGGER_CHANNELS} channels"
            )));
        }
        for channel in &channels {
            validate_channel(channel)?;
        }
        validate_event_name(event_name)?;

        let mut params = Params::new();
        params.insert("channels".into(), ParamValue::list(channels));
        params.insert("name".into(), event_name.into());
        params.insert("data".into(), self.encode_data(data)?.into());
        if let Some(socket_id) = socket_id {
            validate_socket_id(socket_id)?;
            params.insert("socket_id".into(), socket_id.into());
        }

        RequestDescriptor::new(Method::Post, self.app_path("/events"), params)
    }

    /// Build a batch trigger request.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidValue`] if the batch is empty, too large,
    /// or contains an invalid event.
    pub fn trigger_batch_request(&self, events: &[BatchEvent]) -> PusherResult<RequestDescriptor> {
        if events.is_empty() {
            return Err(PusherError::invalid_value("batch must contain at least one event"));
        }
        if events.len() > MAX_BATCH_EVENTS {
            return Err(PusherError::invalid_value(format!(
                "batch cannot contain more than {MAX_BATCH_EVENTS} events"
            )));
        }

        let mut batch = Vec::with_capacity(events.len());
        for event in events {
            validate_channel(&event.channel)?;
            validate_event_name(&event.name)?;

            let mut entry = Map::new();
            entry.insert("channel".into(), Value::String(event.channel.clone()));
            entry.insert("name".into(), Value::String(event.name.clone()));
            entry.insert("data".into(), Value::String(self.encode_data(&event.data)?));
            if let Some(socket_id) = &event.socket_id {
                validate_socket_id(socket_id)?;
                entry.insert("socket_id".into(), Value::String(socket_id.clone()));
            }
            batch.push(Value::Object(entry));
        }

        let mut params = Params::new();
        params.insert("batch".into(), ParamValue::Json(Value::Array(batch)));
        RequestDescriptor::new(Method::Post, self.app_path("/batch_events"), params)
    }

    /// Build a request listing occupied channels.
    ///
    /// # Errors
    ///
    /// Currently infallible for any input; kept fallible like the other
    /// builders.
    pub fn channels_info_request(
        &self,
        prefix_filter: Option<&str>,
        attributes: &[&str],
    ) -> PusherResult<RequestDescriptor> {
        let mut params = Params::new();
        if let Some(prefix) = prefix_filter {
            params.insert("filter_by_prefix".into(), prefix.into());
        }
        if !attributes.is_empty() {
            params.insert("info".into(), ParamValue::list(attributes.iter().copied()));
        }
        RequestDescriptor::new(Method::Get, self.app_path("/channels"), params)
    }

    /// Build a request for the state of one channel.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidValue`] for an invalid channel name.
    pub fn channel_info_request(
        &self,
        channel: &str,
        attributes: &[&str],
    ) -> PusherResult<RequestDescriptor> {
        validate_channel(channel)?;
        let mut params = Params::new();
        if !attributes.is_empty() {
            params.insert("info".into(), ParamValue::list(attributes.iter().copied()));
        }
        RequestDescriptor::new(
            Method::Get,
            self.app_path(&format!("/channels/{channel}")),
            params,
        )
    }

    /// Build a request listing users subscribed to a presence channel.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidValue`] for an invalid or non-presence
    /// channel.
    pub fn users_info_request(&self, channel: &str) -> PusherResult<RequestDescriptor> {
        validate_channel(channel)?;
        if ChannelKind::of(channel) != ChannelKind::Presence {
            return Err(PusherError::invalid_value(format!(
                "users can only be listed for presence channels, got {channel:?}"
            )));
        }
        RequestDescriptor::new(
            Method::Get,
            self.app_path(&format!("/channels/{channel}/users")),
            Params::new(),
        )
    }

    /// Sign a request at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter cannot be encoded.
    pub fn sign(&self, request: &RequestDescriptor) -> PusherResult<SignedRequest> {
        self.request_signer.sign(request)
    }

    /// Send a signed request and return the decoded JSON response.
    ///
    /// Performs exactly one HTTP round trip.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Http`] on transport failure and
    /// [`PusherError::Api`] for non-success responses.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &SignedRequest) -> PusherResult<Value> {
        let url = format!("{}{}", self.base_url, request.path_and_query());
        debug!("Making Pusher API request");

        let builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self
                .http
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(request.body.clone().unwrap_or_default()),
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Pusher API request failed");
            return Err(PusherError::Api {
                status: status.as_u16(),
                message: if text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                } else {
                    text
                },
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn sign_and_send(&self, request: &RequestDescriptor) -> PusherResult<Value> {
        let signed = self.sign(request)?;
        self.send(&signed).await
    }

    /// Trigger an event on one or more channels.
    ///
    /// # Errors
    ///
    /// Returns input errors from [`Self::trigger_request`] or transport
    /// errors from [`Self::send`].
    pub async fn trigger(
        &self,
        channels: impl Into<Channels>,
        event_name: &str,
        data: &Value,
        socket_id: Option<&str>,
    ) -> PusherResult<Value> {
        let request = self.trigger_request(channels, event_name, data, socket_id)?;
        self.sign_and_send(&request).await
    }

    /// Trigger several events in one request.
    ///
    /// # Errors
    ///
    /// Returns input errors from [`Self::trigger_batch_request`] or transport
    /// errors from [`Self::send`].
    pub async fn trigger_batch(&self, events: &[BatchEvent]) -> PusherResult<Value> {
        let request = self.trigger_batch_request(events)?;
        self.sign_and_send(&request).await
    }

    /// List occupied channels.
    ///
    /// # Errors
    ///
    /// Returns transport errors from [`Self::send`].
    pub async fn channels_info(
        &self,
        prefix_filter: Option<&str>,
        attributes: &[&str],
    ) -> PusherResult<Value> {
        let request = self.channels_info_request(prefix_filter, attributes)?;
        self.sign_and_send(&request).await
    }

    /// Fetch the state of one channel.
    ///
    /// # Errors
    ///
    /// Returns input errors from [`Self::channel_info_request`] or transport
    /// errors from [`Self::send`].
    pub async fn channel_info(&self, channel: &str, attributes: &[&str]) -> PusherResult<Value> {
        let request = self.channel_info_request(channel, attributes)?;
        self.sign_and_send(&request).await
    }

    /// List users on a presence channel.
    ///
    /// # Errors
    ///
    /// Returns input errors from [`Self::users_info_request`] or transport
    /// errors from [`Self::send`].
    pub async fn users_info(&self, channel: &str) -> PusherResult<Value> {
        let request = self.users_info_request(channel)?;
        self.sign_and_send(&request).await
    }

    /// Authorize a socket for a private or presence channel.
    ///
    /// # Errors
    ///
    /// See [`ChannelAuthorizer::authorize`].
    pub fn authenticate(
        &self,
        channel: &str,
        socket_id: &str,
        custom_data: Option<&Value>,
    ) -> PusherResult<AuthToken> {
        self.authorizer.authorize(channel, socket_id, custom_data)
    }

    /// Validate an inbound webhook.
    ///
    /// # Errors
    ///
    /// See [`WebhookValidator::validate`].
    pub fn validate_webhook(
        &self,
        key: &[u8],
        signature: &[u8],
        body: &[u8],
    ) -> PusherResult<Option<WebhookPayload>> {
        self.webhook_validator.validate(key, signature, body)
    }

    /// The webhook validator used by [`Self::validate_webhook`].
    #[must_use]
    pub const fn webhook_validator(&self) -> &WebhookValidator {
        &self.webhook_validator
    }
}

impl std::fmt::Debug for PusherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PusherClient")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
