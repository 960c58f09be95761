//! Client layer: resolves credentials, assembles requests and drives them through the retrying dispatcher.

mod http;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

pub use self::http::{BoxFuture, HttpResponse, HttpTransport, ReqwestTransport};

use crate::config::{ClientConfig, ClientOptions, ConfigError, Environment, ProcessEnv};
use crate::domain::{RequestDescriptor, SendMessageResponse, SendParams, ValidationError};
use crate::retry::{AttemptError, DispatchError, RetryPolicy, dispatch};

const MESSAGES_PATH: &str = "/messages";
const DEFAULT_USER_AGENT: &str = concat!("mailgun-send/", env!("CARGO_PKG_VERSION"));

type Decoder<T> = fn(&str) -> Result<T, serde_json::Error>;

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`MailgunClient`].
///
/// Configuration and validation errors are raised before any network
/// attempt. Everything that happens on the wire ends up as
/// [`MailgunError::Dispatch`] once the retry loop gives up.
pub enum MailgunError {
    /// A required credential is missing or the base URL is malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The send parameters were rejected before any request was made.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The API call ultimately failed; carries the last attempt's failure.
    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[source] Box<dyn StdError + Send + Sync>),
}

#[derive(Clone)]
/// Builder for [`MailgunClient`].
///
/// Use this when you need to inject an environment, tune the retry policy,
/// or customize the underlying HTTP client.
pub struct MailgunClientBuilder {
    options: ClientOptions,
    env: Arc<dyn Environment>,
    retry: RetryPolicy,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl fmt::Debug for MailgunClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailgunClientBuilder")
            .field("options", &self.options)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Default for MailgunClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MailgunClientBuilder {
    /// Empty options, process environment fallback, default retry policy.
    pub fn new() -> Self {
        Self {
            options: ClientOptions::default(),
            env: Arc::new(ProcessEnv),
            retry: RetryPolicy::default(),
            timeout: None,
            user_agent: None,
            transport: None,
        }
    }

    /// Replace all options at once.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.options.domain = Some(domain.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.options.api_key = Some(api_key.into());
        self
    }

    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.options.debug_logging = enabled;
        self
    }

    /// Override the API host (e.g. [`crate::config::EU_BASE_URL`]).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = Some(base_url.into());
        self
    }

    /// Where `MAILGUN_DOMAIN` / `MAILGUN_API_KEY` are looked up.
    pub fn environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Per-attempt timeout of the HTTP client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use a custom transport instead of the built-in `reqwest` one.
    ///
    /// `timeout` and `user_agent` only apply to the built-in transport.
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Resolve credentials and build a [`MailgunClient`].
    pub fn build(self) -> Result<MailgunClient, MailgunError> {
        let config = ClientConfig::resolve(&self.options, self.env.as_ref())?;

        let http = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder = reqwest::Client::builder().user_agent(
                    self.user_agent
                        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
                );
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                let client = builder
                    .build()
                    .map_err(|err| MailgunError::Client(Box::new(err)))?;
                Arc::new(ReqwestTransport::new(client)) as Arc<dyn HttpTransport>
            }
        };

        debug!(
            domain = %config.domain(),
            base_url = %config.base_url(),
            "mailgun client configured"
        );

        Ok(MailgunClient {
            config: Arc::new(config),
            retry: self.retry,
            http,
        })
    }
}

#[derive(Clone)]
/// High-level Mailgun client.
///
/// Every send is an independent retry loop; clones share only the immutable
/// configuration and the HTTP connection pool. By default messages go to
/// `https://api.mailgun.net/v3/{domain}/messages`.
pub struct MailgunClient {
    config: Arc<ClientConfig>,
    retry: RetryPolicy,
    http: Arc<dyn HttpTransport>,
}

impl fmt::Debug for MailgunClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailgunClient")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl MailgunClient {
    /// Create a client from options, falling back to `MAILGUN_DOMAIN` and
    /// `MAILGUN_API_KEY` in the process environment.
    ///
    /// For more customization, use [`MailgunClient::builder`].
    pub fn new(options: ClientOptions) -> Result<Self, MailgunError> {
        Self::builder().options(options).build()
    }

    /// Create a client purely from the process environment.
    pub fn from_env() -> Result<Self, MailgunError> {
        Self::new(ClientOptions::default())
    }

    /// Start building a client with custom settings.
    pub fn builder() -> MailgunClientBuilder {
        MailgunClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send a message through `POST /v3/{domain}/messages`.
    ///
    /// Errors:
    /// - [`MailgunError::Validation`] when `params` is empty or malformed (no request is made),
    /// - [`MailgunError::Dispatch`] when the API call fails after the retry policy gives up.
    #[tracing::instrument(skip_all, fields(domain = %self.config.domain()))]
    pub async fn send_message(
        &self,
        params: SendParams,
    ) -> Result<SendMessageResponse, MailgunError> {
        self.request(
            MESSAGES_PATH,
            &params,
            crate::transport::decode_send_message_json_response,
        )
        .await
    }

    /// Send `params` to another path under `/v3/{domain}` and return the raw JSON body.
    #[tracing::instrument(skip(self, params), fields(domain = %self.config.domain()))]
    pub async fn post(
        &self,
        path: &str,
        params: SendParams,
    ) -> Result<serde_json::Value, MailgunError> {
        self.request(path, &params, crate::transport::decode_json_value)
            .await
    }

    async fn request<T>(
        &self,
        path: &str,
        params: &SendParams,
        decode: Decoder<T>,
    ) -> Result<T, MailgunError> {
        let url = self.config.endpoint(path)?;
        let request = crate::transport::encode_request(&self.config, url, params)?;

        if self.config.debug_logging() {
            debug!(
                method = %request.method,
                url = %request.url,
                fields = ?request.fields.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
                headers = ?request.headers,
                "sending request"
            );
        }

        dispatch(&self.retry, || self.attempt(&request, decode))
            .await
            .map_err(|err| {
                if self.config.debug_logging() {
                    debug!(error = %err, attempts = err.attempts(), "request failed");
                }
                MailgunError::Dispatch(err)
            })
    }

    async fn attempt<T>(
        &self,
        request: &RequestDescriptor,
        decode: Decoder<T>,
    ) -> Result<T, AttemptError> {
        let response = self
            .http
            .execute(request)
            .await
            .map_err(AttemptError::Transport)?;

        if let Some(err) = AttemptError::from_status(response.status, &response.body) {
            return Err(err);
        }

        Ok(decode(&response.body)?)
    }
}
