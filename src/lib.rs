//! Typed Rust client for the Mailgun messages HTTP API.
//!
//! The crate is split into a domain layer of validated types, a transport
//! layer for request assembly and response decoding, a retrying dispatcher,
//! and a small client layer tying them together.
//!
//! ```rust,no_run
//! use mailgun_send::{ClientOptions, MailgunClient, SendParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailgun_send::MailgunError> {
//!     // Falls back to MAILGUN_DOMAIN / MAILGUN_API_KEY for unset options.
//!     let client = MailgunClient::new(ClientOptions::default())?;
//!     let params = SendParams::message(
//!         "alice@example.com",
//!         "bob@example.com",
//!         "Hello",
//!         "Sent with mailgun-send",
//!     );
//!     let response = client.send_message(params).await?;
//!     println!("{:?}", response.id);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod domain;
pub mod retry;
mod transport;

pub use client::{HttpResponse, HttpTransport, MailgunClient, MailgunClientBuilder, MailgunError};
pub use config::{ClientConfig, ClientOptions, ConfigError, ConfigField, Environment, ProcessEnv};
pub use domain::{
    ApiKey, Domain, FileValue, ParamValue, RequestDescriptor, SendMessageResponse, SendParams,
    ValidationError,
};
pub use retry::{AttemptError, DispatchError, FailureKind, RetryContext, RetryPolicy};
