use std::io;

use mailgun_send::{ClientOptions, MailgunClient, SendParams};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let from = std::env::var("MAILGUN_FROM").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "MAILGUN_FROM environment variable is required",
        )
    })?;
    let to = std::env::var("MAILGUN_TO").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "MAILGUN_TO environment variable is required",
        )
    })?;
    let text = std::env::var("MAILGUN_TEXT")
        .unwrap_or_else(|_| "Hello from the mailgun-send demo.".to_owned());

    // Domain and API key come from MAILGUN_DOMAIN / MAILGUN_API_KEY.
    let client = MailgunClient::new(ClientOptions {
        debug_logging: true,
        ..Default::default()
    })?;
    let params = SendParams::message(from, to, "mailgun-send demo", text);

    let response = client.send_message(params).await?;
    println!("id: {:?}, message: {:?}", response.id, response.message);

    Ok(())
}
