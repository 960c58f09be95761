use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;

use reqwest::multipart::{Form, Part};

use crate::domain::{ParamValue, RequestDescriptor};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Status and body of one HTTP round-trip.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Performs exactly one HTTP attempt.
///
/// Errors mean the round-trip itself did not complete; any status code,
/// including 4xx/5xx, is returned as an [`HttpResponse`].
pub trait HttpTransport: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

/// Default transport: one multipart request per attempt through `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let form = multipart_form(&request.fields)?;
            let response = self
                .client
                .request(request.method.clone(), request.url.clone())
                .headers(request.headers.clone())
                .multipart(form)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

// `Form` is consumed by `send`, so every attempt builds its own.
fn multipart_form(fields: &[(String, ParamValue)]) -> Result<Form, reqwest::Error> {
    let mut form = Form::new();
    for (key, value) in fields {
        form = match value {
            ParamValue::Text(text) => form.text(key.clone(), text.clone()),
            ParamValue::File(file) => {
                let mut part =
                    Part::bytes(file.bytes().to_vec()).file_name(file.file_name().to_owned());
                if let Some(mime) = file.mime() {
                    part = part.mime_str(mime)?;
                }
                form.part(key.clone(), part)
            }
        };
    }
    Ok(form)
}
