use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::Part;
use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::domain::{ParamValue, RequestDescriptor, SendMessageResponse, SendParams, ValidationError};

const PARAM_KEY_FIELD: &str = "param key";

#[derive(Debug, Clone, Deserialize)]
struct SendMessageJsonResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Build the request descriptor for one send. Runs before any network I/O.
pub fn encode_request(
    config: &ClientConfig,
    url: Url,
    params: &SendParams,
) -> Result<RequestDescriptor, ValidationError> {
    if params.is_empty() {
        return Err(ValidationError::Empty {
            field: SendParams::FIELD,
        });
    }

    for (key, value) in params.fields() {
        if key.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: PARAM_KEY_FIELD,
            });
        }
        if let ParamValue::File(file) = value {
            match file.mime() {
                Some(mime) if !is_valid_mime(mime) => {
                    return Err(ValidationError::InvalidContentType {
                        value: mime.to_owned(),
                    });
                }
                _ => {}
            }
        }
    }

    // "Basic " followed by base64 is always visible ASCII.
    let mut authorization = HeaderValue::from_str(&config.authorization())
        .expect("basic auth credentials are a valid header value");
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);

    Ok(RequestDescriptor {
        method: params.method().cloned().unwrap_or(Method::POST),
        url,
        fields: params.fields().to_vec(),
        headers,
    })
}

pub fn decode_send_message_json_response(
    json: &str,
) -> Result<SendMessageResponse, serde_json::Error> {
    let parsed: SendMessageJsonResponse = serde_json::from_str(json)?;
    Ok(SendMessageResponse {
        id: parsed.id,
        message: parsed.message,
    })
}

pub fn decode_json_value(json: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(json)
}

// Same parser the multipart part applies when the request is built.
fn is_valid_mime(value: &str) -> bool {
    Part::bytes(Vec::new()).mime_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use crate::config::ClientOptions;
    use crate::domain::FileValue;

    use super::*;

    fn config(api_key: &str) -> ClientConfig {
        let options = ClientOptions {
            domain: Some("mail.example.com".to_owned()),
            api_key: Some(api_key.to_owned()),
            ..Default::default()
        };
        ClientConfig::resolve(&options, &|_: &str| None::<String>).unwrap()
    }

    fn messages_url(config: &ClientConfig) -> Url {
        config.endpoint("/messages").unwrap()
    }

    #[test]
    fn encode_defaults_to_post_with_basic_auth() {
        let config = config("FAKE_API_KEY");
        let params = SendParams::message("alice@example.com", "bob@example.com", "Hi", "Hello");

        let request = encode_request(&config, messages_url(&config), &params).unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.url.as_str(),
            "https://api.mailgun.net/v3/mail.example.com/messages"
        );
        let auth = request.headers.get(AUTHORIZATION).unwrap();
        assert_eq!(auth, "Basic YXBpOkZBS0VfQVBJX0tFWQ==");
        assert!(auth.is_sensitive());
        assert_eq!(request.fields, params.fields());
    }

    #[test]
    fn encode_honours_method_override() {
        let config = config("KEY");
        let params = SendParams::message("a@example.com", "b@example.com", "s", "t")
            .with_method(Method::PUT);

        let request = encode_request(&config, messages_url(&config), &params).unwrap();
        assert_eq!(request.method, Method::PUT);
    }

    #[test]
    fn encode_rejects_empty_params() {
        let config = config("KEY");
        let err = encode_request(&config, messages_url(&config), &SendParams::new()).unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "params" });
    }

    #[test]
    fn encode_rejects_blank_keys() {
        let config = config("KEY");
        let params = SendParams::new().text("  ", "value");
        let err = encode_request(&config, messages_url(&config), &params).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Empty {
                field: PARAM_KEY_FIELD
            }
        );
    }

    #[test]
    fn encode_checks_attachment_content_types() {
        let config = config("KEY");
        let good = SendParams::new().attachment(
            FileValue::new("a.txt", b"hi".to_vec()).content_type("text/plain; charset=utf-8"),
        );
        assert!(encode_request(&config, messages_url(&config), &good).is_ok());

        let bad = SendParams::new()
            .attachment(FileValue::new("a.txt", b"hi".to_vec()).content_type("plain text"));
        assert!(matches!(
            encode_request(&config, messages_url(&config), &bad),
            Err(ValidationError::InvalidContentType { .. })
        ));

        let unbalanced = SendParams::new()
            .attachment(FileValue::new("a.txt", b"hi".to_vec()).content_type("text/plain("));
        assert!(matches!(
            encode_request(&config, messages_url(&config), &unbalanced),
            Err(ValidationError::InvalidContentType { value }) if value == "text/plain("
        ));
    }

    #[test]
    fn decode_send_message_response() {
        let json = r#"
        {
          "id": "<20230315132348.b667e195e4fa57fc@mail.example.com>",
          "message": "Queued. Thank you."
        }
        "#;
        let response = decode_send_message_json_response(json).unwrap();
        assert_eq!(
            response.id.as_deref(),
            Some("<20230315132348.b667e195e4fa57fc@mail.example.com>")
        );
        assert_eq!(response.message.as_deref(), Some("Queued. Thank you."));
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(decode_send_message_json_response("<html>").is_err());
        assert!(decode_json_value("").is_err());
    }
}
