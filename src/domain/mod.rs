//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod validation;
mod value;

pub use request::{FileValue, ParamValue, RequestDescriptor, SendParams};
pub use response::SendMessageResponse;
pub use validation::ValidationError;
pub use value::{API_USERNAME, ApiKey, Domain};

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;

    #[test]
    fn domain_rejects_blank_and_trims() {
        assert!(matches!(
            Domain::new("   "),
            Err(ValidationError::Empty {
                field: Domain::FIELD
            })
        ));
        assert_eq!(
            Domain::new(" mail.example.com ").unwrap().as_str(),
            "mail.example.com"
        );
    }

    #[test]
    fn api_key_rejects_empty_and_redacts_debug() {
        assert!(matches!(
            ApiKey::new(""),
            Err(ValidationError::Empty {
                field: ApiKey::FIELD
            })
        ));

        let key = ApiKey::new("key-secret").unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("key-secret"), "leaked key: {debug}");
    }

    #[test]
    fn message_constructor_sets_common_fields_in_order() {
        let params = SendParams::message(
            "alice@example.com",
            "bob@example.com",
            "Testing",
            "Hello",
        );

        let keys = params
            .fields()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, ["from", "to", "subject", "text"]);
        assert_eq!(params.get("subject"), Some(&ParamValue::from("Testing")));
        assert_eq!(params.method(), None);
    }

    #[test]
    fn repeated_keys_are_kept() {
        let params = SendParams::new()
            .text("to", "a@example.com")
            .text("to", "b@example.com")
            .tag("welcome")
            .custom_variable("user_id", "42")
            .header("Reply-To", "support@example.com");

        assert_eq!(params.len(), 5);
        assert_eq!(params.get("to"), Some(&ParamValue::from("a@example.com")));
        assert!(params.get("o:tag").is_some());
        assert!(params.get("v:user_id").is_some());
        assert!(params.get("h:Reply-To").is_some());
    }

    #[test]
    fn attachments_are_file_values() {
        let file = FileValue::new("report.pdf", b"%PDF".to_vec()).content_type("application/pdf");
        let params = SendParams::new().attachment(file.clone());

        match params.get("attachment") {
            Some(ParamValue::File(found)) => {
                assert_eq!(found, &file);
                assert_eq!(found.file_name(), "report.pdf");
                assert_eq!(found.mime(), Some("application/pdf"));
                assert_eq!(found.bytes(), b"%PDF");
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn method_override_parses_names() {
        let params = SendParams::new().try_method("put").unwrap();
        assert_eq!(params.method(), Some(&Method::PUT));

        assert!(matches!(
            SendParams::new().try_method("GE T"),
            Err(ValidationError::InvalidMethod { .. })
        ));
    }

    #[test]
    fn params_collect_from_pairs() {
        let params: SendParams = [("from", "a@example.com"), ("to", "b@example.com")]
            .into_iter()
            .collect();
        assert_eq!(params.len(), 2);
        assert!(!params.is_empty());
    }
}
