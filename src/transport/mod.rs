//! Transport layer: request assembly and wire-format details (serialization/deserialization).

mod message;

pub use message::{decode_json_value, decode_send_message_json_response, encode_request};
