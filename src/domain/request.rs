use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

use crate::domain::validation::ValidationError;

/// One value of a message field: plain text or a file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    File(FileValue),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<FileValue> for ParamValue {
    fn from(value: FileValue) -> Self {
        Self::File(value)
    }
}

/// In-memory file sent as a multipart part (`attachment`, `inline`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValue {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl FileValue {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Set the MIME type of the part (e.g. `application/pdf`).
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Fields of one outbound message.
///
/// The library does not require any particular field; Mailgun itself expects
/// at least `from`, `to`, `subject` and one of `text`/`html`. Keys may repeat
/// (several `to` or `attachment` entries are sent as several form fields).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendParams {
    fields: Vec<(String, ParamValue)>,
    method: Option<Method>,
}

impl SendParams {
    pub const FIELD: &'static str = "params";

    pub fn new() -> Self {
        Self::default()
    }

    /// Start a plain-text message with the four fields most sends need.
    pub fn message(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new()
            .text("from", from)
            .text("to", to)
            .text("subject", subject)
            .text("text", text)
    }

    /// Append a text field.
    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, ParamValue::Text(value.into()));
        self
    }

    /// Append a file field under an arbitrary key.
    pub fn file(mut self, key: impl Into<String>, file: FileValue) -> Self {
        self.push(key, ParamValue::File(file));
        self
    }

    pub fn html(self, html: impl Into<String>) -> Self {
        self.text("html", html)
    }

    pub fn cc(self, cc: impl Into<String>) -> Self {
        self.text("cc", cc)
    }

    pub fn bcc(self, bcc: impl Into<String>) -> Self {
        self.text("bcc", bcc)
    }

    /// Mailgun tag (`o:tag`).
    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.text("o:tag", tag)
    }

    pub fn attachment(self, file: FileValue) -> Self {
        self.file("attachment", file)
    }

    pub fn inline(self, file: FileValue) -> Self {
        self.file("inline", file)
    }

    /// Custom message variable (`v:<name>`).
    pub fn custom_variable(self, name: &str, value: impl Into<String>) -> Self {
        self.text(format!("v:{name}"), value)
    }

    /// Custom MIME header (`h:<name>`).
    pub fn header(self, name: &str, value: impl Into<String>) -> Self {
        self.text(format!("h:{name}"), value)
    }

    /// Override the HTTP method (defaults to `POST`).
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Override the HTTP method from its textual name.
    pub fn try_method(self, method: &str) -> Result<Self, ValidationError> {
        let parsed = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| ValidationError::InvalidMethod {
                value: method.to_owned(),
            })?;
        Ok(self.with_method(parsed))
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn fields(&self) -> &[(String, ParamValue)] {
        &self.fields
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.fields
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SendParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

/// A fully assembled HTTP request, rebuilt into a wire request on every attempt.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub fields: Vec<(String, ParamValue)>,
    pub headers: HeaderMap,
}
