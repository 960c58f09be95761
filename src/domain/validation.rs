use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    InvalidContentType { value: String },
    InvalidMethod { value: String },
    InvalidPath { value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidContentType { value } => write!(f, "invalid content type: {value}"),
            Self::InvalidMethod { value } => write!(f, "invalid HTTP method: {value}"),
            Self::InvalidPath { value } => write!(f, "invalid API path: {value}"),
        }
    }
}

impl std::error::Error for ValidationError {}
