use serde::Deserialize;
use thiserror::Error;

use crate::models::ResourceKind;

/// Fixed text shown when the server answers 415 Unsupported Media Type.
pub const MALFORMED_PAYLOAD_MESSAGE: &str =
    "Malformed payload (415). Please check the input and try again.";

/// The request kinds the client issues, used to pick fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GET /{resource}`
    Load,
    /// `GET /{resource}/{key...}`
    Fetch,
    /// `POST /{resource}`
    Create,
    /// `PUT /{resource}/{key...}`
    Update,
    /// `DELETE /{resource}/{key...}`
    Delete,
}

impl Operation {
    /// Resource-specific text used when the server supplies no message.
    pub fn fallback(self, kind: ResourceKind) -> String {
        match self {
            Operation::Load => format!("Failed to load {}", kind.plural()),
            Operation::Fetch => format!("Failed to fetch {}", kind.singular()),
            Operation::Create => format!("Failed to create {}", kind.singular()),
            Operation::Update => format!("Failed to update {}", kind.singular()),
            Operation::Delete => format!("Failed to delete {}", kind.singular()),
        }
    }
}

/// A network or response failure. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("{fallback}")]
    Transport {
        /// Resource-specific message.
        fallback: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server rejected the payload format.
    #[error("{}", MALFORMED_PAYLOAD_MESSAGE)]
    UnsupportedMediaType,

    /// Any other non-2xx response.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or the fallback.
        message: String,
    },

    /// A 2xx body could not be decoded.
    #[error("{fallback}")]
    Decode {
        /// Resource-specific message.
        fallback: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot carry path segments.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    /// Map a non-2xx response to an error, preferring the body's `message`.
    pub fn from_status(status: u16, body: &[u8], fallback: &str) -> Self {
        if status == 415 {
            return ApiError::UnsupportedMediaType;
        }

        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.message)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string());

        ApiError::Status { status, message }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnsupportedMediaType => Some(415),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
