use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::form::error::FormError;

/// Outcome tag reported by the server. Doubles as the notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    Info,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Error => write!(f, "error"),
            Status::Info => write!(f, "info"),
        }
    }
}

/// Status-tagged JSON answer to a submission.
///
/// Anything beyond `status`, `message` and `redirect` lands in `extra`
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub status: Status,

    #[serde(default)]
    pub message: String,

    #[serde(
        default,
        deserialize_with = "lenient_redirect",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionResponse {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            redirect: None,
            extra: Map::new(),
        }
    }

    /// Synthetic response standing in for a failed or unreadable reply.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect = Some(url.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Parse a response body. Fails when the body is not JSON or lacks a
    /// recognised `status`.
    pub fn from_body(body: &str) -> Result<Self, FormError> {
        serde_json::from_str(body).map_err(|e| FormError::MalformedResponse {
            context: "submission response".into(),
            source: e,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Redirect target, ignoring an empty string.
    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// A redirect that is not a string (null, a number) counts as absent
/// instead of failing the whole response.
fn lenient_redirect<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(url)) => Some(url),
        _ => None,
    })
}
