use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    /// Anti-forgery token was empty when building a request
    #[error("Anti-forgery token is empty")]
    MissingToken,

    /// Endpoint URL was empty when building a request
    #[error("Endpoint URL is empty")]
    MissingEndpoint,

    /// Method string did not name a supported HTTP method
    #[error("Unknown HTTP method '{0}'")]
    UnknownMethod(String),

    /// Endpoint could not be resolved to an absolute URL
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Request never reached the server or the connection failed mid-way
    #[error("Request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    /// Response body was not a JSON object with a known `status`
    #[error("Malformed response ({context}): {source}")]
    MalformedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FormError {
    /// Whether the failure happened before the server answered.
    pub fn is_network(&self) -> bool {
        matches!(self, FormError::Network { .. } | FormError::InvalidEndpoint { .. })
    }
}
