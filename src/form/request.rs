use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::form::error::FormError;

/// Form field carrying the anti-forgery token.
pub const TOKEN_FIELD: &str = "csrfmiddlewaretoken";

/// Header that marks a request as AJAX rather than a page navigation.
pub const AJAX_HEADER: &str = "X-Requested-With";
pub const AJAX_HEADER_VALUE: &str = "XMLHttpRequest";

/// Value submitted for a checked checkbox.
pub const CHECKED_VALUE: &str = "on";

/// A single form field value: free text or a checkbox flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Encoded value, or None when the field must be left out of the payload.
    ///
    /// Unchecked flags are omitted entirely: the server reads a checkbox as
    /// set whenever its key is present.
    pub fn encoded(&self) -> Option<&str> {
        match self {
            FieldValue::Flag(true) => Some(CHECKED_VALUE),
            FieldValue::Flag(false) => None,
            FieldValue::Text(text) => Some(text.as_str()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Flag(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl FromStr for Method {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            _ => Err(FormError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// One submission attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    endpoint: String,
    method: Method,
    fields: BTreeMap<String, FieldValue>,
    token: String,
}

impl SubmissionRequest {
    pub fn builder(endpoint: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            endpoint: endpoint.into(),
            method: Method::Post,
            fields: BTreeMap::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Name/value pairs as the server's form decoding expects them,
    /// token last.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .fields
            .iter()
            .filter_map(|(name, value)| value.encoded().map(|v| (name.clone(), v.to_string())))
            .collect();
        pairs.push((TOKEN_FIELD.to_string(), self.token.clone()));
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: String,
    method: Method,
    fields: BTreeMap<String, FieldValue>,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        for (name, value) in fields {
            self.fields.insert(name.into(), value.into());
        }
        self
    }

    /// Seal the request with the anti-forgery token.
    pub fn build(self, token: &str) -> Result<SubmissionRequest, FormError> {
        if self.endpoint.trim().is_empty() {
            return Err(FormError::MissingEndpoint);
        }
        if token.trim().is_empty() {
            return Err(FormError::MissingToken);
        }
        Ok(SubmissionRequest {
            endpoint: self.endpoint,
            method: self.method,
            fields: self.fields,
            token: token.to_string(),
        })
    }
}
