use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::form::error::FormError;
use crate::form::request::{AJAX_HEADER, AJAX_HEADER_VALUE, Method, SubmissionRequest};

/// Sends a submission and hands back the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &SubmissionRequest) -> Result<String, FormError>;
}

/// How POST fields travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    #[default]
    Urlencoded,
    Multipart,
}

/// Transport over HTTP with a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
    encoding: BodyEncoding,
}

impl HttpTransport {
    pub fn new(base_url: Option<&str>, encoding: BodyEncoding) -> Result<Self, FormError> {
        let base_url = base_url
            .map(|base| {
                Url::parse(base).map_err(|e| FormError::InvalidEndpoint {
                    endpoint: base.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            encoding,
        })
    }

    /// Absolute URL for an endpoint; relative endpoints need a base URL.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, FormError> {
        let invalid = |reason: String| FormError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(endpoint).map_err(|e| invalid(e.to_string())),
                None => Err(invalid("relative endpoint and no base URL configured".into())),
            },
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    fn build(&self, url: Url, request: &SubmissionRequest) -> reqwest::RequestBuilder {
        let pairs = request.form_pairs();

        let builder = match request.method() {
            Method::Get => self.client.get(url).query(&pairs),
            Method::Post => match self.encoding {
                BodyEncoding::Urlencoded => self.client.post(url).form(&pairs),
                BodyEncoding::Multipart => {
                    let form = pairs
                        .into_iter()
                        .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                            form.text(name, value)
                        });
                    self.client.post(url).multipart(form)
                }
            },
        };

        builder.header(AJAX_HEADER, AJAX_HEADER_VALUE)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SubmissionRequest) -> Result<String, FormError> {
        let url = self.resolve(request.endpoint())?;
        let network = |e: reqwest::Error| FormError::Network {
            endpoint: request.endpoint().to_string(),
            message: e.to_string(),
        };

        debug!(method = %request.method(), url = %url, "sending submission");

        // Error statuses still carry the JSON verdict, so the body is read
        // regardless of the HTTP status.
        let response = self.build(url, request).send().await.map_err(network)?;
        debug!(http_status = %response.status(), "submission answered");

        response.text().await.map_err(network)
    }
}
