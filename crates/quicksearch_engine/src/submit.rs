use std::time::Duration;

use futures_util::StreamExt;
use quicksearch_core::{FormMethod, NativeRequest};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};

use crate::decode::decode_body;
use crate::{FailureKind, SubmitError, TransportOutput};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const FRAGMENT_ACCEPT: &str = "text/html, */*; q=0.01";
const REQUESTED_WITH: &str = "X-Requested-With";

#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Base for relative form actions such as `/search`.
    pub base_url: Option<Url>,
    /// `None` keeps the HTTP client's own default.
    pub connect_timeout: Option<Duration>,
    /// `None` keeps the HTTP client's own default.
    pub request_timeout: Option<Duration>,
    pub max_bytes: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout: None,
            request_timeout: None,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait SearchTransport: Send + Sync {
    /// POSTs a serialized form to the fragment endpoint.
    async fn post_fragment(&self, endpoint: &str, body: &str)
        -> Result<TransportOutput, SubmitError>;

    /// Performs a plain form submission and returns the page it leads to.
    async fn navigate(&self, request: &NativeRequest) -> Result<TransportOutput, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    settings: TransportSettings,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, SubmitError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| SubmitError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn resolve(&self, target: &str) -> Result<Url, SubmitError> {
        let resolved = match &self.settings.base_url {
            Some(base) => base.join(target),
            None => Url::parse(target),
        };
        resolved.map_err(|err| {
            SubmitError::new(FailureKind::InvalidUrl, format!("{target}: {err}"))
        })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<TransportOutput, SubmitError> {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_body(&bytes, content_type.as_deref())
            .map_err(|err| SubmitError::new(FailureKind::Decode, err.to_string()))?;

        Ok(TransportOutput {
            markup: decoded.text,
            final_url,
            content_type,
            encoding_label: decoded.encoding_label,
        })
    }
}

#[async_trait::async_trait]
impl SearchTransport for ReqwestTransport {
    async fn post_fragment(
        &self,
        endpoint: &str,
        body: &str,
    ) -> Result<TransportOutput, SubmitError> {
        let url = self.resolve(endpoint)?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
            .header(ACCEPT, HeaderValue::from_static(FRAGMENT_ACCEPT))
            .header(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"))
            .body(body.to_owned());
        self.execute(request).await
    }

    async fn navigate(&self, request: &NativeRequest) -> Result<TransportOutput, SubmitError> {
        let url = self.resolve(&request.url)?;
        let builder = match request.method {
            FormMethod::Get => self.client.get(url),
            FormMethod::Post => self
                .client
                .post(url)
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(request.body.clone().unwrap_or_default()),
        };
        self.execute(builder.header(ACCEPT, HeaderValue::from_static("text/html")))
            .await
    }
}

fn too_large(max_bytes: u64, actual: u64) -> SubmitError {
    SubmitError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        return SubmitError::new(FailureKind::Timeout, err.to_string());
    }
    SubmitError::new(FailureKind::Network, err.to_string())
}
