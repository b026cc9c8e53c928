//! HTTP transport seam.
//!
//! [`CatalogClient`](crate::CatalogClient) describes requests as plain
//! [`ApiRequest`] values and hands them to an [`HttpTransport`]. The default
//! implementation is [`ReqwestTransport`]; tests substitute a mock.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use rustls::crypto::aws_lc_rs;
use rustls_platform_verifier::BuilderVerifierExt;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{CatalogError, TransportError};

/// One outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL. May already carry a (signed) query string.
    pub url: String,
    /// Extra query pairs appended by the transport
    pub query: Vec<(String, String)>,
    /// Url-encoded form body, for POST requests
    pub form: Option<Vec<(String, String)>>,
    /// Value of the `Cookie` header
    pub cookie: Option<String>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            form: None,
            cookie: None,
        }
    }

    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            query: Vec::new(),
            form: Some(form),
            cookie: None,
        }
    }

    pub fn with_query<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie.filter(|c| !c.is_empty());
        self
    }

    /// Look up a query value by key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a form value by key.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .as_ref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status and body, nothing decoded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform exactly one round trip. Implementations must not retry.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Build a reqwest client with rustls and the platform certificate verifier.
pub fn default_client(config: &ClientConfig) -> Result<Client, CatalogError> {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let tls_config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| CatalogError::configuration(format!("tls protocol versions: {e}")))?
        .with_platform_verifier()
        .map_err(|e| CatalogError::configuration(format!("tls verifier: {e}")))?
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(config.timeout())
        .build()
        .map_err(|e| CatalogError::configuration(format!("http client: {e}")))
}

/// [`HttpTransport`] backed by reqwest.
///
/// Platform headers (user agent, referer) are attached to every request; the
/// cookie header comes from the request itself.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    headers: HeaderMap,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, CatalogError> {
        let client = default_client(config)?;
        Self::with_client(client, config)
    }

    /// Use an existing client, e.g. one with a proxy configured.
    pub fn with_client(client: Client, config: &ClientConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(header::REFERER, header_value(&config.referer)?);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3"),
        );
        // Accept-Encoding is left to reqwest so responses are decompressed automatically.
        Ok(Self { client, headers })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, CatalogError> {
    HeaderValue::from_str(value)
        .map_err(|e| CatalogError::configuration(format!("invalid header value {value:?}: {e}")))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(self.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        if let Some(cookie) = request.cookie.as_deref() {
            match HeaderValue::from_str(cookie) {
                Ok(value) => builder = builder.header(header::COOKIE, value),
                Err(e) => {
                    // skip the header rather than send a broken one
                    debug!(error = %e, "Failed to build Cookie header");
                }
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, len = body.len(), "Received response");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_helpers() {
        let request = ApiRequest::get("https://api.bilibili.com/x/web-interface/nav")
            .with_query("ps", 20)
            .with_query("keyword", "rust")
            .with_cookie(Some(String::new()));
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query_value("ps"), Some("20"));
        assert_eq!(request.query_value("missing"), None);
        assert!(request.cookie.is_none());

        let post = ApiRequest::post_form("https://x", vec![("csrf".into(), "t".into())]);
        assert_eq!(post.form_value("csrf"), Some("t"));
        assert_eq!(post.form_value("msg"), None);
    }

    #[test]
    fn test_response_status() {
        assert!(ApiResponse::new(200, "{}").is_success());
        assert!(!ApiResponse::new(412, "").is_success());
    }
}
