//! reqwest-backed agent transport
//!
//! One `reqwest::Client` is built up front with the fixed headers and
//! timeouts and shared by every call. Each endpoint picks its own body
//! decoding: JSON everywhere except `mobile/screen`, whose body is a bare
//! data URL read as text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use md_core::config::ClientConfig;
use md_core::{AgentTransport, Endpoint, PairingCode, TransportError};
use md_protocol::{
    CommandRequest, CommandResponse, ConnectionRequest, ConnectionResponse,
    ConnectionStatusResponse, ProbeResponse, SystemMetricsResponse, CONNECTION_CODE_HEADER,
};

/// Characters of a body included in debug logs
const LOG_PREVIEW_LEN: usize = 100;

/// HTTP implementation of [`AgentTransport`]
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::with_options(&config.client_id, config.request_timeout)
    }

    /// Build a transport with an explicit client identifier and timeout
    pub fn with_options(client_id: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/plain, application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(client_id)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} -> HTTP {}", response.url(), status);
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TransportError> {
        let body = self.read_text(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!("Undecodable JSON body: {}", preview(&body));
            TransportError::Decode(e.to_string())
        })
    }

    async fn read_text(&self, request: RequestBuilder) -> Result<String, TransportError> {
        let response = self.send(request).await?;
        let url = response.url().clone();
        let body = response.text().await.map_err(map_reqwest_error)?;
        tracing::debug!("{} -> {} bytes: {}", url, body.len(), preview(&body));
        Ok(body)
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn probe(&self, endpoint: &Endpoint) -> Result<ProbeResponse, TransportError> {
        let url = endpoint.root();
        self.read_json(self.client.get(url)).await
    }

    async fn request_connection(
        &self,
        endpoint: &Endpoint,
        request: &ConnectionRequest,
    ) -> Result<ConnectionResponse, TransportError> {
        let url = endpoint.join("connection/request")?;
        self.read_json(self.client.post(url).json(request)).await
    }

    async fn connection_status(
        &self,
        endpoint: &Endpoint,
        code: &PairingCode,
    ) -> Result<ConnectionStatusResponse, TransportError> {
        let url = endpoint.join(&format!("connection/status/{}", code))?;
        self.read_json(self.client.get(url)).await
    }

    async fn screen(
        &self,
        endpoint: &Endpoint,
        code: &PairingCode,
    ) -> Result<String, TransportError> {
        let url = endpoint.join("mobile/screen")?;
        let body = self
            .read_text(self.client.get(url).header(CONNECTION_CODE_HEADER, code.as_str()))
            .await?;
        Ok(unwrap_legacy_frame(body))
    }

    async fn execute_command(
        &self,
        endpoint: &Endpoint,
        code: &PairingCode,
        request: &CommandRequest,
    ) -> Result<CommandResponse, TransportError> {
        let url = endpoint.join("mobile/execute-command")?;
        self.read_json(
            self.client
                .post(url)
                .header(CONNECTION_CODE_HEADER, code.as_str())
                .json(request),
        )
        .await
    }

    async fn system_metrics(
        &self,
        endpoint: &Endpoint,
        code: &PairingCode,
    ) -> Result<SystemMetricsResponse, TransportError> {
        let url = endpoint.join("system-metrics")?;
        self.read_json(self.client.get(url).header(CONNECTION_CODE_HEADER, code.as_str()))
            .await
    }
}

/// Older agents wrap the frame as `{"frame": "data:..."}`; newer ones send
/// the data URL bare. Anything that is not that exact JSON shape is
/// returned untouched for the caller to validate.
fn unwrap_legacy_frame(body: String) -> String {
    if !body.trim_start().starts_with('{') {
        return body;
    }
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Object(map)) => match map.get("frame") {
            Some(serde_json::Value::String(frame)) => frame.clone(),
            _ => body,
        },
        _ => body,
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_decode() || e.is_body() {
        TransportError::Decode(e.to_string())
    } else if let Some(status) = e.status() {
        TransportError::Status {
            code: status.as_u16(),
        }
    } else if e.is_builder() {
        TransportError::InvalidUrl(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

fn preview(body: &str) -> String {
    let mut out: String = body.chars().take(LOG_PREVIEW_LEN).collect();
    if body.len() > out.len() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_legacy_frame() {
        let wrapped = r#"{"frame":"data:image/png;base64,AAAA"}"#.to_string();
        assert_eq!(unwrap_legacy_frame(wrapped), "data:image/png;base64,AAAA");

        let bare = "data:image/png;base64,AAAA".to_string();
        assert_eq!(unwrap_legacy_frame(bare.clone()), bare);

        let other = r#"{"error":"no screen"}"#.to_string();
        assert_eq!(unwrap_legacy_frame(other.clone()), other);
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.len(), LOG_PREVIEW_LEN + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_builds_with_default_config() {
        assert!(HttpTransport::new(&ClientConfig::default()).is_ok());
    }
}
