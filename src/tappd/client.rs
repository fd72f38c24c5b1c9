// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! tappd RPC client.
//!
//! tappd speaks JSON over HTTP: every call is a `POST /prpc/Tappd.<Method>`
//! with a JSON body. Inside a CVM it listens on a Unix domain socket; the
//! dstack simulator exposes the same surface on a TCP port.

use std::path::PathBuf;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    header::{CONTENT_TYPE, HOST},
    Method, Request, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::types::{
    encode_report_data, DeriveKeyRequest, DeriveKeyResponse, QuoteHashAlgorithm, TdxQuoteRequest,
    TdxQuoteResponse,
};
use super::AttestationBackend;

/// Socket path used by tappd inside a dstack CVM.
pub const DEFAULT_TAPPD_SOCKET: &str = "/var/run/tappd.sock";

const RPC_PREFIX: &str = "/prpc/Tappd.";

/// Errors talking to tappd.
#[derive(Debug, thiserror::Error)]
pub enum TappdError {
    #[error("Invalid tappd endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("tappd request failed: {0}")]
    Transport(String),

    #[error("tappd returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("tappd response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Invalid report data: {0}")]
    InvalidReportData(String),
}

/// Where tappd is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TappdEndpoint {
    /// Unix domain socket inside the CVM.
    Unix(PathBuf),
    /// HTTP base URL (dstack simulator).
    Http(url::Url),
}

impl TappdEndpoint {
    /// Parse an endpoint string. `http://` and `https://` values are URLs,
    /// anything else is a socket path.
    pub fn parse(endpoint: &str) -> Result<Self, TappdError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(TappdError::InvalidEndpoint("empty endpoint".to_string()));
        }

        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            let url = url::Url::parse(endpoint)
                .map_err(|e| TappdError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
            Ok(TappdEndpoint::Http(url))
        } else {
            Ok(TappdEndpoint::Unix(PathBuf::from(endpoint)))
        }
    }
}

impl Default for TappdEndpoint {
    fn default() -> Self {
        TappdEndpoint::Unix(PathBuf::from(DEFAULT_TAPPD_SOCKET))
    }
}

impl std::fmt::Display for TappdEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TappdEndpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            TappdEndpoint::Http(url) => write!(f, "{url}"),
        }
    }
}

/// tappd client.
///
/// Built once at startup and shared across requests. No request timeout is
/// applied: a call that never returns is not detected here.
#[derive(Clone)]
pub struct TappdClient {
    endpoint: TappdEndpoint,
    http: reqwest::Client,
}

impl TappdClient {
    pub fn new(endpoint: TappdEndpoint) -> Result<Self, TappdError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TappdError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &TappdEndpoint {
        &self.endpoint
    }

    async fn rpc<Req, Resp>(&self, method: &str, payload: &Req) -> Result<Resp, TappdError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(payload)
            .map_err(|e| TappdError::Transport(format!("failed to encode request: {e}")))?;
        let path = format!("{RPC_PREFIX}{method}");

        debug!(method, endpoint = %self.endpoint, "tappd rpc");

        let (status, bytes) = match &self.endpoint {
            TappdEndpoint::Http(base) => self.post_http(base, &path, body).await?,
            TappdEndpoint::Unix(socket) => post_unix(socket, &path, body).await?,
        };

        if !status.is_success() {
            return Err(TappdError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| TappdError::InvalidResponse(format!("{method}: {e}")))
    }

    async fn post_http(
        &self,
        base: &url::Url,
        path: &str,
        body: Vec<u8>,
    ) -> Result<(StatusCode, Bytes), TappdError> {
        let url = rpc_url(base, path);

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TappdError::Transport(e.to_string()))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| TappdError::InvalidResponse(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TappdError::Transport(e.to_string()))?;

        Ok((status, bytes))
    }
}

/// POST over a fresh Unix socket connection (one request per connection).
#[cfg(unix)]
async fn post_unix(
    socket: &std::path::Path,
    path: &str,
    body: Vec<u8>,
) -> Result<(StatusCode, Bytes), TappdError> {
    use hyper_util::rt::TokioIo;
    use tokio::net::UnixStream;

    let stream = UnixStream::connect(socket)
        .await
        .map_err(|e| TappdError::Transport(format!("{}: {e}", socket.display())))?;

    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| TappdError::Transport(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(error = %e, "tappd connection closed with error");
        }
    });

    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(HOST, "localhost")
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .map_err(|e| TappdError::Transport(e.to_string()))?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| TappdError::Transport(e.to_string()))?;

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| TappdError::Transport(e.to_string()))?
        .to_bytes();

    Ok((status, bytes))
}

#[cfg(not(unix))]
async fn post_unix(
    socket: &std::path::Path,
    _path: &str,
    _body: Vec<u8>,
) -> Result<(StatusCode, Bytes), TappdError> {
    Err(TappdError::InvalidEndpoint(format!(
        "unix sockets are not supported on this platform: {}",
        socket.display()
    )))
}

#[async_trait]
impl AttestationBackend for TappdClient {
    async fn info(&self) -> Result<serde_json::Value, TappdError> {
        self.rpc("Info", &serde_json::json!({})).await
    }

    async fn tdx_quote(
        &self,
        report_data: &[u8],
        hash_algorithm: QuoteHashAlgorithm,
    ) -> Result<TdxQuoteResponse, TappdError> {
        let report_data = encode_report_data(report_data, hash_algorithm)?;
        let request = TdxQuoteRequest {
            report_data: &report_data,
            hash_algorithm: hash_algorithm.as_str(),
        };
        self.rpc("TdxQuote", &request).await
    }

    async fn derive_key(&self, path: &str) -> Result<DeriveKeyResponse, TappdError> {
        let request = DeriveKeyRequest {
            path,
            subject: path,
        };
        self.rpc("DeriveKey", &request).await
    }
}

/// Append `path` to the endpoint URL, keeping any path prefix it carries.
fn rpc_url(base: &url::Url, path: &str) -> url::Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{path}"));
    url
}
