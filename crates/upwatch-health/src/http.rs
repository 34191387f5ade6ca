//! Minimal HTTP/1.1 client used for health probes and mail relay calls.
//!
//! One connection per request: TCP connect, optional rustls handshake,
//! hyper handshake, send, collect the body. Redirects are never followed
//! and status codes are returned as-is. Every phase shares one deadline.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_rustls::TlsConnector;
use tracing::debug;

const USER_AGENT: &str = concat!("upwatch/", env!("CARGO_PKG_VERSION"));

/// Why a request did not produce a full body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    /// The request never got a response (bad URL, DNS, refused, TLS, timeout).
    #[error("{0}")]
    Access(String),
    /// Headers arrived but the body could not be read to the end.
    #[error("{0}")]
    Body(String),
}

/// Errors building the client itself.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("tls configuration error: {0}")]
    Tls(String),
}

/// Where to connect for a given URL.
struct Target {
    https: bool,
    host: String,
    port: u16,
    authority: String,
    path_and_query: String,
}

impl Target {
    fn parse(url: &str) -> Result<Self, String> {
        let uri: Uri = url.parse().map_err(|e| format!("invalid url: {e}"))?;
        let https = match uri.scheme_str() {
            Some("http") => false,
            Some("https") => true,
            Some(other) => return Err(format!("unsupported scheme: {other}")),
            None => return Err("invalid url: missing scheme".to_string()),
        };
        let authority = uri
            .authority()
            .ok_or_else(|| "invalid url: missing host".to_string())?;
        let host = authority
            .host()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = authority.port_u16().unwrap_or(if https { 443 } else { 80 });
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .filter(|pq| !pq.is_empty())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            https,
            host,
            port,
            authority: authority.as_str().to_string(),
            path_and_query,
        })
    }
}

/// Check that `url` is something the client can fetch: an absolute `http`
/// or `https` URL with a host.
pub fn validate_url(url: &str) -> Result<(), String> {
    Target::parse(url).map(|_| ())
}

/// HTTP client with a fixed per-request timeout and strict TLS.
#[derive(Clone)]
pub struct HttpClient {
    tls: TlsConnector,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client that verifies certificates against the Mozilla roots.
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Tls(e.to_string()))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        Ok(Self {
            tls: TlsConnector::from(Arc::new(config)),
            timeout,
        })
    }

    /// GET `url` and return the full body regardless of status code.
    pub async fn get(&self, url: &str) -> Result<Bytes, FetchFailure> {
        let (_, body) = self.execute(Method::GET, url, None).await?;
        Ok(body)
    }

    /// POST a JSON document and return the status and body.
    pub async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<(StatusCode, Bytes), FetchFailure> {
        let bytes = serde_json::to_vec(payload).map_err(|e| FetchFailure::Access(e.to_string()))?;
        self.execute(Method::POST, url, Some(Bytes::from(bytes))).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        json: Option<Bytes>,
    ) -> Result<(StatusCode, Bytes), FetchFailure> {
        let deadline = Instant::now() + self.timeout;
        let target = Target::parse(url).map_err(FetchFailure::Access)?;

        let mut builder = Request::builder()
            .method(method)
            .uri(target.path_and_query.as_str())
            .header(header::HOST, target.authority.as_str())
            .header(header::USER_AGENT, USER_AGENT);
        if json.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(json.unwrap_or_default()))
            .map_err(|e| FetchFailure::Access(format!("invalid request: {e}")))?;

        let response = match tokio::time::timeout_at(deadline, self.send(&target, request)).await {
            Ok(result) => result.map_err(FetchFailure::Access)?,
            Err(_) => {
                return Err(FetchFailure::Access(format!(
                    "request timed out after {:?}",
                    self.timeout
                )));
            }
        };

        let status = response.status();
        debug!(%url, %status, "response headers received");

        let body = match tokio::time::timeout_at(deadline, response.into_body().collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => return Err(FetchFailure::Body(e.to_string())),
            Err(_) => {
                return Err(FetchFailure::Body(format!(
                    "body read timed out after {:?}",
                    self.timeout
                )));
            }
        };

        Ok((status, body))
    }

    async fn send(
        &self,
        target: &Target,
        request: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, String> {
        let stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| e.to_string())?;

        if target.https {
            let server_name = ServerName::try_from(target.host.clone())
                .map_err(|e| format!("invalid server name: {e}"))?;
            let tls = self
                .tls
                .connect(server_name, stream)
                .await
                .map_err(|e| format!("tls handshake failed: {e}"))?;
            exchange(tls, request).await
        } else {
            exchange(stream, request).await
        }
    }
}

/// Run one request over an established stream.
async fn exchange<S>(io: S, request: Request<Full<Bytes>>) -> Result<Response<Incoming>, String>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(io))
        .await
        .map_err(|e| format!("http handshake failed: {e}"))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "connection closed with error");
        }
    });

    sender.send_request(request).await.map_err(|e| e.to_string())
}
