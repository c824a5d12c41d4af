//! Retrieval of feeds and alerts over HTTP.
//!
//! [`check_response`] validates a response before any of its body is handed to the decoder;
//! [`Client`] composes it with a hyper client and the decode entry points.

use crate::decode::{decode_alert, decode_atom_feed, DecodeError};
use crate::{Alert, AtomFeed, Link};
use bytes::{Bytes, BytesMut};
use hyper::body::HttpBody;
use hyper::client::connect::Connect;
use hyper::client::HttpConnector;
use hyper::{header, Body, HeaderMap, Response, StatusCode};
use hyper_tls::HttpsConnector;

mod gzip;

/// The NWS national feed of active watches, warnings and advisories.
pub const NWS_ATOM_FEED_URI: &str = "https://alerts.weather.gov/cap/us.php?x=0";

/// 5 MiB
pub const DEFAULT_MAX_BODY_SIZE: u64 = 5 * 1024 * 1024;

/// Redirects followed by [`Client::fetch`] before giving up.
pub const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClientConfig {
    /// Largest body accepted, checked against the declared length before reading and against
    /// the bytes actually read (and inflated) after.
    pub max_body_size: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),
    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] hyper::Error),
    #[error("non-200 status code received from server: {0}")]
    BadStatus(u16),
    #[error("no content was returned")]
    EmptyBody,
    #[error("response exceeds maximum size of {0} bytes")]
    TooLarge(u64),
    #[error("invalid redirect location: {0}")]
    InvalidRedirect(#[from] url::ParseError),
    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),
    #[error("invalid gzip content: {0}")]
    Gzip(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Validate a response and read its body.
///
/// An error already carried by `response` is returned as is. Otherwise the response must have
/// status 200, must not declare a zero or over-`limit` `Content-Length`, and its body (after
/// gzip inflation, if the server applied it) must fit in `limit` bytes.
pub async fn check_response(
    response: Result<Response<Body>, FetchError>,
    limit: u64,
) -> Result<Bytes, FetchError> {
    let response = response?;

    let status = response.status();
    if status != StatusCode::OK {
        log::warn!("rejecting response with status {}", status);
        return Err(FetchError::BadStatus(status.as_u16()));
    }

    match content_length(response.headers()) {
        Some(0) => return Err(FetchError::EmptyBody),
        Some(length) if length > limit => {
            log::warn!("rejecting response declaring {} bytes", length);
            return Err(FetchError::TooLarge(limit));
        }
        _ => {}
    }

    let gzipped = is_gzip(response.headers());
    let body = read_body(response.into_body(), limit).await?;
    if body.is_empty() {
        return Err(FetchError::EmptyBody);
    }

    if gzipped {
        gzip::decompress(&body, limit)
    } else {
        Ok(body)
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("gzip") || v.eq_ignore_ascii_case("x-gzip"))
        .unwrap_or(false)
}

fn redirect_location(response: &Response<Body>) -> Option<&str> {
    match response.status() {
        StatusCode::MOVED_PERMANENTLY
        | StatusCode::FOUND
        | StatusCode::SEE_OTHER
        | StatusCode::TEMPORARY_REDIRECT
        | StatusCode::PERMANENT_REDIRECT => response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        _ => None,
    }
}

/// Resolve a `Location` header against the URI that produced it.
fn resolve(base: &hyper::Uri, location: &str) -> Result<hyper::Uri, FetchError> {
    let target = url::Url::parse(&base.to_string())?.join(location)?;
    Ok(target.as_str().parse()?)
}

async fn read_body(mut body: Body, limit: u64) -> Result<Bytes, FetchError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if (buf.len() + chunk.len()) as u64 > limit {
            return Err(FetchError::TooLarge(limit));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// Fetches and decodes CAP documents.
#[derive(Clone)]
pub struct Client<C = HttpsConnector<HttpConnector>> {
    http: hyper::Client<C, Body>,
    config: ClientConfig,
}

impl Client {
    pub fn with_config(config: ClientConfig) -> Self {
        Self::new(
            hyper::Client::builder().build(HttpsConnector::new()),
            config,
        )
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::with_config(ClientConfig::default())
    }
}

impl<C> std::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C> Client<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub fn new(http: hyper::Client<C, Body>, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `uri` and return its validated body, following up to [`MAX_REDIRECTS`] redirects.
    pub async fn fetch(&self, uri: &str) -> Result<Bytes, FetchError> {
        let mut uri: hyper::Uri = uri.parse()?;
        let mut redirects = 0;

        loop {
            let request = hyper::Request::builder()
                .uri(uri.clone())
                .header(
                    header::ACCEPT,
                    "application/atom+xml, application/cap+xml, application/xml;q=0.9, */*;q=0.8",
                )
                .header(header::ACCEPT_ENCODING, "gzip")
                .header(header::USER_AGENT, self.config.user_agent.as_str())
                .body(Body::empty())?;

            let response = self.http.request(request).await.map_err(FetchError::from);
            if let Ok(response) = &response {
                log::info!("GET {}: {}", uri, response.status());

                if let Some(location) = redirect_location(response) {
                    if redirects == MAX_REDIRECTS {
                        return Err(FetchError::TooManyRedirects(MAX_REDIRECTS));
                    }
                    redirects += 1;
                    uri = resolve(&uri, location)?;
                    continue;
                }
            }

            return check_response(response, self.config.max_body_size).await;
        }
    }

    pub async fn atom_feed(&self, uri: &str) -> Result<AtomFeed, FetchError> {
        let body = self.fetch(uri).await?;
        Ok(decode_atom_feed(&body)?)
    }

    /// Fetch the NWS national feed.
    pub async fn nws_atom_feed(&self) -> Result<AtomFeed, FetchError> {
        self.atom_feed(NWS_ATOM_FEED_URI).await
    }

    pub async fn alert(&self, uri: &str) -> Result<Alert, FetchError> {
        let body = self.fetch(uri).await?;
        Ok(decode_alert(&body)?)
    }

    /// Fetch and decode the CAP alert a feed link points to.
    pub async fn follow_alert(&self, link: &Link) -> Result<Alert, FetchError> {
        self.alert(&link.href).await
    }
}
