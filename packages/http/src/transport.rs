//! The HTTP transport seam.
//!
//! A [`Transport`] makes [`Channel`]s; a channel issues the two requests a
//! mount needs (a metadata probe and a ranged read) over one reusable
//! connection. Tests substitute the mock in [`mock`] to avoid the network.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, LAST_MODIFIED, RANGE};
use url::Url;

use crate::Error;

/// Makes channels bound to a mount's root endpoint.
pub trait Transport: Send + Sync {
    /// Open a new channel for requests beneath `root`.
    fn connect(&self, root: &Url) -> Result<Box<dyn Channel>, Error>;
}

/// One reusable, stateful connection.
///
/// A channel is used by a single operation at a time. It is only safe to
/// issue another request once the previous response has been read to the
/// end; the pool enforces this by discarding channels whose responses were
/// abandoned.
pub trait Channel: Send {
    /// Probe a resource without fetching its body.
    fn request_metadata(&mut self, url: &Url) -> Result<MetadataResponse, Error>;

    /// Fetch a resource starting at `offset`.
    fn request_range(&mut self, url: &Url, offset: u64) -> Result<RangeResponse, Error>;
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Result of a metadata probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse {
    pub status: u16,

    /// Length of the resource as reported by the server.
    pub content_length: Option<u64>,

    /// Raw `Last-Modified` value, unparsed.
    pub last_modified: Option<String>,

    /// The URL that finally answered, after redirects.
    pub final_url: Option<Url>,
}

impl MetadataResponse {
    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }
}

/// Result of a ranged read request.
pub struct RangeResponse {
    pub status: u16,

    /// True when the server answered with partial content, i.e. the body
    /// begins at the requested offset rather than at byte zero.
    pub range_honored: bool,

    /// Length of `body` as reported by the server.
    pub content_length: Option<u64>,

    pub body: Box<dyn Read + Send>,
}

impl RangeResponse {
    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }
}

impl fmt::Debug for RangeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeResponse")
            .field("status", &self.status)
            .field("range_honored", &self.range_honored)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Settings applied to every channel a [`ReqwestTransport`] opens.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Whole-request timeout, including reading the body.
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

/// Production transport using reqwest's blocking client.
///
/// Every channel owns a separate `Client` that keeps at most one idle
/// connection per host, so a pooled channel corresponds to a single
/// keep-alive connection.
pub struct ReqwestTransport {
    options: TransportOptions,
    headers: HeaderMap,
}

impl ReqwestTransport {
    pub fn new(options: TransportOptions) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            headers.insert(
                HeaderName::try_from(name.as_str())?,
                HeaderValue::try_from(value.as_str())?,
            );
        }
        Ok(Self { options, headers })
    }

    /// Create with default options (30 second timeout).
    pub fn with_default_options() -> Self {
        Self {
            options: TransportOptions::default(),
            headers: HeaderMap::new(),
        }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

impl Transport for ReqwestTransport {
    fn connect(&self, root: &Url) -> Result<Box<dyn Channel>, Error> {
        let mut builder = Client::builder()
            .timeout(self.options.timeout)
            .pool_max_idle_per_host(1)
            .default_headers(self.headers.clone());
        if let Some(agent) = &self.options.user_agent {
            builder = builder.user_agent(agent.as_str());
        }

        log::debug!("Opening channel for {}", root);
        Ok(Box::new(ReqwestChannel {
            client: builder.build()?,
        }))
    }
}

struct ReqwestChannel {
    client: Client,
}

fn header_u64(headers: &HeaderMap, name: HeaderName) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

impl Channel for ReqwestChannel {
    fn request_metadata(&mut self, url: &Url) -> Result<MetadataResponse, Error> {
        let response = self.client.head(url.clone()).send()?;

        // HEAD responses have no body, so reqwest's own content_length()
        // would report zero; read the header instead.
        Ok(MetadataResponse {
            status: response.status().as_u16(),
            content_length: header_u64(response.headers(), CONTENT_LENGTH),
            last_modified: response
                .headers()
                .get(LAST_MODIFIED)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            final_url: Some(response.url().clone()),
        })
    }

    fn request_range(&mut self, url: &Url, offset: u64) -> Result<RangeResponse, Error> {
        let mut request = self.client.get(url.clone());
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }
        let response = request.send()?;

        let status = response.status();
        Ok(RangeResponse {
            status: status.as_u16(),
            range_honored: status == http::StatusCode::PARTIAL_CONTENT,
            content_length: header_u64(response.headers(), CONTENT_LENGTH),
            body: Box::new(response),
        })
    }
}
