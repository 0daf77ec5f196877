//! HTTP clients for archive downloads and record delivery.

use bytes::Bytes;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::StreamReader;

/// Compressed archive body, read off the socket as it is consumed.
pub type ArchiveBody = StreamReader<BoxStream<'static, std::io::Result<Bytes>>, Bytes>;

/// Configuration for the HTTP clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Maximum idle time between reads of an archive body.
    ///
    /// Archives can be large, so there is no deadline on the whole transfer.
    pub fetch_read_timeout: Duration,
    /// Deadline for one delivery request, response body included.
    pub delivery_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            fetch_read_timeout: Duration::from_secs(60),
            delivery_timeout: Duration::from_secs(30),
            user_agent: format!("eddn-replay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Errors that can occur while fetching one archive.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No archive is published for this URL.
    #[error("Archive not found")]
    NotFound,

    /// Server returned an error status.
    #[error("Server error: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}

/// HTTP client for daily archive downloads.
///
/// Each fetch is a single attempt; a failed day is skipped by the caller.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    config: ClientConfig,
}

impl ArchiveClient {
    /// Creates a new archive client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            // Per-read deadline so a stalled transfer cannot hang the run
            .read_timeout(config.fetch_read_timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Requests one archive and returns its body as a byte stream.
    ///
    /// The body is not buffered; it is read as the caller consumes it.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn fetch(&self, url: Url) -> Result<ArchiveBody, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body: BoxStream<'static, std::io::Result<Bytes>> = Box::pin(
            response
                .bytes_stream()
                .map_err(std::io::Error::other),
        );
        Ok(StreamReader::new(body))
    }
}

/// Builds the client used for record delivery.
pub(crate) fn delivery_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.delivery_timeout)
        // Many small sequential requests to one host
        .pool_max_idle_per_host(1)
        .tcp_nodelay(true)
        .user_agent(&config.user_agent)
        .build()
}
