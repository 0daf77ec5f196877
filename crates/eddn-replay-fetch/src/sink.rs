//! Record delivery to the downstream collector.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url, header};
use thiserror::Error;

use crate::client::{ClientConfig, delivery_client};

/// Boxed error carried by [`DeliveryError`], so sinks are not tied to one client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a delivery whose request reached the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP status returned by the sink; informational only.
    pub status: u16,
    /// Response body bytes drained and discarded.
    pub drained: usize,
}

/// Errors that can occur while delivering one record.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The request never completed: refused, timed out, reset.
    ///
    /// The record is treated as not delivered.
    #[error("delivery failed: {0}")]
    Transport(#[source] BoxError),

    /// The request completed but its response body could not be drained.
    ///
    /// The record is treated as delivered.
    #[error("failed to drain response body (status {status}): {source}")]
    Drain {
        /// HTTP status returned by the sink.
        status: u16,
        /// The underlying read error.
        #[source]
        source: BoxError,
    },
}

/// A destination for records, one call per record.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Delivers one record body.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be handed over, or if the
    /// response could not be consumed afterwards.
    async fn deliver(&self, body: Bytes) -> Result<Delivery, DeliveryError>;
}

/// Posts each record as a JSON request body to a fixed URL.
///
/// The response status is not interpreted; the body is read to the end one
/// chunk at a time and dropped so the connection can be reused.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    url: Url,
}

impl HttpSink {
    /// Creates a sink posting to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: Url, config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: delivery_client(config)?,
            url,
        })
    }

    /// Returns the delivery URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn deliver(&self, body: Bytes) -> Result<Delivery, DeliveryError> {
        let mut response = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.into()))?;

        let status = response.status().as_u16();
        let mut drained = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| DeliveryError::Drain {
            status,
            source: e.into(),
        })? {
            drained += chunk.len();
        }

        Ok(Delivery { status, drained })
    }
}
