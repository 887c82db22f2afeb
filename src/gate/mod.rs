//! Outbound side of the dispatch pipeline.
//!
//! [`GateClient`] owns the shared HTTP client and knows how to turn a pool
//! entry plus an opaque value into the fixed-shape `POST /runserver/`
//! request every gate expects. The [`Submit`] trait is the seam the
//! coordinator depends on, so tests can stub the network away.

pub mod dispatcher;
pub mod extract;
pub mod pool;

mod error;

pub use dispatcher::{DispatchConfig, DispatchResult, Dispatcher};
pub use error::DispatchError;
pub use pool::{DEFAULT_GATE, GatePool};

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Placeholder fields the gates expect verbatim alongside the value.
const USERINFO: &str = "your_user_info_here";
const REMARKS: &str = "your_remarks_here";

/// Raw reply from a gate: status plus the unparsed body text.
///
/// The submitter never interprets the status; whether a non-2xx reply is
/// still mined for a message is the coordinator's call.
#[derive(Debug, Clone)]
pub struct GateReply {
    pub status: StatusCode,
    pub body: String,
}

/// Submit one value to one gate.
#[async_trait]
pub trait Submit: Send + Sync {
    /// Perform a single submission attempt, with no retries.
    async fn submit(&self, gate: &str, value: &str) -> Result<GateReply, DispatchError>;
}

#[derive(Serialize, Debug)]
struct DispatchPayload<'a> {
    userinfo: &'a str,
    remarks: &'a str,
    card: &'a str,
}

impl<'a> DispatchPayload<'a> {
    fn new(value: &'a str) -> Self {
        Self {
            userinfo: USERINFO,
            remarks: REMARKS,
            card: value,
        }
    }
}

/// Build the submission URL for a pool entry.
///
/// Bare hostnames get the `https` scheme; entries carrying an explicit
/// `http://` or `https://` prefix are used as-is.
fn gate_url(gate: &str) -> Result<Url, DispatchError> {
    let base = if gate.starts_with("http://") || gate.starts_with("https://") {
        gate.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", gate.trim_end_matches('/'))
    };

    Url::parse(&format!("{base}/runserver/"))
        .map_err(|e| DispatchError::endpoint(gate, e.to_string()))
}

/// Production [`Submit`] implementation backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct GateClient {
    client: Client,
}

impl GateClient {
    /// Build the shared HTTP client with the service `User-Agent` and
    /// fixed connect/request timeouts.
    ///
    /// # Errors
    /// Returns an error if the underlying TLS/client setup fails.
    pub fn new() -> Result<Self, DispatchError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Submit for GateClient {
    #[instrument(skip(self, value))]
    async fn submit(&self, gate: &str, value: &str) -> Result<GateReply, DispatchError> {
        let url = gate_url(gate)?;

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "*/*")
            .json(&DispatchPayload::new(value))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!(%status, body_len = body.len(), "gate replied");

        Ok(GateReply { status, body })
    }
}
