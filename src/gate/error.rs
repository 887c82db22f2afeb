use thiserror::Error;

/// Failures the dispatch pipeline can report.
///
/// Extraction misses are not listed here on purpose: a body without the
/// message markers is a normal outcome, carried as `message: None` in the
/// dispatch result.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The gate could not be reached or the body could not be read.
    /// Never retried; callers decide what a failed attempt means.
    #[error("gate transport failure: {0}")]
    Transport(String),

    /// A pool entry that cannot be turned into a request URL.
    #[error("invalid gate endpoint {endpoint:?}: {reason}")]
    Endpoint { endpoint: String, reason: String },

    /// A batch worker ended without reporting a result.
    #[error("dispatch worker terminated unexpectedly")]
    WorkerLost,
}

impl DispatchError {
    pub(crate) fn endpoint(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::Endpoint {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
