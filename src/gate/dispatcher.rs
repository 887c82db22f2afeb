//! Dispatch coordination: one value in, one `(value, message)` out.

use crate::gate::{extract::find_between, DispatchError, GatePool, Submit};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

// Markers bounding the message field in a raw gate reply.
const MESSAGE_OPEN: &str = "\"message\":\"";
const MESSAGE_CLOSE: &str = "\"";

const PACING_DELAY: Duration = Duration::from_secs(1);

/// Tuning knobs for a [`Dispatcher`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Pause applied after every submission attempt, success or not.
    pub delay: Duration,
    /// When set, non-2xx gate replies are not mined for a message.
    pub require_success: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delay: PACING_DELAY,
            require_success: false,
        }
    }
}

/// Outcome of one dispatch: the value as submitted and the message the
/// gate replied with, if one could be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub value: String,
    pub message: Option<String>,
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A missing message renders as the literal `None`.
        write!(
            f,
            "{} => {}",
            self.value,
            self.message.as_deref().unwrap_or("None")
        )
    }
}

/// Runs the dispatch pipeline: select a gate, submit, pace, extract.
#[derive(Clone)]
pub struct Dispatcher {
    pool: Arc<GatePool>,
    submitter: Arc<dyn Submit>,
    config: DispatchConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new(pool: GatePool, submitter: Arc<dyn Submit>, config: DispatchConfig) -> Self {
        Self {
            pool: Arc::new(pool),
            submitter,
            config,
        }
    }

    /// Dispatch one value through the full pipeline.
    ///
    /// The pacing delay runs after the submission attempt completes, on
    /// transport failures as well, so a failing gate cannot speed up the
    /// caller loop.
    ///
    /// # Errors
    /// Returns [`DispatchError::Transport`] when the gate could not be
    /// reached; an extraction miss is not an error.
    #[instrument(skip(self, value), fields(value_len = value.len()))]
    pub async fn dispatch(&self, value: &str) -> Result<DispatchResult, DispatchError> {
        let gate = self.pool.select();
        debug!(gate, "gate selected");

        let attempt = self.submitter.submit(gate, value).await;

        sleep(self.config.delay).await;

        let reply = attempt?;

        let message = if self.config.require_success && !reply.status.is_success() {
            warn!(status = %reply.status, "gate replied with an error status, skipping extraction");
            None
        } else {
            find_between(&reply.body, MESSAGE_OPEN, MESSAGE_CLOSE).map(str::to_string)
        };

        debug!(found = message.is_some(), "message extraction finished");

        Ok(DispatchResult {
            value: value.to_string(),
            message,
        })
    }

    /// Dispatch a batch of values over a bounded number of workers.
    ///
    /// Results come back in input order regardless of completion order;
    /// each slot carries its own dispatch outcome.
    pub async fn dispatch_all(
        &self,
        values: Vec<String>,
        workers: usize,
    ) -> Vec<Result<DispatchResult, DispatchError>> {
        let total = values.len();
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut tasks = JoinSet::new();

        for (slot, value) in values.into_iter().enumerate() {
            let dispatcher = self.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // The semaphore is never closed; treat a failed acquire as
                // a lost worker instead of panicking.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (slot, Err(DispatchError::WorkerLost));
                };

                (slot, dispatcher.dispatch(&value).await)
            });
        }

        let mut slots: Vec<Option<Result<DispatchResult, DispatchError>>> = Vec::new();
        slots.resize_with(total, || None);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, result)) => slots[slot] = Some(result),
                Err(err) => error!("dispatch worker failed: {err}"),
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(DispatchError::WorkerLost)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatchConfig, DispatchResult, Dispatcher};
    use crate::gate::{DispatchError, GatePool, GateReply, Submit};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    fn reply(status: StatusCode, body: &str) -> GateReply {
        GateReply {
            status,
            body: body.to_string(),
        }
    }

    fn quick_config() -> DispatchConfig {
        DispatchConfig {
            delay: Duration::from_millis(0),
            require_success: false,
        }
    }

    struct StubSubmit {
        status: StatusCode,
        body: String,
        gates_seen: Mutex<Vec<String>>,
    }

    impl StubSubmit {
        fn with_body(body: &str) -> Self {
            Self {
                status: StatusCode::OK,
                body: body.to_string(),
                gates_seen: Mutex::new(Vec::new()),
            }
        }

        fn with_status(status: StatusCode, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                gates_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Submit for StubSubmit {
        async fn submit(&self, gate: &str, _value: &str) -> Result<GateReply, DispatchError> {
            if let Ok(mut seen) = self.gates_seen.lock() {
                seen.push(gate.to_string());
            }
            Ok(reply(self.status, &self.body))
        }
    }

    struct FailSubmit;

    #[async_trait]
    impl Submit for FailSubmit {
        async fn submit(&self, _gate: &str, _value: &str) -> Result<GateReply, DispatchError> {
            Err(DispatchError::Transport("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn dispatch_extracts_message() -> anyhow::Result<()> {
        let stub = Arc::new(StubSubmit::with_body(
            r#"{"status":"ok","message":"APPROVED","code":200}"#,
        ));
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            stub.clone(),
            quick_config(),
        );

        let result = dispatcher.dispatch("4111111111111111").await?;

        assert_eq!(
            result,
            DispatchResult {
                value: "4111111111111111".to_string(),
                message: Some("APPROVED".to_string()),
            }
        );
        assert_eq!(result.to_string(), "4111111111111111 => APPROVED");

        let seen = stub.gates_seen.lock().expect("gates_seen poisoned");
        assert_eq!(*seen, ["stub.gate"]);
        Ok(())
    }

    #[tokio::test]
    async fn dispatch_without_message_yields_none() -> anyhow::Result<()> {
        let stub = Arc::new(StubSubmit::with_body(r#"{"status":"ok"}"#));
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            stub,
            quick_config(),
        );

        let result = dispatcher.dispatch("value-1").await?;

        assert_eq!(result.message, None);
        assert_eq!(result.to_string(), "value-1 => None");
        Ok(())
    }

    #[tokio::test]
    async fn error_status_is_still_extracted_by_default() -> anyhow::Result<()> {
        let stub = Arc::new(StubSubmit::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"message":"DECLINED"}"#,
        ));
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            stub,
            quick_config(),
        );

        let result = dispatcher.dispatch("value-2").await?;

        assert_eq!(result.message.as_deref(), Some("DECLINED"));
        Ok(())
    }

    #[tokio::test]
    async fn require_success_skips_extraction_on_error_status() -> anyhow::Result<()> {
        let stub = Arc::new(StubSubmit::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"message":"DECLINED"}"#,
        ));
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            stub,
            DispatchConfig {
                delay: Duration::from_millis(0),
                require_success: true,
            },
        );

        let result = dispatcher.dispatch("value-3").await?;

        assert_eq!(result.message, None);
        Ok(())
    }

    #[tokio::test]
    async fn dispatch_waits_the_configured_delay() -> anyhow::Result<()> {
        let delay = Duration::from_millis(50);
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            Arc::new(StubSubmit::with_body("{}")),
            DispatchConfig {
                delay,
                require_success: false,
            },
        );

        let started = Instant::now();
        dispatcher.dispatch("paced").await?;

        assert!(
            started.elapsed() >= delay,
            "dispatch returned before the pacing delay elapsed"
        );
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_propagates_after_the_delay() {
        let delay = Duration::from_millis(50);
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            Arc::new(FailSubmit),
            DispatchConfig {
                delay,
                require_success: false,
            },
        );

        let started = Instant::now();
        let result = dispatcher.dispatch("doomed").await;

        assert!(matches!(result, Err(DispatchError::Transport(_))));
        assert!(
            started.elapsed() >= delay,
            "failed dispatch must still pace"
        );
    }

    struct EchoSubmit;

    #[async_trait]
    impl Submit for EchoSubmit {
        async fn submit(&self, _gate: &str, value: &str) -> Result<GateReply, DispatchError> {
            // Earlier slots finish later so completion order differs from
            // submission order.
            let pause = match value {
                "v0" => 30,
                "v1" => 20,
                "v2" => 10,
                _ => 0,
            };
            sleep(Duration::from_millis(pause)).await;

            Ok(reply(
                StatusCode::OK,
                &format!(r#"{{"message":"ok-{value}"}}"#),
            ))
        }
    }

    #[tokio::test]
    async fn dispatch_all_preserves_input_order() {
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            Arc::new(EchoSubmit),
            quick_config(),
        );

        let values: Vec<String> = (0..4).map(|i| format!("v{i}")).collect();
        let results = dispatcher.dispatch_all(values, 4).await;

        assert_eq!(results.len(), 4);
        for (index, result) in results.iter().enumerate() {
            let result = result.as_ref().expect("dispatch should succeed");
            assert_eq!(result.value, format!("v{index}"));
            assert_eq!(result.message.as_deref(), Some(format!("ok-v{index}").as_str()));
        }
    }

    #[tokio::test]
    async fn dispatch_all_clamps_zero_workers() {
        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            Arc::new(StubSubmit::with_body(r#"{"message":"ok"}"#)),
            quick_config(),
        );

        let results = dispatcher
            .dispatch_all(vec!["a".to_string(), "b".to_string()], 0)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn dispatch_all_keeps_failures_in_their_slot() {
        struct FlakySubmit;

        #[async_trait]
        impl Submit for FlakySubmit {
            async fn submit(&self, _gate: &str, value: &str) -> Result<GateReply, DispatchError> {
                if value == "bad" {
                    Err(DispatchError::Transport("connection reset".to_string()))
                } else {
                    Ok(reply(StatusCode::OK, r#"{"message":"ok"}"#))
                }
            }
        }

        let dispatcher = Dispatcher::new(
            GatePool::from_spec(Some("stub.gate")),
            Arc::new(FlakySubmit),
            quick_config(),
        );

        let values = vec!["good".to_string(), "bad".to_string(), "good".to_string()];
        let results = dispatcher.dispatch_all(values, 2).await;

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DispatchError::Transport(_))));
        assert!(results[2].is_ok());
    }
}
