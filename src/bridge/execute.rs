//! Code execution handlers.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::host::{Evaluation, ScriptValue};
use crate::protocol::{BatchStep, ErrorPayload, serialize_value, to_json_text};

use super::Bridge;
use super::dispatch::Reply;

// ============================================================================
// Types
// ============================================================================

/// Outcome of one batch step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    /// Position in the batch.
    pub index: usize,
    /// Caller label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// `true` if the step produced a value.
    pub success: bool,
    /// Serialized value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error for failed steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    /// `true` if the shared deadline ran out before the step started.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    /// Step time in ms.
    pub duration: f64,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Per-step outcomes, in order.
    pub results: Vec<StepOutcome>,
    /// Steps that succeeded.
    pub succeeded: usize,
    /// Steps that failed.
    pub failed: usize,
    /// Steps skipped by the deadline.
    pub skipped: usize,
    /// `true` if a failure stopped the batch.
    pub stopped: bool,
    /// Total batch time in ms.
    pub duration: f64,
}

// ============================================================================
// Bridge - Execution
// ============================================================================

impl Bridge {
    /// Evaluates code and serializes its value.
    pub(crate) async fn execute(&self, code: &str, timeout_ms: Option<u64>) -> Result<Reply> {
        let value = self.evaluate(code, self.deadline(timeout_ms)).await?;
        Ok(Some(serialize_value(
            &value,
            self.inner.config.limits.markup_chars,
        )))
    }

    /// Runs steps in order under one shared deadline.
    pub(crate) async fn batch_execute(
        &self,
        steps: Vec<BatchStep>,
        timeout_ms: Option<u64>,
    ) -> Result<Reply> {
        let started = Instant::now();
        let deadline = started + self.deadline(timeout_ms);
        let markup_chars = self.inner.config.limits.markup_chars;

        let mut results = Vec::with_capacity(steps.len());
        let mut stopped = false;

        for (index, step) in steps.into_iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                results.push(StepOutcome {
                    index,
                    label: step.label,
                    success: false,
                    result: None,
                    error: None,
                    skipped: true,
                    duration: 0.0,
                });
                continue;
            }

            let step_started = Instant::now();
            let outcome = self.evaluate(&step.code, remaining).await;
            let duration = step_started.elapsed().as_secs_f64() * 1000.0;

            match outcome {
                Ok(value) => results.push(StepOutcome {
                    index,
                    label: step.label,
                    success: true,
                    result: Some(serialize_value(&value, markup_chars)),
                    error: None,
                    skipped: false,
                    duration,
                }),
                Err(e) => {
                    results.push(StepOutcome {
                        index,
                        label: step.label,
                        success: false,
                        result: None,
                        error: Some(ErrorPayload::from_error(&e)),
                        skipped: false,
                        duration,
                    });
                    if !step.continue_on_error {
                        debug!(index, error = %e, "Batch stopped");
                        stopped = true;
                        break;
                    }
                }
            }
        }

        let outcome = BatchOutcome {
            succeeded: results.iter().filter(|r| r.success).count(),
            failed: results.iter().filter(|r| !r.success && !r.skipped).count(),
            skipped: results.iter().filter(|r| r.skipped).count(),
            results,
            stopped,
            duration: started.elapsed().as_secs_f64() * 1000.0,
        };
        to_json_text(&outcome).map(Some)
    }

    /// Evaluates code, waiting up to `deadline` for a deferred value.
    ///
    /// A deferred value that misses the deadline keeps running on its own
    /// task; only the wait is abandoned.
    async fn evaluate(&self, code: &str, deadline: Duration) -> Result<ScriptValue> {
        let pending = match self.inner.hosts.script.evaluate(code)? {
            Evaluation::Ready(value) => return Ok(value),
            Evaluation::Deferred(pending) => pending,
        };

        let started = Instant::now();
        let handle = tokio::spawn(pending);

        match timeout(deadline, handle).await {
            Ok(Ok(settled)) => settled.map_err(Error::from),
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "Deferred evaluation aborted");
                Err(Error::host(format!("deferred evaluation aborted: {join_err}")))
            }
            Err(_) => Err(Error::timeout(
                "execute",
                started.elapsed().as_millis() as u64,
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
