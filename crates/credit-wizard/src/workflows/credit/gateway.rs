//! Submission seam between the wizard and whatever evaluates a request.
//!
//! The wizard validates locally before any call reaches a gateway. [`SimulatedGateway`] stands in
//! for a scoring backend with configurable latency and a configured report.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cancellation::CancellationToken;
use super::domain::{DocumentPurpose, SubmissionMethod, WizardStep};
use super::intake::FileSelection;
use super::report::ScoreReport;
use crate::config::WizardConfig;

/// Identifier of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionTicket(pub u64);

impl fmt::Display for SubmissionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{:04}", self.0)
    }
}

/// Data captured from a validated step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionPayload {
    Request {
        method: SubmissionMethod,
        contact: BTreeMap<String, String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<FileSelection>,
    },
    Clarification {
        answers: BTreeMap<String, String>,
        documents: BTreeMap<DocumentPurpose, FileSelection>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub ticket: SubmissionTicket,
    pub step: WizardStep,
    pub payload: SubmissionPayload,
}

/// Successful gateway answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionAck {
    /// The request was accepted for analysis.
    Received,
    /// Clarifications were processed and scored.
    Scored(ScoreReport),
}

/// Failure of a submission attempt; never a validation problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission failed to reach the scoring service: {0}")]
    Transport(String),
    #[error("submission cancelled")]
    Cancelled,
}

#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Submit a validated step. Implementations must resolve with
    /// [`SubmissionError::Cancelled`] promptly once `cancel` fires.
    async fn submit(
        &self,
        request: SubmissionRequest,
        cancel: CancellationToken,
    ) -> Result<SubmissionAck, SubmissionError>;
}

/// Stand-in backend: waits, then accepts the request or returns the configured report.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    request_delay: Duration,
    clarification_delay: Duration,
    report: ScoreReport,
}

impl SimulatedGateway {
    pub fn new(request_delay: Duration, clarification_delay: Duration, report: ScoreReport) -> Self {
        Self {
            request_delay,
            clarification_delay,
            report,
        }
    }

    pub fn from_config(config: &WizardConfig, report: ScoreReport) -> Self {
        Self::new(config.request_delay, config.clarification_delay, report)
    }

    /// Zero latency; useful for tests and scripted demos.
    pub fn instant(report: ScoreReport) -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, report)
    }

    pub fn report(&self) -> &ScoreReport {
        &self.report
    }
}

#[async_trait]
impl SubmissionGateway for SimulatedGateway {
    async fn submit(
        &self,
        request: SubmissionRequest,
        cancel: CancellationToken,
    ) -> Result<SubmissionAck, SubmissionError> {
        let delay = match request.step {
            WizardStep::Submission => self.request_delay,
            WizardStep::Clarification => self.clarification_delay,
            WizardStep::Report => {
                return Err(SubmissionError::Rejected(
                    "the report step has nothing to submit".to_string(),
                ))
            }
        };

        debug!(ticket = %request.ticket, step = ?request.step, ?delay, "simulating submission");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                debug!(ticket = %request.ticket, "simulated submission cancelled");
                return Err(SubmissionError::Cancelled);
            }
        }

        match request.payload {
            SubmissionPayload::Request { .. } => Ok(SubmissionAck::Received),
            SubmissionPayload::Clarification { .. } => {
                Ok(SubmissionAck::Scored(self.report.clone()))
            }
        }
    }
}
