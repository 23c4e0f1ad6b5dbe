use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::credit::blueprint::{ProgressWeights, WizardBlueprint, REQUEST_TEXT_FIELD};
use crate::workflows::credit::cancellation::CancellationToken;
use crate::workflows::credit::controller::{Effect, WizardController, WizardEvent};
use crate::workflows::credit::domain::{DocumentPurpose, SubmissionMethod, WizardStep};
use crate::workflows::credit::fields::FieldSpec;
use crate::workflows::credit::gateway::{
    SubmissionAck, SubmissionError, SubmissionGateway, SubmissionRequest, SubmissionTicket,
};
use crate::workflows::credit::intake::{FileSelection, MimeCategory};
use crate::workflows::credit::report::ScoreReport;

pub(super) fn standard_blueprint() -> Arc<WizardBlueprint> {
    Arc::new(WizardBlueprint::standard())
}

/// Contact details up front and two supporting documents, weighted 60/40.
pub(super) fn extended_blueprint() -> Arc<WizardBlueprint> {
    Arc::new(
        WizardBlueprint::new(
            vec![
                FieldSpec::required("email", "Email address"),
                FieldSpec::required("phone", "Phone number"),
            ],
            vec![
                FieldSpec::required("employer", "Current employer"),
                FieldSpec::required("monthly_income", "Net monthly income"),
                FieldSpec::optional("notes", "Anything else we should know?"),
            ],
            vec![DocumentPurpose::ProofOfIncome, DocumentPurpose::BankStatements],
            ProgressWeights::DOCUMENT_HEAVY,
        )
        .expect("extended blueprint is valid"),
    )
}

pub(super) fn pdf(name: &str) -> FileSelection {
    FileSelection {
        name: name.to_string(),
        size_bytes: 182_400,
        mime_category: MimeCategory::Pdf,
    }
}

pub(super) fn standard_answers() -> Vec<(&'static str, &'static str)> {
    vec![
        ("requested_amount", "15 000 000"),
        ("repayment_term", "48"),
        ("net_monthly_income", "1 200 000"),
        ("existing_obligations", "None"),
        ("credit_purpose", "Vehicle purchase"),
    ]
}

pub(super) fn field(name: &str, value: &str) -> WizardEvent {
    WizardEvent::FieldChanged {
        name: name.to_string(),
        value: value.to_string(),
    }
}

pub(super) fn text_request_events() -> Vec<WizardEvent> {
    vec![
        WizardEvent::MethodChosen(SubmissionMethod::Text),
        field(REQUEST_TEXT_FIELD, "I would like to finance a used car."),
    ]
}

pub(super) fn clarification_events() -> Vec<WizardEvent> {
    let mut events: Vec<WizardEvent> = standard_answers()
        .into_iter()
        .map(|(name, value)| field(name, value))
        .collect();
    events.push(WizardEvent::FileChosen {
        purpose: DocumentPurpose::Identity,
        file: pdf("passport.pdf"),
    });
    events
}

pub(super) fn apply_all(controller: &mut WizardController, events: Vec<WizardEvent>) -> Vec<Effect> {
    events
        .into_iter()
        .flat_map(|event| controller.handle(event))
        .collect()
}

pub(super) fn started(effects: &[Effect]) -> Option<&SubmissionRequest> {
    effects.iter().find_map(|effect| match effect {
        Effect::StartSubmission(request) => Some(request),
        _ => None,
    })
}

/// Controller sitting on the clarification step after one accepted request.
pub(super) fn controller_at_clarification() -> WizardController {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    let effects = controller.handle(WizardEvent::CompleteRequested);
    let ticket = started(&effects).expect("request submission started").ticket;
    controller.handle(WizardEvent::SubmissionResolved {
        ticket,
        outcome: Ok(SubmissionAck::Received),
    });
    assert_eq!(controller.state().step(), WizardStep::Clarification);
    controller
}

pub(super) fn controller_at_report() -> WizardController {
    let mut controller = controller_at_clarification();
    apply_all(&mut controller, clarification_events());
    let effects = controller.handle(WizardEvent::CompleteRequested);
    let ticket = started(&effects).expect("clarification submission started").ticket;
    controller.handle(WizardEvent::SubmissionResolved {
        ticket,
        outcome: Ok(SubmissionAck::Scored(ScoreReport::standard())),
    });
    assert_eq!(controller.state().step(), WizardStep::Report);
    controller
}

pub(super) fn ticket(value: u64) -> SubmissionTicket {
    SubmissionTicket(value)
}

/// Replays queued outcomes, then falls back to the happy path for the step.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<SubmissionAck, SubmissionError>>>,
    requests: Mutex<Vec<SubmissionRequest>>,
}

impl ScriptedGateway {
    pub(super) fn with_outcomes(
        outcomes: impl IntoIterator<Item = Result<SubmissionAck, SubmissionError>>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn requests(&self) -> Vec<SubmissionRequest> {
        self.requests.lock().expect("gateway mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionGateway for ScriptedGateway {
    async fn submit(
        &self,
        request: SubmissionRequest,
        _cancel: CancellationToken,
    ) -> Result<SubmissionAck, SubmissionError> {
        let step = request.step;
        self.requests
            .lock()
            .expect("gateway mutex poisoned")
            .push(request);
        let scripted = self
            .outcomes
            .lock()
            .expect("gateway mutex poisoned")
            .pop_front();
        scripted.unwrap_or(match step {
            WizardStep::Clarification => Ok(SubmissionAck::Scored(ScoreReport::standard())),
            _ => Ok(SubmissionAck::Received),
        })
    }
}

/// Never resolves on its own; records whether the caller cancelled.
#[derive(Default)]
pub(super) struct HangingGateway {
    cancelled: AtomicBool,
}

impl HangingGateway {
    pub(super) fn observed_cancel(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionGateway for HangingGateway {
    async fn submit(
        &self,
        _request: SubmissionRequest,
        cancel: CancellationToken,
    ) -> Result<SubmissionAck, SubmissionError> {
        cancel.cancelled().await;
        self.cancelled.store(true, Ordering::SeqCst);
        Err(SubmissionError::Cancelled)
    }
}

/// Panics inside `submit`, standing in for a backend task that dies.
pub(super) struct PanickingGateway;

#[async_trait]
impl SubmissionGateway for PanickingGateway {
    async fn submit(
        &self,
        _request: SubmissionRequest,
        _cancel: CancellationToken,
    ) -> Result<SubmissionAck, SubmissionError> {
        panic!("scoring backend crashed")
    }
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}
