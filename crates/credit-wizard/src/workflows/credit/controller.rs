//! Wizard state machine.
//!
//! [`transition`] is a pure function from a state and an event to the next state plus the effects
//! the caller must run (notifications, starting or cancelling a submission). Nothing here touches a
//! clock, a socket or a task; [`super::session::WizardSession`] executes the effects.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::blueprint::{WizardBlueprint, REQUEST_TEXT_FIELD};
use super::domain::{DocumentPurpose, SubmissionMethod, WizardStep};
use super::forms::{ClarificationForm, RequestForm};
use super::gateway::{
    SubmissionAck, SubmissionError, SubmissionPayload, SubmissionRequest, SubmissionTicket,
};
use super::intake::FileSelection;
use super::notify::Notification;
use super::report::{self, ScoreReport};
use super::snapshot::{DocumentView, WizardSnapshot};
use super::validation::{self, ValidationError};

pub const REQUEST_ACCEPTED_MESSAGE: &str = "Your request has been accepted for analysis!";
pub const CLARIFICATIONS_ACCEPTED_MESSAGE: &str = "Information submitted successfully!";
pub const DOWNLOAD_STARTED_MESSAGE: &str = "Report download started...";
pub const REPORT_UNAVAILABLE_MESSAGE: &str = "scoring report unavailable";

/// Intent or completion signal fed into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    MethodChosen(SubmissionMethod),
    FieldChanged { name: String, value: String },
    FileChosen {
        purpose: DocumentPurpose,
        file: FileSelection,
    },
    FileRemoved { purpose: DocumentPurpose },
    CompleteRequested,
    SubmissionResolved {
        ticket: SubmissionTicket,
        outcome: Result<SubmissionAck, SubmissionError>,
    },
    RetryRequested,
    CancelRequested,
    DownloadRequested,
    ResetRequested,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify(Notification),
    StartSubmission(SubmissionRequest),
    CancelSubmission(SubmissionTicket),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: WizardState,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSubmission {
    ticket: SubmissionTicket,
    payload: SubmissionPayload,
}

/// Complete wizard state for one session.
#[derive(Debug, Clone)]
pub struct WizardState {
    blueprint: Arc<WizardBlueprint>,
    step: WizardStep,
    request: RequestForm,
    clarification: ClarificationForm,
    in_flight: Option<PendingSubmission>,
    retry: Option<SubmissionPayload>,
    next_ticket: u64,
    report: Option<ScoreReport>,
    last_error: Option<String>,
}

impl WizardState {
    pub fn new(blueprint: Arc<WizardBlueprint>) -> Self {
        let request = RequestForm::new(&blueprint);
        let clarification = ClarificationForm::new(&blueprint);
        Self {
            blueprint,
            step: WizardStep::Submission,
            request,
            clarification,
            in_flight: None,
            retry: None,
            next_ticket: 1,
            report: None,
            last_error: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn blueprint(&self) -> &WizardBlueprint {
        &self.blueprint
    }

    pub fn method(&self) -> SubmissionMethod {
        self.request.method
    }

    pub fn request(&self) -> &RequestForm {
        &self.request
    }

    pub fn clarification(&self) -> &ClarificationForm {
        &self.clarification
    }

    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    pub fn in_flight(&self) -> Option<SubmissionTicket> {
        self.in_flight.as_ref().map(|pending| pending.ticket)
    }

    pub fn can_retry(&self) -> bool {
        self.in_flight.is_none() && self.retry.is_some()
    }

    /// Reason of the last failed submission, cleared by the next start, advance or reset.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Progress of the current step as a whole percentage.
    pub fn progress_percent(&self) -> u8 {
        match self.step {
            WizardStep::Submission => self.request.progress_percent(),
            WizardStep::Clarification => self.clarification.progress_percent(&self.blueprint),
            WizardStep::Report => 100,
        }
    }

    pub fn completion_ratio(&self) -> f32 {
        f32::from(self.progress_percent()) / 100.0
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let (fields, documents) = match self.step {
            WizardStep::Submission => {
                let documents = vec![DocumentView {
                    purpose: DocumentPurpose::Request,
                    label: DocumentPurpose::Request.label(),
                    file: self.request.file.current().cloned(),
                }];
                (self.request.fields.entries().to_vec(), documents)
            }
            WizardStep::Clarification => {
                let documents = self
                    .clarification
                    .documents
                    .iter()
                    .map(|(purpose, file)| DocumentView {
                        purpose,
                        label: purpose.label(),
                        file: file.cloned(),
                    })
                    .collect();
                (self.clarification.fields.entries().to_vec(), documents)
            }
            WizardStep::Report => (Vec::new(), Vec::new()),
        };

        WizardSnapshot {
            step: self.step,
            step_number: self.step.number(),
            step_label: self.step.label(),
            method: self.request.method,
            progress_pct: self.progress_percent(),
            fields,
            documents,
            submitting: self.in_flight.is_some(),
            can_retry: self.can_retry(),
            last_error: self.last_error.clone(),
            report: self.report.as_ref().map(report::render),
        }
    }

    pub(crate) fn apply(&mut self, event: WizardEvent) -> Vec<Effect> {
        match event {
            WizardEvent::MethodChosen(method) => self.choose_method(method),
            WizardEvent::FieldChanged { name, value } => self.change_field(&name, value),
            WizardEvent::FileChosen { purpose, file } => self.choose_file(purpose, Some(file)),
            WizardEvent::FileRemoved { purpose } => self.choose_file(purpose, None),
            WizardEvent::CompleteRequested => self.complete(),
            WizardEvent::SubmissionResolved { ticket, outcome } => self.resolve(ticket, outcome),
            WizardEvent::RetryRequested => self.retry(),
            WizardEvent::CancelRequested => self.cancel(),
            WizardEvent::DownloadRequested => self.download(),
            WizardEvent::ResetRequested => self.reset(),
        }
    }

    fn inputs_locked(&self, what: &str) -> bool {
        if self.in_flight.is_some() {
            debug!(step = ?self.step, what, "input ignored while a submission is in flight");
            return true;
        }
        false
    }

    fn input_changed(&mut self) {
        self.retry = None;
    }

    fn choose_method(&mut self, method: SubmissionMethod) -> Vec<Effect> {
        if self.step != WizardStep::Submission || self.inputs_locked("method") {
            return Vec::new();
        }
        if self.request.method != method {
            self.request.method = method;
            self.input_changed();
        }
        Vec::new()
    }

    fn change_field(&mut self, name: &str, value: String) -> Vec<Effect> {
        if self.inputs_locked(name) {
            return Vec::new();
        }
        let applied = match self.step {
            WizardStep::Submission => self.request.fields.set_value(name, value),
            WizardStep::Clarification => self.clarification.fields.set_value(name, value),
            WizardStep::Report => false,
        };
        if applied {
            self.input_changed();
        } else {
            debug!(step = ?self.step, field = name, "ignoring unknown field");
        }
        Vec::new()
    }

    fn choose_file(&mut self, purpose: DocumentPurpose, file: Option<FileSelection>) -> Vec<Effect> {
        if self.inputs_locked(purpose.label()) {
            return Vec::new();
        }
        let applied = match (self.step, purpose, file) {
            (WizardStep::Submission, DocumentPurpose::Request, Some(file)) => {
                self.request.file.set_file(file);
                true
            }
            (WizardStep::Submission, DocumentPurpose::Request, None) => {
                self.request.file.clear().is_some()
            }
            (WizardStep::Clarification, purpose, Some(file))
                if purpose != DocumentPurpose::Request =>
            {
                self.clarification.documents.set_file(purpose, file)
            }
            (WizardStep::Clarification, purpose, None) if purpose != DocumentPurpose::Request => {
                self.clarification.documents.clear(purpose)
            }
            _ => false,
        };
        if applied {
            self.input_changed();
        } else {
            debug!(step = ?self.step, ?purpose, "file event does not apply to this step");
        }
        Vec::new()
    }

    fn complete(&mut self) -> Vec<Effect> {
        if self.step == WizardStep::Report {
            return Vec::new();
        }
        if let Some(pending) = &self.in_flight {
            debug!(ticket = %pending.ticket, "completion ignored, submission already in flight");
            return Vec::new();
        }
        if self.step == WizardStep::Submission && self.request.method == SubmissionMethod::Unset {
            debug!("completion ignored, no submission method chosen");
            return Vec::new();
        }

        if let Err(error) = validation::validate(self.step, &self.request, &self.clarification) {
            info!(step = ?self.step, reason = %error, "step validation failed");
            return vec![Effect::Notify(Notification::error(user_message(&error, &self.blueprint)))];
        }

        let payload = self.capture_payload();
        vec![self.start(payload)]
    }

    fn start(&mut self, payload: SubmissionPayload) -> Effect {
        let ticket = SubmissionTicket(self.next_ticket);
        self.next_ticket += 1;
        self.last_error = None;
        self.retry = None;
        self.in_flight = Some(PendingSubmission {
            ticket,
            payload: payload.clone(),
        });
        info!(%ticket, step = ?self.step, "submission started");
        Effect::StartSubmission(SubmissionRequest {
            ticket,
            step: self.step,
            payload,
        })
    }

    fn capture_payload(&self) -> SubmissionPayload {
        match self.step {
            WizardStep::Submission => {
                let contact = self
                    .request
                    .fields
                    .entries()
                    .iter()
                    .filter(|entry| entry.name != REQUEST_TEXT_FIELD)
                    .map(|entry| (entry.name.clone(), entry.value.trim().to_string()))
                    .collect();
                let (request_text, file) = match self.request.method {
                    SubmissionMethod::Text => {
                        (Some(self.request.request_text().trim().to_string()), None)
                    }
                    SubmissionMethod::File => (None, self.request.file.current().cloned()),
                    SubmissionMethod::Unset => (None, None),
                };
                SubmissionPayload::Request {
                    method: self.request.method,
                    contact,
                    request_text,
                    file,
                }
            }
            _ => {
                let answers = self
                    .clarification
                    .fields
                    .entries()
                    .iter()
                    .map(|entry| (entry.name.clone(), entry.value.trim().to_string()))
                    .collect();
                let documents: BTreeMap<DocumentPurpose, FileSelection> = self
                    .clarification
                    .documents
                    .iter()
                    .filter_map(|(purpose, file)| file.map(|file| (purpose, file.clone())))
                    .collect();
                SubmissionPayload::Clarification { answers, documents }
            }
        }
    }

    fn resolve(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<SubmissionAck, SubmissionError>,
    ) -> Vec<Effect> {
        let pending = match self.in_flight.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                debug!(%ticket, "ignoring stale submission resolution");
                self.in_flight = other;
                return Vec::new();
            }
        };

        match (self.step, outcome) {
            (WizardStep::Submission, Ok(_)) => {
                info!(%ticket, "request accepted, moving to clarifications");
                self.request.clear();
                self.advance();
                vec![Effect::Notify(Notification::success(REQUEST_ACCEPTED_MESSAGE))]
            }
            (WizardStep::Clarification, Ok(SubmissionAck::Scored(report))) => {
                info!(%ticket, status = ?report.status(), score = report.total_score(), "clarifications scored");
                self.clarification.clear();
                self.report = Some(report);
                self.advance();
                vec![Effect::Notify(Notification::success(
                    CLARIFICATIONS_ACCEPTED_MESSAGE,
                ))]
            }
            (WizardStep::Clarification, Ok(SubmissionAck::Received)) => {
                warn!(%ticket, "scoring backend returned no report");
                self.fail_submission(pending.payload, REPORT_UNAVAILABLE_MESSAGE.to_string())
            }
            (_, Err(SubmissionError::Cancelled)) => {
                debug!(%ticket, "submission cancelled");
                Vec::new()
            }
            (_, Err(error)) => {
                warn!(%ticket, %error, "submission failed");
                self.fail_submission(pending.payload, error.to_string())
            }
            (WizardStep::Report, Ok(_)) => Vec::new(),
        }
    }

    fn fail_submission(&mut self, payload: SubmissionPayload, reason: String) -> Vec<Effect> {
        self.retry = Some(payload);
        let notification = Notification::error(reason.clone());
        self.last_error = Some(reason);
        vec![Effect::Notify(notification)]
    }

    fn advance(&mut self) {
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        self.last_error = None;
        self.retry = None;
    }

    fn retry(&mut self) -> Vec<Effect> {
        if self.in_flight.is_some() {
            return Vec::new();
        }
        match self.retry.take() {
            Some(payload) => {
                info!(step = ?self.step, "retrying submission without re-validation");
                vec![self.start(payload)]
            }
            None => Vec::new(),
        }
    }

    fn cancel(&mut self) -> Vec<Effect> {
        match self.in_flight.take() {
            Some(pending) => {
                info!(ticket = %pending.ticket, "submission cancelled by user");
                vec![Effect::CancelSubmission(pending.ticket)]
            }
            None => Vec::new(),
        }
    }

    fn download(&mut self) -> Vec<Effect> {
        match (self.step, &self.report) {
            (WizardStep::Report, Some(_)) => {
                vec![Effect::Notify(Notification::success(DOWNLOAD_STARTED_MESSAGE))]
            }
            _ => Vec::new(),
        }
    }

    fn reset(&mut self) -> Vec<Effect> {
        let effects = self.cancel();
        info!(from = ?self.step, "wizard reset");
        self.step = WizardStep::Submission;
        self.request.clear();
        self.clarification.clear();
        self.report = None;
        self.retry = None;
        self.last_error = None;
        effects
    }
}

/// Toast text for a validation failure. Contact fields are named by their blueprint label.
pub fn user_message(error: &ValidationError, blueprint: &WizardBlueprint) -> String {
    match error {
        ValidationError::MethodNotChosen => "Please choose how to submit your request".to_string(),
        ValidationError::MissingContact { field } => {
            let label = blueprint
                .contact_fields()
                .iter()
                .find(|spec| spec.name == *field)
                .map_or(field.as_str(), |spec| spec.label.as_str());
            format!("Please provide your {}", label.to_lowercase())
        }
        ValidationError::NoFileSelected => "Please upload a file before submitting".to_string(),
        ValidationError::EmptyRequestText => {
            "Please describe your request before submitting".to_string()
        }
        ValidationError::MissingRequiredFields => "Please answer all the questions".to_string(),
        ValidationError::MissingRequiredDocuments => {
            "Please provide the required documents".to_string()
        }
        ValidationError::NothingToSubmit => error.to_string(),
    }
}

/// Pure transition: the input state is left untouched.
pub fn transition(state: &WizardState, event: WizardEvent) -> Transition {
    let mut next = state.clone();
    let effects = next.apply(event);
    Transition {
        state: next,
        effects,
    }
}

/// Owner of the canonical wizard state.
#[derive(Debug, Clone)]
pub struct WizardController {
    state: WizardState,
}

impl WizardController {
    pub fn new(blueprint: Arc<WizardBlueprint>) -> Self {
        Self {
            state: WizardState::new(blueprint),
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn handle(&mut self, event: WizardEvent) -> Vec<Effect> {
        self.state.apply(event)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        self.state.snapshot()
    }
}
