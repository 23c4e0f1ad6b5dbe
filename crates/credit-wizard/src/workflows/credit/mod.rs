//! Three-step credit-application wizard: request submission, clarifications, scoring report.

pub mod blueprint;
pub mod cancellation;
pub mod controller;
pub mod domain;
pub mod fields;
pub mod forms;
pub mod gateway;
pub mod intake;
pub mod notify;
pub mod report;
pub mod router;
pub mod session;
pub mod snapshot;
pub mod validation;

#[cfg(test)]
mod tests;

pub use blueprint::{BlueprintError, ProgressWeights, WizardBlueprint, REQUEST_TEXT_FIELD};
pub use cancellation::{CancellationSource, CancellationToken};
pub use controller::{
    transition, Effect, Transition, WizardController, WizardEvent, WizardState,
    CLARIFICATIONS_ACCEPTED_MESSAGE, DOWNLOAD_STARTED_MESSAGE, REPORT_UNAVAILABLE_MESSAGE,
    REQUEST_ACCEPTED_MESSAGE,
};
pub use domain::{DocumentPurpose, SubmissionMethod, WizardStep};
pub use fields::{FieldEntry, FieldRegistry, FieldSpec};
pub use forms::{ClarificationForm, RequestForm};
pub use gateway::{
    SimulatedGateway, SubmissionAck, SubmissionError, SubmissionGateway, SubmissionPayload,
    SubmissionRequest, SubmissionTicket,
};
pub use intake::{AllowList, DocumentSlots, FileCandidate, FileIntake, FileSelection, MimeCategory};
pub use notify::{
    Notification, NotificationBuffer, NotificationKind, NotificationSink, TracingNotifier,
};
pub use report::{
    export_csv, render, BadgeVariant, CreditStatus, Criterion, CriterionView, ReportError,
    ReportExportError, ReportView, ScoreBand, ScoreReport, StatusBadge,
};
pub use router::{wizard_router, HostedSession, Intent, SessionId, SessionRegistry, SessionView};
pub use session::WizardSession;
pub use snapshot::{DocumentView, WizardSnapshot};
pub use validation::{validate, ValidationError};
