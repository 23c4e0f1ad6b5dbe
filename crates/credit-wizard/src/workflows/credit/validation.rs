//! Per-step validation. Checks run in a fixed order and stop at the first failure.

use serde::Serialize;

use super::blueprint::REQUEST_TEXT_FIELD;
use super::domain::{SubmissionMethod, WizardStep};
use super::forms::{ClarificationForm, RequestForm};

/// User-correctable reason a step cannot be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("no submission method selected")]
    MethodNotChosen,
    #[error("missing {field}")]
    MissingContact { field: String },
    #[error("no file selected")]
    NoFileSelected,
    #[error("empty request text")]
    EmptyRequestText,
    #[error("missing required fields")]
    MissingRequiredFields,
    #[error("missing required documents")]
    MissingRequiredDocuments,
    #[error("the report step has nothing to submit")]
    NothingToSubmit,
}

/// Validate the step currently shown.
pub fn validate(
    step: WizardStep,
    request: &RequestForm,
    clarification: &ClarificationForm,
) -> Result<(), ValidationError> {
    match step {
        WizardStep::Submission => validate_submission(request),
        WizardStep::Clarification => validate_clarification(clarification),
        WizardStep::Report => Err(ValidationError::NothingToSubmit),
    }
}

/// Contact fields in declaration order, then the method-specific input.
pub fn validate_submission(form: &RequestForm) -> Result<(), ValidationError> {
    if form.method == SubmissionMethod::Unset {
        return Err(ValidationError::MethodNotChosen);
    }

    if let Some(entry) = form
        .fields
        .entries()
        .iter()
        .filter(|entry| entry.name != REQUEST_TEXT_FIELD)
        .find(|entry| entry.required && !entry.is_filled())
    {
        return Err(ValidationError::MissingContact {
            field: entry.name.clone(),
        });
    }

    match form.method {
        SubmissionMethod::File if form.file.is_empty() => Err(ValidationError::NoFileSelected),
        SubmissionMethod::Text if form.request_text().trim().is_empty() => {
            Err(ValidationError::EmptyRequestText)
        }
        _ => Ok(()),
    }
}

/// Required answers first, then required documents; neither check itemizes what is missing.
pub fn validate_clarification(form: &ClarificationForm) -> Result<(), ValidationError> {
    if !form.fields.missing_required().is_empty() {
        return Err(ValidationError::MissingRequiredFields);
    }

    if !form.documents.missing().is_empty() {
        return Err(ValidationError::MissingRequiredDocuments);
    }

    Ok(())
}
