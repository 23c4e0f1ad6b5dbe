use serde::Serialize;

use super::domain::{DocumentPurpose, SubmissionMethod, WizardStep};
use super::fields::FieldEntry;
use super::intake::FileSelection;
use super::report::ReportView;

/// Upload slot as shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub purpose: DocumentPurpose,
    pub label: &'static str,
    pub file: Option<FileSelection>,
}

/// Read-only projection of the wizard for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub step_number: u8,
    pub step_label: &'static str,
    pub method: SubmissionMethod,
    pub progress_pct: u8,
    pub fields: Vec<FieldEntry>,
    pub documents: Vec<DocumentView>,
    pub submitting: bool,
    pub can_retry: bool,
    pub last_error: Option<String>,
    pub report: Option<ReportView>,
}

impl WizardSnapshot {
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    pub fn document(&self, purpose: DocumentPurpose) -> Option<&DocumentView> {
        self.documents.iter().find(|view| view.purpose == purpose)
    }
}
