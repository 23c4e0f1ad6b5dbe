use super::blueprint::{WizardBlueprint, REQUEST_TEXT_FIELD};
use super::domain::SubmissionMethod;
use super::fields::FieldRegistry;
use super::intake::{DocumentSlots, FileIntake};

/// Step-1 inputs: contact details, the chosen method and its request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestForm {
    pub method: SubmissionMethod,
    pub fields: FieldRegistry,
    pub file: FileIntake,
}

impl RequestForm {
    pub fn new(blueprint: &WizardBlueprint) -> Self {
        Self {
            method: SubmissionMethod::Unset,
            fields: FieldRegistry::from_specs(&blueprint.submission_fields()),
            file: FileIntake::default(),
        }
    }

    pub fn request_text(&self) -> &str {
        self.fields.value(REQUEST_TEXT_FIELD).unwrap_or_default()
    }

    /// Whether the input belonging to the selected method is present.
    pub fn method_input_present(&self) -> bool {
        match self.method {
            SubmissionMethod::File => !self.file.is_empty(),
            SubmissionMethod::Text => !self.request_text().trim().is_empty(),
            SubmissionMethod::Unset => false,
        }
    }

    /// Satisfied contact fields plus the method input, as a whole percentage.
    pub fn progress_percent(&self) -> u8 {
        if self.method == SubmissionMethod::Unset {
            return 0;
        }

        let contacts = self
            .fields
            .entries()
            .iter()
            .filter(|entry| entry.name != REQUEST_TEXT_FIELD);
        let (filled, total) = contacts.fold((0usize, 0usize), |(filled, total), entry| {
            (filled + usize::from(entry.is_filled()), total + 1)
        });
        let satisfied = filled + usize::from(self.method_input_present());
        let ratio = satisfied as f32 / (total + 1) as f32;
        (ratio * 100.0).round() as u8
    }

    pub fn clear(&mut self) {
        self.method = SubmissionMethod::Unset;
        self.fields.clear_values();
        self.file.clear();
    }
}

/// Step-2 inputs: clarification answers and supporting documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarificationForm {
    pub fields: FieldRegistry,
    pub documents: DocumentSlots,
}

impl ClarificationForm {
    pub fn new(blueprint: &WizardBlueprint) -> Self {
        Self {
            fields: FieldRegistry::from_specs(blueprint.questions()),
            documents: DocumentSlots::new(blueprint.required_documents().iter().copied()),
        }
    }

    pub fn progress_percent(&self, blueprint: &WizardBlueprint) -> u8 {
        blueprint.weights().percent(
            self.fields.completion_ratio(),
            self.documents.present_count(),
            self.documents.len(),
        )
    }

    pub fn clear(&mut self) {
        self.fields.clear_values();
        self.documents.clear_all();
    }
}
