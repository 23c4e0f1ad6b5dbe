use serde::{Deserialize, Serialize};

use super::domain::DocumentPurpose;
use super::fields::FieldSpec;

/// Field holding the free-text credit request in step 1.
pub const REQUEST_TEXT_FIELD: &str = "request_text";

/// Relative weight of field answers versus uploaded documents in a step's progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressWeights {
    pub fields: f32,
    pub documents: f32,
}

impl ProgressWeights {
    /// Five questions plus a single identity document.
    pub const STANDARD: ProgressWeights = ProgressWeights {
        fields: 0.8,
        documents: 0.2,
    };

    /// Forms collecting several supporting documents.
    pub const DOCUMENT_HEAVY: ProgressWeights = ProgressWeights {
        fields: 0.6,
        documents: 0.4,
    };

    /// Combined progress as a whole percentage.
    ///
    /// `documents_required == 0` contributes nothing rather than a full document share.
    pub fn percent(
        &self,
        field_ratio: f32,
        documents_present: usize,
        documents_required: usize,
    ) -> u8 {
        let document_ratio = if documents_required == 0 {
            0.0
        } else {
            documents_present.min(documents_required) as f32 / documents_required as f32
        };
        let combined = self.fields * field_ratio.clamp(0.0, 1.0) + self.documents * document_ratio;
        (combined * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlueprintError {
    #[error("clarification step must declare at least one question")]
    NoQuestions,
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),
    #[error("progress weights must be finite, non-negative and sum to 1")]
    InvalidWeights,
    #[error("the request slot cannot be a required clarification document")]
    RequestSlotRequired,
}

/// Declarative shape of the wizard: which inputs each step collects and requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWizardBlueprint")]
pub struct WizardBlueprint {
    contact_fields: Vec<FieldSpec>,
    questions: Vec<FieldSpec>,
    required_documents: Vec<DocumentPurpose>,
    weights: ProgressWeights,
}

#[derive(Deserialize)]
struct RawWizardBlueprint {
    #[serde(default)]
    contact_fields: Vec<FieldSpec>,
    questions: Vec<FieldSpec>,
    #[serde(default)]
    required_documents: Vec<DocumentPurpose>,
    weights: ProgressWeights,
}

impl TryFrom<RawWizardBlueprint> for WizardBlueprint {
    type Error = BlueprintError;

    fn try_from(raw: RawWizardBlueprint) -> Result<Self, Self::Error> {
        WizardBlueprint::new(
            raw.contact_fields,
            raw.questions,
            raw.required_documents,
            raw.weights,
        )
    }
}

impl Default for WizardBlueprint {
    fn default() -> Self {
        Self::standard()
    }
}

impl WizardBlueprint {
    /// Canonical credit form: free request, five clarification questions, identity document.
    pub fn standard() -> Self {
        Self {
            contact_fields: Vec::new(),
            questions: standard_questions(),
            required_documents: vec![DocumentPurpose::Identity],
            weights: ProgressWeights::STANDARD,
        }
    }

    pub fn new(
        contact_fields: Vec<FieldSpec>,
        questions: Vec<FieldSpec>,
        required_documents: Vec<DocumentPurpose>,
        weights: ProgressWeights,
    ) -> Result<Self, BlueprintError> {
        if questions.is_empty() {
            return Err(BlueprintError::NoQuestions);
        }

        let mut seen: Vec<&str> = vec![REQUEST_TEXT_FIELD];
        for spec in contact_fields.iter().chain(questions.iter()) {
            if seen.contains(&spec.name.as_str()) {
                return Err(BlueprintError::DuplicateField(spec.name.clone()));
            }
            seen.push(spec.name.as_str());
        }

        let weights_valid = weights.fields.is_finite()
            && weights.documents.is_finite()
            && weights.fields >= 0.0
            && weights.documents >= 0.0
            && ((weights.fields + weights.documents) - 1.0).abs() < 1e-4;
        if !weights_valid {
            return Err(BlueprintError::InvalidWeights);
        }

        if required_documents.contains(&DocumentPurpose::Request) {
            return Err(BlueprintError::RequestSlotRequired);
        }

        let mut documents: Vec<DocumentPurpose> = Vec::with_capacity(required_documents.len());
        for purpose in required_documents {
            if !documents.contains(&purpose) {
                documents.push(purpose);
            }
        }

        Ok(Self {
            contact_fields,
            questions,
            required_documents: documents,
            weights,
        })
    }

    /// Step-1 fields in validation order: contact details first, request text last.
    pub fn submission_fields(&self) -> Vec<FieldSpec> {
        let mut fields = self.contact_fields.clone();
        fields.push(FieldSpec::required(REQUEST_TEXT_FIELD, "Credit request"));
        fields
    }

    pub fn contact_fields(&self) -> &[FieldSpec] {
        &self.contact_fields
    }

    pub fn questions(&self) -> &[FieldSpec] {
        &self.questions
    }

    pub fn required_documents(&self) -> &[DocumentPurpose] {
        &self.required_documents
    }

    pub fn weights(&self) -> ProgressWeights {
        self.weights
    }
}

fn standard_questions() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required(
            "requested_amount",
            "What exact credit amount are you requesting?",
        ),
        FieldSpec::required(
            "repayment_term",
            "What repayment term do you want (in months)?",
        ),
        FieldSpec::required("net_monthly_income", "What is your net monthly income?"),
        FieldSpec::required(
            "existing_obligations",
            "Do you have other credits running? If so, what is the total monthly repayment?",
        ),
        FieldSpec::required("credit_purpose", "What is the main purpose of this credit?"),
    ]
}
