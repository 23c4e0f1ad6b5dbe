use serde::{Deserialize, Serialize};

/// Stage of the linear credit-application wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Submission,
    Clarification,
    Report,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] = [
        WizardStep::Submission,
        WizardStep::Clarification,
        WizardStep::Report,
    ];

    /// 1-based position shown in the progress header.
    pub const fn number(self) -> u8 {
        match self {
            WizardStep::Submission => 1,
            WizardStep::Clarification => 2,
            WizardStep::Report => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            WizardStep::Submission => "Submission",
            WizardStep::Clarification => "Clarifications",
            WizardStep::Report => "Report",
        }
    }

    /// Step reached after a successful submission, `None` once the report is shown.
    pub const fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Submission => Some(WizardStep::Clarification),
            WizardStep::Clarification => Some(WizardStep::Report),
            WizardStep::Report => None,
        }
    }
}

/// How the initial credit request is provided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMethod {
    File,
    Text,
    #[default]
    Unset,
}

impl SubmissionMethod {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionMethod::File => "file",
            SubmissionMethod::Text => "text",
            SubmissionMethod::Unset => "unset",
        }
    }
}

/// Purpose of an uploaded document; each purpose owns one intake slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentPurpose {
    Request,
    Identity,
    ProofOfIncome,
    BankStatements,
}

impl DocumentPurpose {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentPurpose::Request => "credit request",
            DocumentPurpose::Identity => "identity document",
            DocumentPurpose::ProofOfIncome => "proof of income",
            DocumentPurpose::BankStatements => "bank statements",
        }
    }
}
