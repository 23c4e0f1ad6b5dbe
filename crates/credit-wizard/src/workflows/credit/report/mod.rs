//! Scoring report shown in the final step and its presentation projection.

mod export;
pub mod views;

pub use export::{export_csv, ReportExportError};
pub use views::{render, BadgeVariant, CriterionView, ReportView, ScoreBand, StatusBadge};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Highest overall score a report can carry.
pub const MAX_TOTAL_SCORE: u8 = 100;

/// Categorical credit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Approved,
    Rejected,
    Review,
}

impl CreditStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CreditStatus::Approved => "Approved",
            CreditStatus::Rejected => "Rejected",
            CreditStatus::Review => "Needs review",
        }
    }
}

/// Named sub-score contributing to the overall report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub score: u32,
    pub max_score: u32,
    pub comment: String,
}

impl Criterion {
    pub fn new(
        name: impl Into<String>,
        score: u32,
        max_score: u32,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            score,
            max_score,
            comment: comment.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("total score {0} exceeds {MAX_TOTAL_SCORE}")]
    TotalOutOfRange(u32),
    #[error("criterion `{name}` scores {score} above its maximum {max_score}")]
    CriterionOutOfRange {
        name: String,
        score: u32,
        max_score: u32,
    },
    #[error("unable to read report file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("report file {path} is not a valid score report: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Immutable scoring result produced when the clarification step completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreReport")]
pub struct ScoreReport {
    status: CreditStatus,
    total_score: u8,
    criteria: Vec<Criterion>,
}

#[derive(Deserialize)]
struct RawScoreReport {
    status: CreditStatus,
    total_score: u32,
    criteria: Vec<Criterion>,
}

impl TryFrom<RawScoreReport> for ScoreReport {
    type Error = ReportError;

    fn try_from(raw: RawScoreReport) -> Result<Self, Self::Error> {
        ScoreReport::new(raw.status, raw.total_score, raw.criteria)
    }
}

impl ScoreReport {
    pub fn new(
        status: CreditStatus,
        total_score: u32,
        criteria: Vec<Criterion>,
    ) -> Result<Self, ReportError> {
        if total_score > u32::from(MAX_TOTAL_SCORE) {
            return Err(ReportError::TotalOutOfRange(total_score));
        }

        if let Some(criterion) = criteria
            .iter()
            .find(|criterion| criterion.score > criterion.max_score)
        {
            return Err(ReportError::CriterionOutOfRange {
                name: criterion.name.clone(),
                score: criterion.score,
                max_score: criterion.max_score,
            });
        }

        Ok(Self {
            status,
            total_score: total_score as u8,
            criteria,
        })
    }

    /// Static demonstration report served by the simulated scoring backend.
    pub fn standard() -> Self {
        Self {
            status: CreditStatus::Approved,
            total_score: 78,
            criteria: vec![
                Criterion::new(
                    "Repayment capacity",
                    85,
                    100,
                    "Monthly income covers the loan and current expenses.",
                ),
                Criterion::new(
                    "Credit history",
                    72,
                    100,
                    "Previous credits handled well, a few minor late payments.",
                ),
                Criterion::new(
                    "Employment stability",
                    90,
                    100,
                    "Stable position for more than 5 years.",
                ),
                Criterion::new(
                    "Debt ratio",
                    65,
                    100,
                    "Current debt level is acceptable but should be monitored.",
                ),
            ],
        }
    }

    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self, ReportError> {
        serde_json::from_reader(reader).map_err(|source| ReportError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let file = File::open(path).map_err(|source| ReportError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), &display)
    }

    pub fn status(&self) -> CreditStatus {
        self.status
    }

    pub fn total_score(&self) -> u8 {
        self.total_score
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }
}
