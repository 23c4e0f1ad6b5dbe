use super::{CreditStatus, ScoreReport, MAX_TOTAL_SCORE};
use serde::Serialize;

/// Colour band applied to overall and per-criterion scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Warning,
    Poor,
}

impl ScoreBand {
    pub const fn for_score(score: u32) -> Self {
        if score >= 80 {
            Self::Good
        } else if score >= 60 {
            Self::Warning
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    Success,
    Danger,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBadge {
    pub status: CreditStatus,
    pub variant: BadgeVariant,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionView {
    pub name: String,
    pub score: u32,
    pub max_score: u32,
    pub fill_pct: f32,
    pub band: ScoreBand,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub badge: StatusBadge,
    pub total_score: u8,
    pub max_total_score: u8,
    pub total_band: ScoreBand,
    pub gauge_sweep_degrees: f32,
    pub headline: &'static str,
    pub next_steps: &'static str,
    pub criteria: Vec<CriterionView>,
}

/// Project a report into the values the presentation layer draws.
pub fn render(report: &ScoreReport) -> ReportView {
    let status = report.status();
    let total = report.total_score();

    let criteria = report
        .criteria()
        .iter()
        .map(|criterion| CriterionView {
            name: criterion.name.clone(),
            score: criterion.score,
            max_score: criterion.max_score,
            fill_pct: if criterion.max_score == 0 {
                0.0
            } else {
                criterion.score as f32 / criterion.max_score as f32 * 100.0
            },
            band: ScoreBand::for_score(criterion.score),
            comment: criterion.comment.clone(),
        })
        .collect();

    ReportView {
        badge: badge_for(status),
        total_score: total,
        max_total_score: MAX_TOTAL_SCORE,
        total_band: ScoreBand::for_score(u32::from(total)),
        gauge_sweep_degrees: f32::from(total) / f32::from(MAX_TOTAL_SCORE) * 360.0,
        headline: headline_for(status),
        next_steps: next_steps_for(status),
        criteria,
    }
}

fn badge_for(status: CreditStatus) -> StatusBadge {
    let variant = match status {
        CreditStatus::Approved => BadgeVariant::Success,
        CreditStatus::Rejected => BadgeVariant::Danger,
        CreditStatus::Review => BadgeVariant::Warning,
    };
    StatusBadge {
        status,
        variant,
        label: status.label(),
    }
}

fn headline_for(status: CreditStatus) -> &'static str {
    match status {
        CreditStatus::Approved => "Congratulations! Your credit application has been approved.",
        CreditStatus::Rejected => "Your credit application could not be approved at this stage.",
        CreditStatus::Review => "Your application needs an additional review by our teams.",
    }
}

fn next_steps_for(status: CreditStatus) -> &'static str {
    match status {
        CreditStatus::Approved => {
            "An advisor will contact you within 48 hours to finalise your file and offer the best terms."
        }
        CreditStatus::Rejected => {
            "Review the reasons in the detailed analysis above. You may submit a new application once these points improve."
        }
        CreditStatus::Review => {
            "Additional information is needed to finalise the review of your file. An advisor will contact you shortly."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Criterion;
    use super::*;

    #[test]
    fn band_thresholds_follow_score_boundaries() {
        assert_eq!(ScoreBand::for_score(100), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(80), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(79), ScoreBand::Warning);
        assert_eq!(ScoreBand::for_score(60), ScoreBand::Warning);
        assert_eq!(ScoreBand::for_score(59), ScoreBand::Poor);
        assert_eq!(ScoreBand::for_score(0), ScoreBand::Poor);
    }

    #[test]
    fn render_standard_report() {
        let view = render(&ScoreReport::standard());
        assert_eq!(view.badge.variant, BadgeVariant::Success);
        assert_eq!(view.badge.label, "Approved");
        assert_eq!(view.total_band, ScoreBand::Warning);
        assert!((view.gauge_sweep_degrees - 280.8).abs() < 1e-3);
        let bands: Vec<ScoreBand> = view.criteria.iter().map(|c| c.band).collect();
        assert_eq!(
            bands,
            vec![
                ScoreBand::Good,
                ScoreBand::Warning,
                ScoreBand::Good,
                ScoreBand::Warning
            ]
        );
        assert!(view.headline.contains("approved"));
    }

    #[test]
    fn render_handles_zero_maximum_and_rejections() {
        let report = ScoreReport::new(
            CreditStatus::Rejected,
            35,
            vec![
                Criterion::new("Collateral", 0, 0, "No collateral offered."),
                Criterion::new("Debt ratio", 5, 20, "High monthly obligations."),
            ],
        )
        .expect("valid report");

        let view = render(&report);
        assert_eq!(view.badge.variant, BadgeVariant::Danger);
        assert_eq!(view.total_band, ScoreBand::Poor);
        assert_eq!(view.criteria[0].fill_pct, 0.0);
        assert_eq!(view.criteria[1].fill_pct, 25.0);
        assert_eq!(view.criteria[1].band, ScoreBand::Poor);
    }
}
