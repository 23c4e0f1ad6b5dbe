use super::views::ScoreBand;
use super::ScoreReport;

#[derive(Debug, thiserror::Error)]
pub enum ReportExportError {
    #[error("failed to write report row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush report: {0}")]
    Flush(String),
}

/// Render the report as CSV: a summary row followed by one row per criterion.
pub fn export_csv(report: &ScoreReport) -> Result<String, ReportExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["criterion", "score", "max_score", "band", "comment"])?;

    let total = u32::from(report.total_score());
    let total_text = total.to_string();
    let max_text = super::MAX_TOTAL_SCORE.to_string();
    writer.write_record([
        "Overall",
        total_text.as_str(),
        max_text.as_str(),
        ScoreBand::for_score(total).label(),
        report.status().label(),
    ])?;

    for criterion in report.criteria() {
        let score = criterion.score.to_string();
        let max_score = criterion.max_score.to_string();
        writer.write_record([
            criterion.name.as_str(),
            score.as_str(),
            max_score.as_str(),
            ScoreBand::for_score(criterion.score).label(),
            criterion.comment.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ReportExportError::Flush(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ReportExportError::Flush(err.to_string()))
}
