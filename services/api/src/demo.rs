use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use clap::{Args, ValueEnum};
use credit_wizard::config::{AppConfig, WizardConfig};
use credit_wizard::error::AppError;
use credit_wizard::telemetry;
use credit_wizard::workflows::credit::{
    export_csv, render, AllowList, DocumentPurpose, FileCandidate, ReportView, SimulatedGateway,
    SubmissionMethod, TracingNotifier, WizardBlueprint, WizardEvent, WizardSession,
    WizardSnapshot, REQUEST_TEXT_FIELD,
};
use serde::Serialize;

use crate::infra::{load_report, parse_millis};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoMethod {
    #[default]
    Text,
    File,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated processing time for the credit request, in milliseconds
    #[arg(long, value_parser = parse_millis)]
    pub(crate) request_delay_ms: Option<Duration>,
    /// Simulated scoring time for the clarifications, in milliseconds
    #[arg(long, value_parser = parse_millis)]
    pub(crate) clarification_delay_ms: Option<Duration>,
    /// How the sample applicant submits the request
    #[arg(long, value_enum, default_value_t = DemoMethod::Text)]
    pub(crate) method: DemoMethod,
    /// JSON score report to hand out instead of the configured one
    #[arg(long)]
    pub(crate) report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// JSON score report to render (defaults to WIZARD_REPORT_PATH, then the built-in report)
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub(crate) format: ReportFormat,
    /// Write to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ReportDocument {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    view: ReportView,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        path,
        format,
        output,
    } = args;

    let mut wizard = AppConfig::load()?.wizard;
    if path.is_some() {
        wizard.report_path = path;
    }
    let report = load_report(&wizard)?;

    let rendered = match format {
        ReportFormat::Text => render_text(&render(&report)),
        ReportFormat::Json => {
            let document = ReportDocument {
                generated_at: Utc::now(),
                view: render(&report),
            };
            serde_json::to_string_pretty(&document)
                .map_err(|err| AppError::Io(std::io::Error::other(err)))?
        }
        ReportFormat::Csv => export_csv(&report)?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        request_delay_ms,
        clarification_delay_ms,
        method,
        report,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut wizard = WizardConfig {
        request_delay: request_delay_ms.unwrap_or(config.wizard.request_delay),
        clarification_delay: clarification_delay_ms.unwrap_or(config.wizard.clarification_delay),
        report_path: config.wizard.report_path.clone(),
        session_ttl: config.wizard.session_ttl,
    };
    if report.is_some() {
        wizard.report_path = report;
    }
    let gateway = Arc::new(SimulatedGateway::from_config(&wizard, load_report(&wizard)?));
    let mut session = WizardSession::new(
        Arc::new(WizardBlueprint::standard()),
        gateway,
        Arc::new(TracingNotifier),
    );
    let allow_list = AllowList::documents();

    println!(
        "Credit application wizard demo ({})",
        Local::now().format("%Y-%m-%d %H:%M")
    );

    println!("\nStep 1: submit the credit request");
    match method {
        DemoMethod::Text => {
            session.dispatch(WizardEvent::MethodChosen(SubmissionMethod::Text));
            session.dispatch(WizardEvent::FieldChanged {
                name: REQUEST_TEXT_FIELD.to_string(),
                value: "I need 15,000,000 to buy a delivery van for my bakery.".to_string(),
            });
        }
        DemoMethod::File => {
            session.dispatch(WizardEvent::MethodChosen(SubmissionMethod::File));
            let candidate = FileCandidate::new("credit-request.pdf", 184_320);
            if let Some(file) = allow_list.screen(&candidate) {
                session.dispatch(WizardEvent::FileChosen {
                    purpose: DocumentPurpose::Request,
                    file,
                });
            }
        }
    }
    print_progress(&session.snapshot());
    session.dispatch(WizardEvent::CompleteRequested);
    println!("- Submitted, waiting {} ms", wizard.request_delay.as_millis());
    session.settle().await;
    print_progress(&session.snapshot());

    println!("\nStep 2: answer the clarification questions");
    let answers = [
        ("requested_amount", "15 000 000"),
        ("repayment_term", "48"),
        ("net_monthly_income", "1 200 000"),
        ("existing_obligations", "Micro-loan, 60 000 per month"),
        ("credit_purpose", "Delivery van for the bakery"),
    ];
    for (name, value) in answers {
        session.dispatch(WizardEvent::FieldChanged {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    print_progress(&session.snapshot());
    println!("- Trying to continue without an identity document");
    session.dispatch(WizardEvent::CompleteRequested);
    print_progress(&session.snapshot());

    let identity =
        FileCandidate::new("national-id.pdf", 412_004).with_declared_type("application/pdf");
    if let Some(file) = allow_list.screen(&identity) {
        println!("- Attached {} ({} KiB)", file.name, file.size_kib());
        session.dispatch(WizardEvent::FileChosen {
            purpose: DocumentPurpose::Identity,
            file,
        });
    }
    print_progress(&session.snapshot());
    session.dispatch(WizardEvent::CompleteRequested);
    println!(
        "- Submitted, waiting {} ms for scoring",
        wizard.clarification_delay.as_millis()
    );
    session.settle().await;

    println!("\nStep 3: scoring report");
    let snapshot = session.snapshot();
    match &snapshot.report {
        Some(view) => println!("{}", render_text(view)),
        None => {
            println!(
                "  No report produced: {}",
                snapshot.last_error.as_deref().unwrap_or("unknown error")
            );
            return Ok(());
        }
    }
    session.dispatch(WizardEvent::DownloadRequested);

    Ok(())
}

fn print_progress(snapshot: &WizardSnapshot) {
    let status = if snapshot.submitting {
        " (submitting)"
    } else {
        ""
    };
    println!(
        "  [{}/3 {}] {}% complete{}",
        snapshot.step_number, snapshot.step_label, snapshot.progress_pct, status
    );
}

fn render_text(view: &ReportView) -> String {
    let mut lines = vec![
        format!(
            "Decision: {} | score {}/{} ({})",
            view.badge.label,
            view.total_score,
            view.max_total_score,
            view.total_band.label()
        ),
        format!("  {}", view.headline),
        format!("  Next steps: {}", view.next_steps),
        "  Criteria:".to_string(),
    ];
    for criterion in &view.criteria {
        lines.push(format!(
            "    - {}: {}/{} [{}] {}",
            criterion.name,
            criterion.score,
            criterion.max_score,
            criterion.band.label(),
            criterion.comment
        ));
    }
    lines.join("\n")
}
