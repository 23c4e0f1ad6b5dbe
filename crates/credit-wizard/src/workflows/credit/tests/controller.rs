use super::common::*;
use crate::workflows::credit::blueprint::REQUEST_TEXT_FIELD;
use crate::workflows::credit::controller::{
    transition, Effect, WizardController, WizardEvent, WizardState,
    CLARIFICATIONS_ACCEPTED_MESSAGE, DOWNLOAD_STARTED_MESSAGE, REPORT_UNAVAILABLE_MESSAGE,
    REQUEST_ACCEPTED_MESSAGE,
};
use crate::workflows::credit::domain::{DocumentPurpose, SubmissionMethod, WizardStep};
use crate::workflows::credit::gateway::{SubmissionAck, SubmissionError, SubmissionPayload};
use crate::workflows::credit::notify::{Notification, NotificationKind};
use crate::workflows::credit::report::{CreditStatus, ScoreReport};

fn notifications(effects: &[Effect]) -> Vec<&Notification> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(notification) => Some(notification),
            _ => None,
        })
        .collect()
}

#[test]
fn transition_is_pure_and_emits_start_submission() {
    let mut state = WizardState::new(standard_blueprint());
    for event in text_request_events() {
        state = transition(&state, event).state;
    }

    let before = state.clone();
    let outcome = transition(&state, WizardEvent::CompleteRequested);

    assert_eq!(state.in_flight(), before.in_flight());
    assert_eq!(state.in_flight(), None);
    let request = started(&outcome.effects).expect("submission started");
    assert_eq!(request.ticket, ticket(1));
    assert_eq!(request.step, WizardStep::Submission);
    match &request.payload {
        SubmissionPayload::Request {
            method,
            request_text,
            file,
            ..
        } => {
            assert_eq!(*method, SubmissionMethod::Text);
            assert_eq!(
                request_text.as_deref(),
                Some("I would like to finance a used car.")
            );
            assert!(file.is_none());
        }
        other => panic!("expected request payload, got {other:?}"),
    }
    assert_eq!(outcome.state.step(), WizardStep::Submission);
    assert_eq!(outcome.state.in_flight(), Some(ticket(1)));
    assert!(outcome.state.snapshot().submitting);
}

#[test]
fn missing_contact_is_reported_by_its_label() {
    let mut controller = WizardController::new(extended_blueprint());
    controller.handle(field("email", "ana@example.com"));
    for event in text_request_events() {
        controller.handle(event);
    }

    let effects = controller.handle(WizardEvent::CompleteRequested);

    assert_eq!(
        notifications(&effects),
        vec![&Notification::error("Please provide your phone number")]
    );
    assert_eq!(controller.state().in_flight(), None);
    assert!(controller.state().last_error().is_none());
}

#[test]
fn completion_without_method_is_ignored() {
    let mut controller = WizardController::new(standard_blueprint());
    controller.handle(field(REQUEST_TEXT_FIELD, "Credit for a tractor"));

    let effects = controller.handle(WizardEvent::CompleteRequested);

    assert!(effects.is_empty());
    assert_eq!(controller.state().step(), WizardStep::Submission);
    assert_eq!(controller.state().in_flight(), None);
}

#[test]
fn empty_text_request_fails_validation_and_stays_on_step_one() {
    let mut controller = WizardController::new(standard_blueprint());
    controller.handle(WizardEvent::MethodChosen(SubmissionMethod::Text));
    controller.handle(field(REQUEST_TEXT_FIELD, "    "));
    let before = controller.state().clone();

    let effects = controller.handle(WizardEvent::CompleteRequested);

    let toasts = notifications(&effects);
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, NotificationKind::Error);
    assert!(started(&effects).is_none());
    assert_eq!(controller.state().step(), WizardStep::Submission);
    assert_eq!(controller.state().in_flight(), None);
    assert_eq!(controller.state().last_error(), None);
    assert_eq!(controller.state().request(), before.request());
}

#[test]
fn completing_again_while_in_flight_is_a_no_op() {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    let first = controller.handle(WizardEvent::CompleteRequested);
    assert!(started(&first).is_some());

    let second = controller.handle(WizardEvent::CompleteRequested);

    assert!(second.is_empty());
    assert_eq!(controller.state().in_flight(), Some(ticket(1)));
}

#[test]
fn inputs_are_locked_while_submitting() {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    controller.handle(WizardEvent::CompleteRequested);

    controller.handle(field(REQUEST_TEXT_FIELD, "changed my mind"));
    controller.handle(WizardEvent::MethodChosen(SubmissionMethod::File));

    assert_eq!(controller.state().method(), SubmissionMethod::Text);
    assert_eq!(
        controller.state().request().request_text(),
        "I would like to finance a used car."
    );
}

#[test]
fn accepted_request_advances_and_clears_step_one() {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    controller.handle(WizardEvent::CompleteRequested);

    let effects = controller.handle(WizardEvent::SubmissionResolved {
        ticket: ticket(1),
        outcome: Ok(SubmissionAck::Received),
    });

    assert_eq!(
        notifications(&effects),
        vec![&Notification::success(REQUEST_ACCEPTED_MESSAGE)]
    );
    let state = controller.state();
    assert_eq!(state.step(), WizardStep::Clarification);
    assert_eq!(state.method(), SubmissionMethod::Unset);
    assert_eq!(state.request().request_text(), "");
    assert_eq!(state.in_flight(), None);
    assert_eq!(state.progress_percent(), 0);
}

#[test]
fn stale_resolutions_are_ignored() {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    controller.handle(WizardEvent::CompleteRequested);

    let effects = controller.handle(WizardEvent::SubmissionResolved {
        ticket: ticket(7),
        outcome: Ok(SubmissionAck::Received),
    });

    assert!(effects.is_empty());
    assert_eq!(controller.state().step(), WizardStep::Submission);
    assert_eq!(controller.state().in_flight(), Some(ticket(1)));
}

#[test]
fn five_answers_without_identity_document_stay_on_step_two() {
    let mut controller = controller_at_clarification();
    for (name, value) in standard_answers() {
        controller.handle(field(name, value));
    }

    let effects = controller.handle(WizardEvent::CompleteRequested);

    assert!(started(&effects).is_none());
    assert_eq!(notifications(&effects)[0].kind, NotificationKind::Error);
    assert_eq!(controller.state().step(), WizardStep::Clarification);
    assert_eq!(controller.state().progress_percent(), 80);
}

#[test]
fn scored_clarifications_reach_the_report() {
    let mut controller = controller_at_clarification();
    apply_all(&mut controller, clarification_events());
    assert_eq!(controller.state().progress_percent(), 100);
    let effects = controller.handle(WizardEvent::CompleteRequested);
    let request = started(&effects).expect("clarifications submitted");
    assert_eq!(request.ticket, ticket(2));
    match &request.payload {
        SubmissionPayload::Clarification { answers, documents } => {
            assert_eq!(answers.len(), 5);
            assert_eq!(answers.get("repayment_term").map(String::as_str), Some("48"));
            assert!(documents.contains_key(&DocumentPurpose::Identity));
        }
        other => panic!("expected clarification payload, got {other:?}"),
    }

    let effects = controller.handle(WizardEvent::SubmissionResolved {
        ticket: ticket(2),
        outcome: Ok(SubmissionAck::Scored(ScoreReport::standard())),
    });

    assert_eq!(
        notifications(&effects),
        vec![&Notification::success(CLARIFICATIONS_ACCEPTED_MESSAGE)]
    );
    let state = controller.state();
    assert_eq!(state.step(), WizardStep::Report);
    assert_eq!(state.progress_percent(), 100);
    let report = state.report().expect("report stored");
    assert_eq!(report.status(), CreditStatus::Approved);
    assert_eq!(report.total_score(), 78);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.step_number, 3);
    assert!(snapshot.fields.is_empty());
    let view = snapshot.report.expect("report view");
    assert_eq!(view.criteria.len(), 4);
}

#[test]
fn clarifications_without_a_report_fail_and_can_be_retried() {
    let mut controller = controller_at_clarification();
    apply_all(&mut controller, clarification_events());
    let effects = controller.handle(WizardEvent::CompleteRequested);
    let original = started(&effects).expect("submitted").payload.clone();

    let effects = controller.handle(WizardEvent::SubmissionResolved {
        ticket: ticket(2),
        outcome: Ok(SubmissionAck::Received),
    });

    assert_eq!(
        notifications(&effects),
        vec![&Notification::error(REPORT_UNAVAILABLE_MESSAGE)]
    );
    assert_eq!(controller.state().step(), WizardStep::Clarification);
    assert_eq!(controller.state().last_error(), Some(REPORT_UNAVAILABLE_MESSAGE));
    assert!(controller.state().can_retry());

    let effects = controller.handle(WizardEvent::RetryRequested);
    let retried = started(&effects).expect("retry started");
    assert_eq!(retried.ticket, ticket(3));
    assert_eq!(retried.payload, original);
    assert_eq!(controller.state().last_error(), None);
}

#[test]
fn retry_resends_without_revalidation() {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    let effects = controller.handle(WizardEvent::CompleteRequested);
    let original = started(&effects).expect("submitted").payload.clone();
    controller.handle(WizardEvent::SubmissionResolved {
        ticket: ticket(1),
        outcome: Err(SubmissionError::Transport("connection reset".to_string())),
    });
    assert_eq!(controller.state().step(), WizardStep::Submission);
    assert!(controller
        .state()
        .last_error()
        .is_some_and(|reason| reason.contains("connection reset")));

    let effects = controller.handle(WizardEvent::RetryRequested);

    let retried = started(&effects).expect("retry started");
    assert_eq!(retried.payload, original);
    assert!(notifications(&effects).is_empty());
}

#[test]
fn editing_after_a_failure_discards_the_retry() {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    controller.handle(WizardEvent::CompleteRequested);
    controller.handle(WizardEvent::SubmissionResolved {
        ticket: ticket(1),
        outcome: Err(SubmissionError::Rejected("duplicate request".to_string())),
    });
    assert!(controller.state().can_retry());

    controller.handle(field(REQUEST_TEXT_FIELD, ""));

    assert!(!controller.state().can_retry());
    assert!(controller.handle(WizardEvent::RetryRequested).is_empty());
}

#[test]
fn cancel_keeps_the_step_and_ignores_late_resolution() {
    let mut controller = WizardController::new(standard_blueprint());
    apply_all(&mut controller, text_request_events());
    controller.handle(WizardEvent::CompleteRequested);

    let effects = controller.handle(WizardEvent::CancelRequested);
    assert_eq!(effects, vec![Effect::CancelSubmission(ticket(1))]);
    assert_eq!(controller.state().in_flight(), None);

    let late = controller.handle(WizardEvent::SubmissionResolved {
        ticket: ticket(1),
        outcome: Ok(SubmissionAck::Received),
    });
    assert!(late.is_empty());
    assert_eq!(controller.state().step(), WizardStep::Submission);
    assert_eq!(controller.state().method(), SubmissionMethod::Text);
}

#[test]
fn reset_from_report_starts_over_with_empty_inputs() {
    let mut controller = controller_at_report();

    controller.handle(WizardEvent::ResetRequested);

    let state = controller.state();
    assert_eq!(state.step(), WizardStep::Submission);
    assert_eq!(state.method(), SubmissionMethod::Unset);
    assert!(state.report().is_none());
    assert_eq!(state.progress_percent(), 0);
    assert_eq!(state.request().fields.filled_count(), 0);
    assert!(state.request().file.is_empty());
    assert_eq!(state.clarification().fields.filled_count(), 0);
    assert_eq!(state.clarification().documents.present_count(), 0);
}

#[test]
fn reset_cancels_an_in_flight_submission() {
    let mut controller = controller_at_clarification();
    apply_all(&mut controller, clarification_events());
    controller.handle(WizardEvent::CompleteRequested);

    let effects = controller.handle(WizardEvent::ResetRequested);

    assert_eq!(effects, vec![Effect::CancelSubmission(ticket(2))]);
    assert_eq!(controller.state().step(), WizardStep::Submission);
    assert!(controller
        .handle(WizardEvent::SubmissionResolved {
            ticket: ticket(2),
            outcome: Ok(SubmissionAck::Scored(ScoreReport::standard())),
        })
        .is_empty());
    assert!(controller.state().report().is_none());
}

#[test]
fn progress_never_decreases_while_filling_clarifications() {
    let mut controller = controller_at_clarification();
    let mut previous = controller.state().progress_percent();
    assert_eq!(previous, 0);

    for event in clarification_events() {
        controller.handle(event);
        let current = controller.state().progress_percent();
        assert!(current >= previous, "{current} < {previous}");
        previous = current;
    }
    assert_eq!(previous, 100);
    assert!((controller.state().completion_ratio() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn request_file_slot_only_exists_on_step_one() {
    let mut controller = WizardController::new(standard_blueprint());
    controller.handle(WizardEvent::MethodChosen(SubmissionMethod::File));
    controller.handle(WizardEvent::FileChosen {
        purpose: DocumentPurpose::Identity,
        file: pdf("passport.pdf"),
    });
    assert_eq!(controller.state().progress_percent(), 0);

    controller.handle(WizardEvent::FileChosen {
        purpose: DocumentPurpose::Request,
        file: pdf("first.pdf"),
    });
    controller.handle(WizardEvent::FileChosen {
        purpose: DocumentPurpose::Request,
        file: pdf("second.pdf"),
    });
    let snapshot = controller.snapshot();
    let slot = snapshot
        .document(DocumentPurpose::Request)
        .expect("request slot shown");
    assert_eq!(slot.file.as_ref().map(|file| file.name.as_str()), Some("second.pdf"));
    assert_eq!(snapshot.progress_pct, 100);

    controller.handle(WizardEvent::FileRemoved {
        purpose: DocumentPurpose::Request,
    });
    assert_eq!(controller.state().progress_percent(), 0);
    assert!(controller.handle(WizardEvent::CompleteRequested).len() == 1);
}

#[test]
fn download_notifies_only_on_the_report_step() {
    let mut controller = controller_at_clarification();
    assert!(controller.handle(WizardEvent::DownloadRequested).is_empty());

    let mut controller = controller_at_report();
    let effects = controller.handle(WizardEvent::DownloadRequested);
    assert_eq!(
        notifications(&effects),
        vec![&Notification::success(DOWNLOAD_STARTED_MESSAGE)]
    );
}

#[test]
fn report_step_ignores_completion_and_field_edits() {
    let mut controller = controller_at_report();

    assert!(controller.handle(WizardEvent::CompleteRequested).is_empty());
    controller.handle(field("requested_amount", "1"));

    assert_eq!(controller.state().step(), WizardStep::Report);
    assert_eq!(controller.state().clarification().fields.filled_count(), 0);
}
