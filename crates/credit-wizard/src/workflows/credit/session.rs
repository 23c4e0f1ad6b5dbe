//! Runs controller effects against a gateway and a notification sink.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::blueprint::WizardBlueprint;
use super::cancellation::CancellationSource;
use super::controller::{Effect, WizardController, WizardEvent, WizardState};
use super::gateway::{SubmissionAck, SubmissionError, SubmissionGateway, SubmissionTicket};
use super::notify::NotificationSink;
use super::snapshot::WizardSnapshot;

struct Resolution {
    ticket: SubmissionTicket,
    outcome: Result<SubmissionAck, SubmissionError>,
}

struct InFlight {
    ticket: SubmissionTicket,
    cancel: CancellationSource,
}

/// One user's wizard: the controller plus the tasks running its submissions.
///
/// `dispatch` must be called from within a tokio runtime; submissions run on spawned tasks and
/// their outcomes are applied on the next [`poll`](Self::poll) or [`settle`](Self::settle).
pub struct WizardSession<G, N>
where
    G: SubmissionGateway + ?Sized + 'static,
    N: NotificationSink + ?Sized,
{
    controller: WizardController,
    gateway: Arc<G>,
    sink: Arc<N>,
    in_flight: Option<InFlight>,
    resolutions_tx: mpsc::UnboundedSender<Resolution>,
    resolutions_rx: mpsc::UnboundedReceiver<Resolution>,
}

impl<G, N> WizardSession<G, N>
where
    G: SubmissionGateway + ?Sized + 'static,
    N: NotificationSink + ?Sized,
{
    pub fn new(blueprint: Arc<WizardBlueprint>, gateway: Arc<G>, sink: Arc<N>) -> Self {
        let (resolutions_tx, resolutions_rx) = mpsc::unbounded_channel();
        Self {
            controller: WizardController::new(blueprint),
            gateway,
            sink,
            in_flight: None,
            resolutions_tx,
            resolutions_rx,
        }
    }

    pub fn state(&self) -> &WizardState {
        self.controller.state()
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        self.controller.snapshot()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn dispatch(&mut self, event: WizardEvent) {
        let effects = self.controller.handle(event);
        self.run(effects);
    }

    /// Apply every resolution that has already arrived. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(resolution) = self.resolutions_rx.try_recv() {
            self.resolve(resolution);
            applied += 1;
        }
        applied
    }

    /// Wait until no submission is in flight.
    pub async fn settle(&mut self) {
        self.poll();
        while self.in_flight.is_some() {
            match self.resolutions_rx.recv().await {
                Some(resolution) => self.resolve(resolution),
                None => break,
            }
        }
    }

    fn resolve(&mut self, resolution: Resolution) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.ticket == resolution.ticket)
        {
            self.in_flight = None;
        }
        self.dispatch(WizardEvent::SubmissionResolved {
            ticket: resolution.ticket,
            outcome: resolution.outcome,
        });
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notification) => self.sink.notify(notification),
                Effect::StartSubmission(request) => {
                    let ticket = request.ticket;
                    let cancel = CancellationSource::new();
                    let token = cancel.token();
                    let gateway = Arc::clone(&self.gateway);
                    let tx = self.resolutions_tx.clone();
                    debug!(%ticket, "spawning submission");
                    let submission =
                        tokio::spawn(async move { gateway.submit(request, token).await });
                    tokio::spawn(async move {
                        let outcome = match submission.await {
                            Ok(outcome) => outcome,
                            Err(err) => {
                                error!(%ticket, error = %err, "submission task died");
                                Err(SubmissionError::Transport(
                                    "submission task stopped unexpectedly".to_string(),
                                ))
                            }
                        };
                        let _ = tx.send(Resolution { ticket, outcome });
                    });
                    self.in_flight = Some(InFlight { ticket, cancel });
                }
                Effect::CancelSubmission(ticket) => match self.in_flight.take() {
                    Some(flight) if flight.ticket == ticket => {
                        info!(%ticket, "cancelling submission");
                        flight.cancel.cancel();
                    }
                    other => self.in_flight = other,
                },
            }
        }
    }
}

impl<G, N> Drop for WizardSession<G, N>
where
    G: SubmissionGateway + ?Sized + 'static,
    N: NotificationSink + ?Sized,
{
    fn drop(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            debug!(ticket = %flight.ticket, "session dropped with submission in flight");
            flight.cancel.cancel();
        }
    }
}
