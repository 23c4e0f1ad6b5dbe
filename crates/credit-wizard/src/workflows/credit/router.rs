use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::blueprint::WizardBlueprint;
use super::controller::WizardEvent;
use super::domain::{DocumentPurpose, SubmissionMethod};
use super::gateway::SubmissionGateway;
use super::intake::{AllowList, FileCandidate};
use super::notify::{Notification, NotificationBuffer};
use super::report::export_csv;
use super::session::WizardSession;
use super::snapshot::WizardSnapshot;
use crate::error::AppError;

pub type SessionId = u64;

/// Intent posted by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    ChooseMethod {
        method: SubmissionMethod,
    },
    SetField {
        name: String,
        value: String,
    },
    ChooseFile {
        purpose: DocumentPurpose,
        file: FileCandidate,
    },
    /// Drag-and-drop gesture; only a single dropped file is accepted.
    DropFiles {
        purpose: DocumentPurpose,
        files: Vec<FileCandidate>,
    },
    RemoveFile {
        purpose: DocumentPurpose,
    },
    Complete,
    Retry,
    Cancel,
    Download,
    Reset,
}

/// Session snapshot plus the notifications raised since the last read.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: WizardSnapshot,
    pub notifications: Vec<Notification>,
}

pub struct HostedSession<G: SubmissionGateway + ?Sized + 'static> {
    session: WizardSession<G, NotificationBuffer>,
    notifications: Arc<NotificationBuffer>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl<G: SubmissionGateway + ?Sized + 'static> HostedSession<G> {
    fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    fn view(&mut self, id: SessionId) -> SessionView {
        self.touch();
        self.session.poll();
        SessionView {
            session_id: id,
            created_at: self.created_at,
            snapshot: self.session.snapshot(),
            notifications: self.notifications.drain(),
        }
    }
}

pub type SharedSession<G> = Arc<tokio::sync::Mutex<HostedSession<G>>>;

/// Isolated wizard sessions keyed by id.
pub struct SessionRegistry<G: SubmissionGateway + ?Sized + 'static> {
    blueprint: Arc<WizardBlueprint>,
    gateway: Arc<G>,
    allow_list: AllowList,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<SessionId, SharedSession<G>>>,
}

impl<G: SubmissionGateway + ?Sized + 'static> SessionRegistry<G> {
    pub fn new(blueprint: Arc<WizardBlueprint>, gateway: Arc<G>, allow_list: AllowList) -> Self {
        Self {
            blueprint,
            gateway,
            allow_list,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self) -> (SessionId, SharedSession<G>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notifications = Arc::new(NotificationBuffer::default());
        let hosted = Arc::new(tokio::sync::Mutex::new(HostedSession {
            session: WizardSession::new(
                Arc::clone(&self.blueprint),
                Arc::clone(&self.gateway),
                Arc::clone(&notifications),
            ),
            notifications,
            created_at: Utc::now(),
            last_active: Utc::now(),
        }));
        self.sessions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .insert(id, Arc::clone(&hosted));
        info!(session_id = id, "wizard session created");
        (id, hosted)
    }

    pub fn find(&self, id: SessionId) -> Option<SharedSession<G>> {
        self.sessions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .get(&id)
            .cloned()
    }

    pub fn remove(&self, id: SessionId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions untouched for longer than `idle_for` as of `now`. Sessions currently locked by
    /// a request are kept. Dropping a session cancels its in-flight submission.
    pub fn sweep_idle(&self, idle_for: Duration, now: DateTime<Utc>) -> usize {
        let Ok(idle_for) = TimeDelta::from_std(idle_for) else {
            return 0;
        };
        let cutoff = now - idle_for;
        let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
        let before = sessions.len();
        sessions.retain(|id, hosted| match hosted.try_lock() {
            Ok(guard) if guard.last_active < cutoff => {
                info!(session_id = *id, "expiring idle wizard session");
                false
            }
            _ => true,
        });
        before - sessions.len()
    }

    /// Wait for the session's in-flight submission, if any, and return its snapshot.
    pub async fn settle(&self, id: SessionId) -> Option<WizardSnapshot> {
        let hosted = self.find(id)?;
        let mut guard = hosted.lock().await;
        guard.session.settle().await;
        Some(guard.session.snapshot())
    }

    fn event_for(&self, intent: Intent) -> Result<WizardEvent, AppError> {
        let event = match intent {
            Intent::ChooseMethod { method } => WizardEvent::MethodChosen(method),
            Intent::SetField { name, value } => WizardEvent::FieldChanged { name, value },
            Intent::ChooseFile { purpose, file } => {
                let selection = self
                    .allow_list
                    .screen(&file)
                    .ok_or(AppError::UnsupportedFile(file.name))?;
                WizardEvent::FileChosen {
                    purpose,
                    file: selection,
                }
            }
            Intent::DropFiles { purpose, files } => {
                let selection = self.allow_list.screen_drop(&files).ok_or_else(|| {
                    let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
                    AppError::UnsupportedFile(names.join(", "))
                })?;
                WizardEvent::FileChosen {
                    purpose,
                    file: selection,
                }
            }
            Intent::RemoveFile { purpose } => WizardEvent::FileRemoved { purpose },
            Intent::Complete => WizardEvent::CompleteRequested,
            Intent::Retry => WizardEvent::RetryRequested,
            Intent::Cancel => WizardEvent::CancelRequested,
            Intent::Download => WizardEvent::DownloadRequested,
            Intent::Reset => WizardEvent::ResetRequested,
        };
        Ok(event)
    }
}

/// Router builder exposing the wizard sessions over JSON.
pub fn wizard_router<G>(registry: Arc<SessionRegistry<G>>) -> Router
where
    G: SubmissionGateway + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/wizard/sessions", post(create_handler::<G>))
        .route(
            "/api/v1/wizard/sessions/:session_id",
            get(session_handler::<G>).delete(delete_handler::<G>),
        )
        .route(
            "/api/v1/wizard/sessions/:session_id/intents",
            post(intent_handler::<G>),
        )
        .route(
            "/api/v1/wizard/sessions/:session_id/report.csv",
            get(report_csv_handler::<G>),
        )
        .with_state(registry)
}

pub(crate) async fn create_handler<G>(State(registry): State<Arc<SessionRegistry<G>>>) -> Response
where
    G: SubmissionGateway + ?Sized + 'static,
{
    let (id, hosted) = registry.create();
    let view = hosted.lock().await.view(id);
    (StatusCode::CREATED, Json(view)).into_response()
}

pub(crate) async fn session_handler<G>(
    State(registry): State<Arc<SessionRegistry<G>>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionView>, AppError>
where
    G: SubmissionGateway + ?Sized + 'static,
{
    let hosted = registry
        .find(session_id)
        .ok_or(AppError::SessionNotFound(session_id))?;
    let view = hosted.lock().await.view(session_id);
    Ok(Json(view))
}

pub(crate) async fn intent_handler<G>(
    State(registry): State<Arc<SessionRegistry<G>>>,
    Path(session_id): Path<SessionId>,
    Json(intent): Json<Intent>,
) -> Result<Json<SessionView>, AppError>
where
    G: SubmissionGateway + ?Sized + 'static,
{
    let hosted = registry
        .find(session_id)
        .ok_or(AppError::SessionNotFound(session_id))?;
    let event = registry.event_for(intent)?;
    let mut guard = hosted.lock().await;
    guard.session.poll();
    guard.session.dispatch(event);
    Ok(Json(guard.view(session_id)))
}

pub(crate) async fn report_csv_handler<G>(
    State(registry): State<Arc<SessionRegistry<G>>>,
    Path(session_id): Path<SessionId>,
) -> Result<Response, AppError>
where
    G: SubmissionGateway + ?Sized + 'static,
{
    let hosted = registry
        .find(session_id)
        .ok_or(AppError::SessionNotFound(session_id))?;
    let mut guard = hosted.lock().await;
    guard.touch();
    guard.session.poll();
    let body = {
        let report = guard
            .session
            .state()
            .report()
            .ok_or(AppError::ReportUnavailable)?;
        export_csv(report)?
    };
    guard.session.dispatch(WizardEvent::DownloadRequested);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"credit-report.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

pub(crate) async fn delete_handler<G>(
    State(registry): State<Arc<SessionRegistry<G>>>,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, AppError>
where
    G: SubmissionGateway + ?Sized + 'static,
{
    if registry.remove(session_id) {
        info!(session_id, "wizard session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(session_id))
    }
}
