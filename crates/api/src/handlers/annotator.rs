//! Participant-facing handlers: joining and annotating.
//!
//! Participants are identified only by the token in the path.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use corae_core::annotation::Submission;
use corae_core::entity::EntityKind;
use corae_core::settings::{Bounding, StudySettings};
use corae_core::types::DbId;
use corae_lifecycle::context;
use corae_lifecycle::{AnnotationCollector, TokenIdentity};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Slider configuration shown to the annotator.
#[derive(Debug, Serialize)]
pub struct SliderConfig {
    pub method: String,
    pub bounding: Bounding,
    pub min: f64,
    pub max: f64,
    pub initial: f64,
    pub axis: String,
    pub ceiling: String,
    pub floor: String,
}

impl From<&StudySettings> for SliderConfig {
    fn from(settings: &StudySettings) -> Self {
        let (min, max) = settings.slider_range();
        Self {
            method: settings.method.clone(),
            bounding: settings.bounding,
            min,
            max,
            initial: 0.0,
            axis: settings.axis.clone(),
            ceiling: settings.ceiling.clone(),
            floor: settings.floor.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueuedVideo {
    pub id: DbId,
    pub order: i32,
    pub url: String,
    pub frame_rate: Option<f64>,
    pub duration: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AnnotatorView {
    pub participant_id: DbId,
    pub has_submitted: bool,
    pub progress: f64,
    pub slider: SliderConfig,
    pub videos: Vec<QueuedVideo>,
}

/// GET /api/v1/join/{token}
///
/// Records the visit and redirects to the annotator.
pub async fn join(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Redirect> {
    let participant = TokenIdentity::new(state.store.as_ref())
        .resolve_participant(&token)
        .await?;
    Ok(Redirect::to(&format!("/api/v1/annotator/{}", participant.token)))
}

/// GET /api/v1/annotator/{token}
pub async fn view(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let store = state.store.as_ref();
    let participant_id = TokenIdentity::new(store)
        .verify_token(EntityKind::Participant, &token)
        .await?;
    let ctx = context::load_participant(store, participant_id).await?;
    let queue = AnnotationCollector::new(store)
        .participant_queue(participant_id)
        .await?;

    let videos = queue
        .into_iter()
        .map(|entry| QueuedVideo {
            id: entry.video.id,
            order: entry.order,
            url: format!("/uploads/{}", entry.video.filepath),
            frame_rate: entry.video.frame_rate,
            duration: entry.video.duration,
        })
        .collect();

    Ok(Json(DataResponse {
        data: AnnotatorView {
            participant_id,
            has_submitted: ctx.participant.has_submitted,
            progress: ctx.participant.progress,
            slider: SliderConfig::from(&ctx.settings),
            videos,
        },
    }))
}

/// POST /api/v1/annotator/{token}
///
/// Body: `{ "annotations": { "<video_id>": [event, ...] }, "progress": 0..100 }`.
pub async fn submit(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(submission): Json<Submission>,
) -> AppResult<impl IntoResponse> {
    let store = state.store.as_ref();
    let participant_id = TokenIdentity::new(store)
        .verify_token(EntityKind::Participant, &token)
        .await?;
    let report = AnnotationCollector::new(store)
        .accept_submission(participant_id, &submission)
        .await?;
    Ok(Json(DataResponse { data: report }))
}
