//! Annotation events and submission validation.
//!
//! A participant's submission carries, per video, the slider events recorded
//! while watching it. Each event is identified by
//! `(participant, video, timecode, frame_number)`; resubmitting the same key
//! is a no-op so the client can retry freely.

use std::collections::{BTreeMap, HashSet};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Upper bound for participant progress, in percent.
pub const MAX_PROGRESS: f64 = 100.0;

/// One slider event as submitted by the annotator page.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AnnotationEvent {
    /// Seconds since the start of the clip.
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub timestamp: f64,
    #[serde(alias = "frame_index")]
    pub video_frame: i64,
    /// Browsers report range inputs as strings, so `"3"` is accepted.
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub slider_position: f64,
}

/// A participant's submission: events keyed by video id, plus progress.
///
/// Everything below the top level stays raw JSON until validated, so a
/// malformed video entry, event or progress value only rejects itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub annotations: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(f64),
    Str(String),
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => parse_numeric_str(&s)
            .ok_or_else(|| de::Error::custom(format!("expected a number, got \"{s}\""))),
    }
}

fn parse_numeric_str(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Read a number sent either as a JSON number or as a numeric string.
pub fn lenient_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

/// An event accepted for storage, normalized to the stored column types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NewAnnotation {
    pub participant_id: DbId,
    pub video_id: DbId,
    pub timecode: f64,
    pub frame_number: i32,
    pub slider_position: f64,
}

impl NewAnnotation {
    /// Identity key; floats compare by bit pattern so the key is hashable.
    pub fn identity(&self) -> (DbId, DbId, u64, i32) {
        (
            self.participant_id,
            self.video_id,
            self.timecode.to_bits(),
            self.frame_number,
        )
    }
}

/// Validate a single event and normalize it for `participant_id`/`video_id`.
pub fn validate_event(
    participant_id: DbId,
    video_id: DbId,
    event: &AnnotationEvent,
) -> Result<NewAnnotation, CoreError> {
    if !event.timestamp.is_finite() || event.timestamp < 0.0 {
        return Err(CoreError::Validation(format!(
            "timestamp must be a finite non-negative number, got {}",
            event.timestamp
        )));
    }
    if !event.slider_position.is_finite() {
        return Err(CoreError::Validation(format!(
            "slider_position must be finite, got {}",
            event.slider_position
        )));
    }
    let frame_number = i32::try_from(event.video_frame)
        .ok()
        .filter(|f| *f >= 0)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "video_frame must be between 0 and {}, got {}",
                i32::MAX,
                event.video_frame
            ))
        })?;

    Ok(NewAnnotation {
        participant_id,
        video_id,
        // -0.0 and 0.0 must share one identity key.
        timecode: event.timestamp + 0.0,
        frame_number,
        slider_position: event.slider_position,
    })
}

/// Drop later events whose identity key already appeared in `batch`.
///
/// Returns the number of events removed.
pub fn collapse_duplicates(batch: &mut Vec<NewAnnotation>) -> usize {
    let before = batch.len();
    let mut seen = HashSet::with_capacity(before);
    batch.retain(|a| seen.insert(a.identity()));
    before - batch.len()
}

/// Validate a submitted progress percentage.
pub fn validate_progress(progress: f64) -> Result<f64, CoreError> {
    if progress.is_finite() && (0.0..=MAX_PROGRESS).contains(&progress) {
        Ok(progress)
    } else {
        Err(CoreError::Validation(format!(
            "progress must be between 0 and {MAX_PROGRESS}, got {progress}"
        )))
    }
}

/// Validate a raw progress value from a submission. `null` means absent.
pub fn parse_progress(raw: &serde_json::Value) -> Result<Option<f64>, CoreError> {
    if raw.is_null() {
        return Ok(None);
    }
    let progress = lenient_number(raw).ok_or_else(|| {
        CoreError::Validation(format!("progress must be a number, got {raw}"))
    })?;
    validate_progress(progress).map(Some)
}

/// Parse a submission key as a video id.
pub fn parse_video_key(key: &str) -> Option<DbId> {
    key.trim().parse::<DbId>().ok().filter(|id| *id > 0)
}
