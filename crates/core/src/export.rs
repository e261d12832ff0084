//! Export document schema.
//!
//! Field declaration order is the serialized key order, which downstream
//! analysis scripts depend on. Do not reorder fields.

use serde::Serialize;

use crate::types::DbId;

/// One annotation row in an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationExport {
    pub timecode: f64,
    pub frame_number: i32,
    pub slider_position: f64,
}

/// One associated video with the participant's annotations on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoExport {
    pub video_id: DbId,
    pub duration: Option<f64>,
    pub frame_rate: Option<f64>,
    pub annotations: Vec<AnnotationExport>,
}

/// Everything recorded for a single participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantExport {
    /// Researcher-supplied display name.
    pub participant_external_id: String,
    pub participant_internal_id: DbId,
    pub project_id: DbId,
    pub project_token: String,
    pub session_id: DbId,
    pub session_token: String,
    pub participant_token: String,
    pub videos: Vec<VideoExport>,
}

/// All participants of a session.
///
/// Top-level keys keep the spaced names existing aggregate downloads use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionExport {
    #[serde(rename = "Session ID")]
    pub session_id: DbId,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Number of Participants")]
    pub participant_count: usize,
    #[serde(rename = "Participants Data")]
    pub participants: Vec<ParticipantExport>,
}

/// Download filename for a participant export.
pub fn participant_filename(participant_id: DbId) -> String {
    format!("participant_{participant_id}_annotations.json")
}

/// Download filename for a session aggregate export.
pub fn session_filename(session_id: DbId) -> String {
    format!("session_{session_id}_aggregate.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParticipantExport {
        ParticipantExport {
            participant_external_id: "Alice".into(),
            participant_internal_id: 4,
            project_id: 1,
            project_token: "PrOj0001".into(),
            session_id: 2,
            session_token: "SeSs0002".into(),
            participant_token: "PaRt0004".into(),
            videos: vec![VideoExport {
                video_id: 9,
                duration: Some(12.5),
                frame_rate: None,
                annotations: vec![AnnotationExport {
                    timecode: 0.5,
                    frame_number: 15,
                    slider_position: -3.0,
                }],
            }],
        }
    }

    #[test]
    fn participant_keys_serialize_in_schema_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            "{\"participant_external_id\":\"Alice\",\"participant_internal_id\":4,\
             \"project_id\":1,\"project_token\":\"PrOj0001\",\"session_id\":2,\
             \"session_token\":\"SeSs0002\",\"participant_token\":\"PaRt0004\",\
             \"videos\":[{\"video_id\":9,\"duration\":12.5,\"frame_rate\":null,\
             \"annotations\":[{\"timecode\":0.5,\"frame_number\":15,\"slider_position\":-3.0}]}]}"
        );
    }

    #[test]
    fn session_document_wraps_participants() {
        let doc = SessionExport {
            session_id: 2,
            description: Some("pilot".into()),
            participant_count: 1,
            participants: vec![sample()],
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.starts_with(
            "{\"Session ID\":2,\"Description\":\"pilot\",\"Number of Participants\":1,\
             \"Participants Data\":[{\"participant_external_id\":\"Alice\""
        ));
    }

    #[test]
    fn filenames() {
        assert_eq!(participant_filename(4), "participant_4_annotations.json");
        assert_eq!(session_filename(2), "session_2_aggregate.json");
    }
}
