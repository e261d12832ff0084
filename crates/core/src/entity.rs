//! Closed set of token-bearing entity kinds.
//!
//! Each kind owns its own token namespace and maps to exactly one table.
//! Lookups dispatch on this enum instead of on free-form type names.

use serde::Serialize;

/// Entity kinds that carry an anonymous token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Preset,
    Session,
    Participant,
    Video,
}

impl EntityKind {
    /// Lowercase identifier used in routes and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Preset => "preset",
            Self::Session => "session",
            Self::Participant => "participant",
            Self::Video => "video",
        }
    }

    /// Human-readable entity name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Preset => "Preset",
            Self::Session => "Session",
            Self::Participant => "Participant",
            Self::Video => "Video",
        }
    }

    /// Backing table for this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Preset => "presets",
            Self::Session => "sessions",
            Self::Participant => "participants",
            Self::Video => "videos",
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_distinct() {
        let kinds = [
            EntityKind::Project,
            EntityKind::Preset,
            EntityKind::Session,
            EntityKind::Participant,
            EntityKind::Video,
        ];
        let mut tables: Vec<_> = kinds.iter().map(|k| k.table()).collect();
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), kinds.len());
    }
}
