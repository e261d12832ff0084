//! Settings row: the stored form of [`StudySettings`].

use corae_core::error::CoreError;
use corae_core::settings::{Bounding, Coupling, Ordering, StudySettings};
use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `settings` table. Policy columns are TEXT.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Settings {
    pub id: DbId,
    pub method: String,
    pub capacity: i32,
    pub coupling: String,
    pub ordering: String,
    pub bounding: String,
    pub granularity: i32,
    pub axis: String,
    pub ceiling: String,
    pub floor: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Settings {
    /// Parse the stored columns into typed settings.
    pub fn values(&self) -> Result<StudySettings, CoreError> {
        Ok(StudySettings {
            method: self.method.clone(),
            capacity: self.capacity,
            coupling: Coupling::parse(&self.coupling)?,
            ordering: Ordering::parse(&self.ordering)?,
            bounding: Bounding::parse(&self.bounding)?,
            granularity: self.granularity,
            axis: self.axis.clone(),
            ceiling: self.ceiling.clone(),
            floor: self.floor.clone(),
        })
    }
}
