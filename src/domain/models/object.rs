use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::ObjectKey;

/// Metadata about one object in the bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub key: ObjectKey,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

/// Outcome of a metadata-only lookup.
///
/// Absence is a normal outcome here rather than an error, so an existence
/// check never depends on how a backend words its failures.
#[derive(Debug, Clone, PartialEq)]
pub enum StatOutcome {
    Found(ObjectInfo),
    NotFound,
}

impl StatOutcome {
    pub fn exists(&self) -> bool {
        matches!(self, StatOutcome::Found(_))
    }

    pub fn into_info(self) -> Option<ObjectInfo> {
        match self {
            StatOutcome::Found(info) => Some(info),
            StatOutcome::NotFound => None,
        }
    }
}
