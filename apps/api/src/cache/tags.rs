use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    JobPostings,
    Interviews,
    Questions,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::JobPostings => "job_postings",
            EntityKind::Interviews => "interviews",
            EntityKind::Questions => "questions",
        }
    }
}

/// An invalidation key attached to cached reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTag(String);

impl CacheTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every entity of a kind.
pub fn global_tag(kind: EntityKind) -> CacheTag {
    CacheTag(format!("global:{}", kind.as_str()))
}

/// Every entity of a kind owned by one user.
pub fn user_tag(kind: EntityKind, user_id: &str) -> CacheTag {
    CacheTag(format!("user:{user_id}:{}", kind.as_str()))
}

/// Every entity of a kind under one job posting.
pub fn job_posting_tag(kind: EntityKind, job_posting_id: Uuid) -> CacheTag {
    CacheTag(format!("job_posting:{job_posting_id}:{}", kind.as_str()))
}

/// One entity.
pub fn id_tag(kind: EntityKind, id: impl fmt::Display) -> CacheTag {
    CacheTag(format!("id:{id}:{}", kind.as_str()))
}
