//! Thought persistence boundary.
//!
//! The editor and the garden only ever talk to [`ThoughtStore`]; the SQLite
//! implementation lives in [`sqlite`].

mod migrations;
pub mod sqlite;

use std::fmt;

use thiserror::Error;

use crate::clock::Millis;
use crate::emotion::Emotion;

pub use sqlite::SqliteStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThoughtId(pub i64);

impl fmt::Display for ThoughtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThoughtRecord {
    pub id: ThoughtId,
    pub content: String,
    pub created_at: Millis,
    pub last_active_at: Millis,
    pub emotion: Emotion,
    pub solidified: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewThought {
    pub content: String,
    pub created_at: Millis,
    pub last_active_at: Millis,
    pub emotion: Emotion,
    pub solidified: bool,
}

impl NewThought {
    pub fn draft(content: impl Into<String>, at: Millis, emotion: Emotion) -> Self {
        Self {
            content: content.into(),
            created_at: at,
            last_active_at: at,
            emotion,
            solidified: false,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThoughtPatch {
    pub content: Option<String>,
    pub last_active_at: Option<Millis>,
    pub emotion: Option<Emotion>,
    pub solidified: Option<bool>,
}

impl ThoughtPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.last_active_at.is_none()
            && self.emotion.is_none()
            && self.solidified.is_none()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("thought not found: {0}")]
    NotFound(ThoughtId),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchema {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait ThoughtStore {
    fn create(&self, thought: &NewThought) -> StoreResult<ThoughtId>;

    fn update(&self, id: ThoughtId, patch: &ThoughtPatch) -> StoreResult<()>;

    /// Records with the given flag, most recently active first.
    fn query_by_solidified(&self, solidified: bool) -> StoreResult<Vec<ThoughtRecord>>;

    fn active_draft(&self) -> StoreResult<Option<ThoughtRecord>> {
        Ok(self.query_by_solidified(false)?.into_iter().next())
    }
}

impl<S: ThoughtStore + ?Sized> ThoughtStore for &S {
    fn create(&self, thought: &NewThought) -> StoreResult<ThoughtId> {
        (**self).create(thought)
    }

    fn update(&self, id: ThoughtId, patch: &ThoughtPatch) -> StoreResult<()> {
        (**self).update(id, patch)
    }

    fn query_by_solidified(&self, solidified: bool) -> StoreResult<Vec<ThoughtRecord>> {
        (**self).query_by_solidified(solidified)
    }
}
