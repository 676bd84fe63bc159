//! Book entity and its ingestion state machine
//!
//! A book moves through four states:
//! - `Pending`: registered, nothing ingested yet
//! - `Ingesting`: chunks are being produced
//! - `Ready`: chunks (and embeddings, if configured) are available
//! - `Failed`: the last ingestion attempt did not finish
//!
//! Transitions are computed by [`BookStatus::transition`], a pure function
//! over (state, action). [`Book`] only mutates after the transition succeeded.

use super::BookError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Pending,
    Ingesting,
    Ready,
    Failed,
}

impl BookStatus {
    /// Get the string representation stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Pending => "pending",
            BookStatus::Ingesting => "ingesting",
            BookStatus::Ready => "ready",
            BookStatus::Failed => "failed",
        }
    }

    /// Get all statuses
    pub fn all() -> &'static [BookStatus] {
        &[
            BookStatus::Pending,
            BookStatus::Ingesting,
            BookStatus::Ready,
            BookStatus::Failed,
        ]
    }

    /// Compute the state reached by applying `action` from `self`.
    ///
    /// Returns `InvalidState` for every (state, action) pair that is not an
    /// allowed transition.
    pub fn transition(self, action: &BookAction) -> Result<BookStatus, BookError> {
        match (self, action) {
            (BookStatus::Pending, BookAction::StartIngestion) => Ok(BookStatus::Ingesting),
            (BookStatus::Ingesting, BookAction::CompleteIngestion) => Ok(BookStatus::Ready),
            (BookStatus::Ingesting, BookAction::FailIngestion) => Ok(BookStatus::Failed),
            (_, BookAction::ResetToPending) => Ok(BookStatus::Pending),
            (_, BookAction::SwitchEmbeddingProvider { .. }) => Ok(BookStatus::Pending),
            (from, action) => Err(BookError::InvalidState(format!(
                "Cannot {} from '{}' status",
                action.describe(),
                from
            ))),
        }
    }
}

impl FromStr for BookStatus {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, BookError> {
        match s {
            "pending" => Ok(BookStatus::Pending),
            "ingesting" => Ok(BookStatus::Ingesting),
            "ready" => Ok(BookStatus::Ready),
            "failed" => Ok(BookStatus::Failed),
            _ => Err(BookError::ParseFailed(format!("Unknown book status: {}", s))),
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An action requested on a book's lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookAction {
    StartIngestion,
    CompleteIngestion,
    FailIngestion,
    ResetToPending,
    SwitchEmbeddingProvider { provider: String, dimension: u32 },
}

impl BookAction {
    fn describe(&self) -> &'static str {
        match self {
            BookAction::StartIngestion => "start ingestion",
            BookAction::CompleteIngestion => "complete ingestion",
            BookAction::FailIngestion => "fail ingestion",
            BookAction::ResetToPending => "reset to pending",
            BookAction::SwitchEmbeddingProvider { .. } => "switch embedding provider",
        }
    }
}

/// A book in the library.
///
/// Owns its chunks, conversations and section summaries: deleting the book
/// row removes all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: String,
    title: String,
    status: BookStatus,
    current_page: u32,
    embedding_provider: Option<String>,
    embedding_dimension: Option<u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    /// Create a pending book at page 0 with no embedding provider
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Result<Self, BookError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(BookError::InvalidState("Book title cannot be empty".to_string()));
        }

        let now = Utc::now();
        Ok(Self {
            id: id.into(),
            title,
            status: BookStatus::Pending,
            current_page: 0,
            embedding_provider: None,
            embedding_dimension: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a book from a stored row; skips constructor validation.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_row(
        id: String,
        title: String,
        status: BookStatus,
        current_page: u32,
        embedding_provider: Option<String>,
        embedding_dimension: Option<u32>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            status,
            current_page,
            embedding_provider,
            embedding_dimension,
            created_at,
            updated_at,
        }
    }

    /// Override both timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> BookStatus {
        self.status
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn embedding_provider(&self) -> Option<&str> {
        self.embedding_provider.as_deref()
    }

    pub fn embedding_dimension(&self) -> Option<u32> {
        self.embedding_dimension
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a lifecycle action. On error the book is left untouched.
    pub fn apply(&mut self, action: BookAction) -> Result<(), BookError> {
        let next = self.status.transition(&action)?;
        if let BookAction::SwitchEmbeddingProvider { provider, dimension } = action {
            self.embedding_provider = Some(provider);
            self.embedding_dimension = Some(dimension);
        }
        self.status = next;
        Ok(())
    }

    pub fn start_ingestion(&mut self) -> Result<(), BookError> {
        self.apply(BookAction::StartIngestion)
    }

    pub fn complete_ingestion(&mut self) -> Result<(), BookError> {
        self.apply(BookAction::CompleteIngestion)
    }

    pub fn fail_ingestion(&mut self) -> Result<(), BookError> {
        self.apply(BookAction::FailIngestion)
    }

    pub fn reset_to_pending(&mut self) {
        self.status = BookStatus::Pending;
    }

    /// Record the reader's position. Pages are unsigned, so any value is valid.
    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page;
    }

    /// Point the book at a new embedding provider; existing embeddings are
    /// stale so the book goes back to `Pending`.
    pub fn switch_embedding_provider(&mut self, provider: impl Into<String>, dimension: u32) {
        self.embedding_provider = Some(provider.into());
        self.embedding_dimension = Some(dimension);
        self.reset_to_pending();
    }
}
