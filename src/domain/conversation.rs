use super::BookError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A chat thread about one book. Owns its chat messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    id: String,
    book_id: String,
    title: String,
    created_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<(), BookError> {
    if title.trim().is_empty() {
        return Err(BookError::InvalidState(
            "Conversation title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

impl Conversation {
    pub fn new(
        id: impl Into<String>,
        book_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, BookError> {
        let title = title.into();
        validate_title(&title)?;
        Ok(Self {
            id: id.into(),
            book_id: book_id.into(),
            title,
            created_at: Utc::now(),
        })
    }

    pub(crate) fn from_row(
        id: String,
        book_id: String,
        title: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            book_id,
            title,
            created_at,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Change the title; a blank title leaves the conversation unchanged.
    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), BookError> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        Ok(())
    }
}
