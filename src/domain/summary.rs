//! Per-section summaries of a book

use super::BookError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notable claim from a section, anchored to the page it appears on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStatement {
    statement: String,
    page: u32,
}

impl KeyStatement {
    pub fn new(statement: impl Into<String>, page: u32) -> Result<Self, BookError> {
        let statement = statement.into();
        if statement.trim().is_empty() {
            return Err(BookError::InvalidState(
                "KeyStatement statement cannot be empty".to_string(),
            ));
        }
        if page < 1 {
            return Err(BookError::InvalidState(format!(
                "KeyStatement page must be >= 1, got {}",
                page
            )));
        }
        Ok(Self { statement, page })
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    id: String,
    book_id: String,
    title: String,
    start_page: u32,
    end_page: u32,
    summary: String,
    key_statements: Vec<KeyStatement>,
    section_index: u32,
    created_at: DateTime<Utc>,
}

impl SectionSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        book_id: impl Into<String>,
        title: impl Into<String>,
        start_page: u32,
        end_page: u32,
        summary: impl Into<String>,
        key_statements: Vec<KeyStatement>,
        section_index: u32,
    ) -> Result<Self, BookError> {
        let title = title.into();
        let summary = summary.into();
        if title.trim().is_empty() {
            return Err(BookError::InvalidState(
                "SectionSummary title cannot be empty".to_string(),
            ));
        }
        if summary.trim().is_empty() {
            return Err(BookError::InvalidState(
                "SectionSummary summary cannot be empty".to_string(),
            ));
        }
        if start_page < 1 {
            return Err(BookError::InvalidState(format!(
                "SectionSummary start_page must be >= 1, got {}",
                start_page
            )));
        }
        if end_page < start_page {
            return Err(BookError::InvalidState(format!(
                "SectionSummary end_page ({}) must be >= start_page ({})",
                end_page, start_page
            )));
        }

        Ok(Self {
            id: id.into(),
            book_id: book_id.into(),
            title,
            start_page,
            end_page,
            summary,
            key_statements,
            section_index,
            created_at: Utc::now(),
        })
    }

    /// Rebuild a stored summary without re-running validation
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_row(
        id: String,
        book_id: String,
        title: String,
        start_page: u32,
        end_page: u32,
        summary: String,
        key_statements: Vec<KeyStatement>,
        section_index: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            book_id,
            title,
            start_page,
            end_page,
            summary,
            key_statements,
            section_index,
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

    pub fn start_page(&self) -> u32 {
        self.start_page
    }

    pub fn end_page(&self) -> u32 {
        self.end_page
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn key_statements(&self) -> &[KeyStatement] {
        &self.key_statements
    }

    pub fn section_index(&self) -> u32 {
        self.section_index
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
