//! Text chunks cut from a book

use super::BookError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A contiguous slice of a book's text spanning one or more pages.
///
/// Page numbers are 1-indexed and inclusive; `chunk_index` gives the
/// reading order within the book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    id: String,
    book_id: String,
    content: String,
    start_page: u32,
    end_page: u32,
    chunk_index: u32,
    created_at: DateTime<Utc>,
}

impl Chunk {
    pub fn new(
        id: impl Into<String>,
        book_id: impl Into<String>,
        content: impl Into<String>,
        start_page: u32,
        end_page: u32,
        chunk_index: u32,
    ) -> Result<Self, BookError> {
        if start_page < 1 {
            return Err(BookError::InvalidState(format!(
                "Chunk start_page must be >= 1, got {}",
                start_page
            )));
        }
        if end_page < start_page {
            return Err(BookError::InvalidState(format!(
                "Chunk end_page ({}) must be >= start_page ({})",
                end_page, start_page
            )));
        }

        Ok(Self {
            id: id.into(),
            book_id: book_id.into(),
            content: content.into(),
            start_page,
            end_page,
            chunk_index,
            created_at: Utc::now(),
        })
    }

    pub(crate) fn from_row(
        id: String,
        book_id: String,
        content: String,
        start_page: u32,
        end_page: u32,
        chunk_index: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            book_id,
            content,
            start_page,
            end_page,
            chunk_index,
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

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn start_page(&self) -> u32 {
        self.start_page
    }

    pub fn end_page(&self) -> u32 {
        self.end_page
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_page_ranges() {
        for start in 1..=5 {
            for end in start..=start + 3 {
                let chunk = Chunk::new("c1", "b1", "text", start, end, 0).unwrap();
                assert_eq!(chunk.start_page(), start);
                assert_eq!(chunk.end_page(), end);
            }
        }
    }

    #[test]
    fn test_start_page_zero_rejected() {
        let err = Chunk::new("c1", "b1", "text", 0, 3, 0).unwrap_err();
        assert_eq!(
            err,
            BookError::InvalidState("Chunk start_page must be >= 1, got 0".to_string())
        );
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = Chunk::new("c1", "b1", "text", 5, 4, 0).unwrap_err();
        assert_eq!(
            err,
            BookError::InvalidState("Chunk end_page (4) must be >= start_page (5)".to_string())
        );
    }
}
