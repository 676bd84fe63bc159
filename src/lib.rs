//! # Bookshelf - Reading companion persistence
//!
//! Local storage for a book-reading assistant.
//!
//! Bookshelf provides:
//! - Domain entities for books, text chunks, conversations, chat messages and
//!   section summaries, with the book ingestion state machine
//! - A SQLite connection with tagged values, transactions and a
//!   file-based migration engine
//! - One repository per entity on top of that connection

pub mod config;
pub mod domain;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use domain::{
    Book, BookAction, BookError, BookStatus, ChatMessage, Chunk, Conversation, KeyStatement,
    MessageRole, SectionSummary,
};
pub use storage::{Database, StorageError};

/// Result type alias for Bookshelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Bookshelf operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Book error: {0}")]
    Book(#[from] BookError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_book(db: &Database) -> Result<Book> {
        storage::BookRepository::new(db)
            .get("ghost")?
            .ok_or_else(|| BookError::NotFound("Book not found: ghost".to_string()).into())
    }

    #[test]
    fn test_errors_convert_into_crate_error() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(missing_book(&db), Err(Error::Storage(_))));

        db.run_migrations(concat!(env!("CARGO_MANIFEST_DIR"), "/schema"))
            .unwrap();
        match missing_book(&db) {
            Err(Error::Book(BookError::NotFound(msg))) => assert!(msg.contains("ghost")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
