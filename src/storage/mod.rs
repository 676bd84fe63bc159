//! Storage Layer - SQLite-backed persistence
//!
//! Tables are owned by the migration files under `schema/`:
//! - books(id, title, status, current_page, embedding_provider, embedding_dimension, created_at, updated_at)
//! - chunks(id, book_id, content, start_page, end_page, chunk_index, created_at)
//! - conversations(id, book_id, title, created_at)
//! - chat_messages(id, conversation_id, role, content, created_at)
//! - section_summaries(id, book_id, title, start_page, end_page, summary, key_statements, section_index, created_at)
//!
//! Every child table cascades on delete from its parent.

pub mod database;
pub mod error;
pub mod migrate;
pub mod repositories;
pub mod time;
pub mod value;

pub use database::Database;
pub use error::StorageError;
pub use migrate::{AppliedMigration, MigrationFile};
pub use repositories::{
    BookRepository, ChatMessageRepository, ChunkRepository, ConversationRepository,
    SectionSummaryRepository,
};
pub use value::{SqlRow, SqlValue};

/// Migrations shipped with the crate
#[cfg(test)]
pub(crate) fn test_database() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.run_migrations(concat!(env!("CARGO_MANIFEST_DIR"), "/schema"))
        .unwrap();
    db
}
