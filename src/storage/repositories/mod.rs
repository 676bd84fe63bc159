//! Entity repositories
//!
//! Each repository borrows an open, migrated [`Database`](super::Database)
//! and maps one entity to rows. Columns are always selected in a fixed order
//! and decoded positionally.

pub mod book;
pub mod chat_message;
pub mod chunk;
pub mod conversation;
pub mod summary;

pub use book::BookRepository;
pub use chat_message::ChatMessageRepository;
pub use chunk::ChunkRepository;
pub use conversation::ConversationRepository;
pub use summary::SectionSummaryRepository;
