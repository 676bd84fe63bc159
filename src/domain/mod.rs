//! Domain entities
//!
//! Entities validate their own invariants on construction and mutation;
//! nothing here touches the database.

pub mod book;
pub mod chat;
pub mod chunk;
pub mod conversation;
pub mod error;
pub mod summary;

pub use book::{Book, BookAction, BookStatus};
pub use chat::{ChatMessage, MessageRole};
pub use chunk::Chunk;
pub use conversation::Conversation;
pub use error::BookError;
pub use summary::{KeyStatement, SectionSummary};
