use crate::domain::Conversation;
use crate::storage::{Database, SqlRow, SqlValue, StorageError};

const CONVERSATION_COLUMNS: &str = "id, book_id, title, created_at";

const UPSERT_CONVERSATION: &str = r#"
INSERT INTO conversations (id, book_id, title, created_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(id) DO UPDATE SET
    book_id = excluded.book_id,
    title = excluded.title,
    created_at = excluded.created_at
"#;

pub struct ConversationRepository<'a> {
    db: &'a Database,
}

impl<'a> ConversationRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert or overwrite. Existing messages stay attached.
    pub fn save(&self, conversation: &Conversation) -> Result<(), StorageError> {
        self.db.run(
            UPSERT_CONVERSATION,
            &[
                SqlValue::from(conversation.id()),
                SqlValue::from(conversation.book_id()),
                SqlValue::from(conversation.title()),
                SqlValue::from(conversation.created_at()),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, conversation_id: &str) -> Result<Option<Conversation>, StorageError> {
        let rows = self.db.query(
            &format!(
                "SELECT {} FROM conversations WHERE id = ?1",
                CONVERSATION_COLUMNS
            ),
            &[SqlValue::from(conversation_id)],
        )?;
        rows.first().map(row_to_conversation).transpose()
    }

    /// Conversations about a book, newest first
    pub fn get_by_book(&self, book_id: &str) -> Result<Vec<Conversation>, StorageError> {
        let rows = self.db.query(
            &format!(
                "SELECT {} FROM conversations WHERE book_id = ?1 ORDER BY julianday(created_at) DESC, rowid DESC",
                CONVERSATION_COLUMNS
            ),
            &[SqlValue::from(book_id)],
        )?;
        rows.iter().map(row_to_conversation).collect()
    }

    /// Delete a conversation and its messages
    pub fn delete(&self, conversation_id: &str) -> Result<bool, StorageError> {
        let removed = self.db.run(
            "DELETE FROM conversations WHERE id = ?1",
            &[SqlValue::from(conversation_id)],
        )?;
        Ok(removed > 0)
    }
}

fn row_to_conversation(row: &SqlRow) -> Result<Conversation, StorageError> {
    Ok(Conversation::from_row(
        row.text(0)?.to_string(),
        row.text(1)?.to_string(),
        row.text(2)?.to_string(),
        row.timestamp(3)?,
    ))
}
