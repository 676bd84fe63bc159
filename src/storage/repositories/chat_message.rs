use crate::domain::{ChatMessage, MessageRole};
use crate::storage::{Database, SqlRow, SqlValue, StorageError};

const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, created_at";

pub struct ChatMessageRepository<'a> {
    db: &'a Database,
}

impl<'a> ChatMessageRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a message. Messages are never updated, so a repeated id fails.
    pub fn save(&self, message: &ChatMessage) -> Result<(), StorageError> {
        self.db.run(
            "INSERT INTO chat_messages (id, conversation_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            &[
                SqlValue::from(message.id()),
                SqlValue::from(message.conversation_id()),
                SqlValue::from(message.role().as_str()),
                SqlValue::from(message.content()),
                SqlValue::from(message.created_at()),
            ],
        )?;
        Ok(())
    }

    /// Messages in the order they were written
    pub fn get_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, StorageError> {
        let rows = self.db.query(
            &format!(
                "SELECT {} FROM chat_messages WHERE conversation_id = ?1 ORDER BY julianday(created_at) ASC, rowid ASC",
                MESSAGE_COLUMNS
            ),
            &[SqlValue::from(conversation_id)],
        )?;
        rows.iter().map(row_to_message).collect()
    }

    pub fn delete_by_conversation(&self, conversation_id: &str) -> Result<usize, StorageError> {
        self.db.run(
            "DELETE FROM chat_messages WHERE conversation_id = ?1",
            &[SqlValue::from(conversation_id)],
        )
    }
}

fn row_to_message(row: &SqlRow) -> Result<ChatMessage, StorageError> {
    let role: MessageRole = row
        .text(2)?
        .parse()
        .map_err(|e| StorageError::corrupted_row("chat message", e))?;

    Ok(ChatMessage::from_row(
        row.text(0)?.to_string(),
        row.text(1)?.to_string(),
        role,
        row.text(3)?.to_string(),
        row.timestamp(4)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Book, Conversation};
    use crate::storage::{test_database, BookRepository, ConversationRepository};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, minute, 0).unwrap()
    }

    fn setup() -> Database {
        let db = test_database();
        BookRepository::new(&db)
            .save(&Book::new("b1", "Test").unwrap().with_timestamps(at(0), at(0)))
            .unwrap();
        let conversations = ConversationRepository::new(&db);
        for id in ["conv1", "conv2"] {
            conversations
                .save(&Conversation::new(id, "b1", "Questions").unwrap().with_created_at(at(0)))
                .unwrap();
        }
        db
    }

    fn message(id: &str, conv: &str, role: MessageRole, minute: u32) -> ChatMessage {
        ChatMessage::new(id, conv, role, format!("body of {}", id)).with_created_at(at(minute))
    }

    #[test]
    fn test_messages_replay_chronologically() {
        let db = setup();
        let repo = ChatMessageRepository::new(&db);
        repo.save(&message("m3", "conv1", MessageRole::ToolResult, 3)).unwrap();
        repo.save(&message("m1", "conv1", MessageRole::User, 1)).unwrap();
        repo.save(&message("m2", "conv1", MessageRole::Assistant, 2)).unwrap();

        let stored = repo.get_by_conversation("conv1").unwrap();
        let ids: Vec<&str> = stored.iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(stored[2].role(), MessageRole::ToolResult);
        assert_eq!(stored[0], message("m1", "conv1", MessageRole::User, 1));
    }

    #[test]
    fn test_same_timestamp_keeps_insertion_order() {
        let db = setup();
        let repo = ChatMessageRepository::new(&db);
        repo.save(&message("b", "conv1", MessageRole::User, 5)).unwrap();
        repo.save(&message("a", "conv1", MessageRole::Assistant, 5)).unwrap();

        let ids: Vec<String> = repo
            .get_by_conversation("conv1")
            .unwrap()
            .iter()
            .map(|m| m.id().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_legacy_timestamp_sorts_between_iso_rows() {
        let db = setup();
        db.run(
            "INSERT INTO chat_messages (id, conversation_id, role, content, created_at) \
             VALUES ('legacy', 'conv1', 'assistant', 'written by an older build', '2025-01-15 10:30:00')",
            &[],
        )
        .unwrap();
        let repo = ChatMessageRepository::new(&db);
        repo.save(&message("late", "conv1", MessageRole::User, 59)).unwrap();
        repo.save(&message("early", "conv1", MessageRole::User, 1)).unwrap();

        let stored = repo.get_by_conversation("conv1").unwrap();
        let ids: Vec<&str> = stored.iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["early", "legacy", "late"]);
        assert_eq!(stored[1].created_at(), at(30));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let db = setup();
        let repo = ChatMessageRepository::new(&db);
        repo.save(&message("m1", "conv1", MessageRole::User, 1)).unwrap();

        let result = repo.save(&message("m1", "conv1", MessageRole::Assistant, 2));
        assert!(matches!(result, Err(StorageError::WriteFailed { .. })));

        let stored = repo.get_by_conversation("conv1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].role(), MessageRole::User);
    }

    #[test]
    fn test_delete_by_conversation_is_scoped() {
        let db = setup();
        let repo = ChatMessageRepository::new(&db);
        repo.save(&message("m1", "conv1", MessageRole::User, 1)).unwrap();
        repo.save(&message("m2", "conv1", MessageRole::Assistant, 2)).unwrap();
        repo.save(&message("m3", "conv2", MessageRole::User, 3)).unwrap();

        assert_eq!(repo.delete_by_conversation("conv1").unwrap(), 2);
        assert!(repo.get_by_conversation("conv1").unwrap().is_empty());
        assert_eq!(repo.get_by_conversation("conv2").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_conversation_is_rejected() {
        let db = setup();
        let repo = ChatMessageRepository::new(&db);
        assert!(repo.save(&message("m1", "nope", MessageRole::User, 1)).is_err());
    }
}
