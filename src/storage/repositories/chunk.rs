use crate::domain::Chunk;
use crate::storage::{Database, SqlRow, SqlValue, StorageError};

const CHUNK_COLUMNS: &str = "id, book_id, content, start_page, end_page, chunk_index, created_at";

const INSERT_CHUNK: &str = r#"
INSERT INTO chunks (id, book_id, content, start_page, end_page, chunk_index, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub struct ChunkRepository<'a> {
    db: &'a Database,
}

impl<'a> ChunkRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a batch of chunks for one book. Either every chunk is stored
    /// or none is.
    pub fn save_chunks(&self, book_id: &str, chunks: &[Chunk]) -> Result<(), StorageError> {
        if let Some(stray) = chunks.iter().find(|c| c.book_id() != book_id) {
            return Err(StorageError::write_failed(
                INSERT_CHUNK,
                format!(
                    "chunk {} belongs to book {}, not {}",
                    stray.id(),
                    stray.book_id(),
                    book_id
                ),
            ));
        }

        self.db.transaction(|tx| -> Result<(), StorageError> {
            for chunk in chunks {
                tx.run(
                    INSERT_CHUNK,
                    &[
                        SqlValue::from(chunk.id()),
                        SqlValue::from(book_id),
                        SqlValue::from(chunk.content()),
                        SqlValue::from(chunk.start_page()),
                        SqlValue::from(chunk.end_page()),
                        SqlValue::from(chunk.chunk_index()),
                        SqlValue::from(chunk.created_at()),
                    ],
                )?;
            }
            Ok(())
        })?;

        tracing::debug!("Saved {} chunks for book {}", chunks.len(), book_id);
        Ok(())
    }

    /// Chunks of a book in reading order
    pub fn get_by_book(&self, book_id: &str) -> Result<Vec<Chunk>, StorageError> {
        let rows = self.db.query(
            &format!(
                "SELECT {} FROM chunks WHERE book_id = ?1 ORDER BY chunk_index",
                CHUNK_COLUMNS
            ),
            &[SqlValue::from(book_id)],
        )?;
        rows.iter().map(row_to_chunk).collect()
    }

    /// Chunks that start on or before `page`, in reading order
    pub fn get_up_to_page(&self, book_id: &str, page: u32) -> Result<Vec<Chunk>, StorageError> {
        let rows = self.db.query(
            &format!(
                "SELECT {} FROM chunks WHERE book_id = ?1 AND start_page <= ?2 ORDER BY chunk_index",
                CHUNK_COLUMNS
            ),
            &[SqlValue::from(book_id), SqlValue::from(page)],
        )?;
        rows.iter().map(row_to_chunk).collect()
    }

    pub fn count_by_book(&self, book_id: &str) -> Result<usize, StorageError> {
        let rows = self.db.query(
            "SELECT COUNT(*) FROM chunks WHERE book_id = ?1",
            &[SqlValue::from(book_id)],
        )?;
        match rows.first() {
            Some(row) => Ok(row.u32(0)? as usize),
            None => Ok(0),
        }
    }

    /// Returns the number of chunks removed
    pub fn delete_by_book(&self, book_id: &str) -> Result<usize, StorageError> {
        self.db
            .run("DELETE FROM chunks WHERE book_id = ?1", &[SqlValue::from(book_id)])
    }
}

fn row_to_chunk(row: &SqlRow) -> Result<Chunk, StorageError> {
    Ok(Chunk::from_row(
        row.text(0)?.to_string(),
        row.text(1)?.to_string(),
        row.text(2)?.to_string(),
        row.u32(3)?,
        row.u32(4)?,
        row.u32(5)?,
        row.timestamp(6)?,
    ))
}
