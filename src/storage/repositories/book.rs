use crate::domain::{Book, BookStatus};
use crate::storage::{Database, SqlRow, SqlValue, StorageError};

const BOOK_COLUMNS: &str =
    "id, title, status, current_page, embedding_provider, embedding_dimension, created_at, updated_at";

// A conflict updates the row in place. INSERT OR REPLACE would delete the old
// row first and the cascade would take the book's chunks and conversations with it.
const UPSERT_BOOK: &str = r#"
INSERT INTO books (id, title, status, current_page, embedding_provider, embedding_dimension, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    status = excluded.status,
    current_page = excluded.current_page,
    embedding_provider = excluded.embedding_provider,
    embedding_dimension = excluded.embedding_dimension,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

pub struct BookRepository<'a> {
    db: &'a Database,
}

impl<'a> BookRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert the book or overwrite every column of the existing row
    pub fn save(&self, book: &Book) -> Result<(), StorageError> {
        self.db.run(
            UPSERT_BOOK,
            &[
                SqlValue::from(book.id()),
                SqlValue::from(book.title()),
                SqlValue::from(book.status().as_str()),
                SqlValue::from(book.current_page()),
                SqlValue::from(book.embedding_provider()),
                SqlValue::from(book.embedding_dimension()),
                SqlValue::from(book.created_at()),
                SqlValue::from(book.updated_at()),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, book_id: &str) -> Result<Option<Book>, StorageError> {
        let rows = self.db.query(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            &[SqlValue::from(book_id)],
        )?;
        rows.first().map(row_to_book).transpose()
    }

    /// Like [`get`](Self::get) but a missing book is an error
    pub fn require(&self, book_id: &str) -> Result<Book, StorageError> {
        self.get(book_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Book not found: {}", book_id)))
    }

    /// All books, oldest first
    pub fn get_all(&self) -> Result<Vec<Book>, StorageError> {
        let rows = self.db.query(
            &format!("SELECT {} FROM books ORDER BY julianday(created_at), id", BOOK_COLUMNS),
            &[],
        )?;
        rows.iter().map(row_to_book).collect()
    }

    /// Delete a book; its chunks, conversations, messages and summaries go
    /// with it. Returns whether a row was removed.
    pub fn delete(&self, book_id: &str) -> Result<bool, StorageError> {
        let removed = self
            .db
            .run("DELETE FROM books WHERE id = ?1", &[SqlValue::from(book_id)])?;
        Ok(removed > 0)
    }
}

fn row_to_book(row: &SqlRow) -> Result<Book, StorageError> {
    let status: BookStatus = row
        .text(2)?
        .parse()
        .map_err(|e| StorageError::corrupted_row("book", e))?;

    Ok(Book::from_row(
        row.text(0)?.to_string(),
        row.text(1)?.to_string(),
        status,
        row.u32(3)?,
        row.opt_text(4)?.map(str::to_string),
        row.opt_u32(5)?,
        row.timestamp(6)?,
        row.timestamp(7)?,
    ))
}
