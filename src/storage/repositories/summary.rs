use crate::domain::{KeyStatement, SectionSummary};
use crate::storage::{Database, SqlRow, SqlValue, StorageError};

const SUMMARY_COLUMNS: &str =
    "id, book_id, title, start_page, end_page, summary, key_statements, section_index, created_at";

const INSERT_SUMMARY: &str = r#"
INSERT INTO section_summaries (id, book_id, title, start_page, end_page, summary, key_statements, section_index, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

pub struct SectionSummaryRepository<'a> {
    db: &'a Database,
}

impl<'a> SectionSummaryRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Replace every summary of a book with `summaries` in one transaction
    pub fn save_all(&self, book_id: &str, summaries: &[SectionSummary]) -> Result<(), StorageError> {
        let encoded = summaries
            .iter()
            .map(|s| {
                serde_json::to_string(s.key_statements())
                    .map_err(|e| StorageError::write_failed(INSERT_SUMMARY, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.db.transaction(|tx| -> Result<(), StorageError> {
            tx.run(
                "DELETE FROM section_summaries WHERE book_id = ?1",
                &[SqlValue::from(book_id)],
            )?;
            for (summary, key_statements) in summaries.iter().zip(encoded) {
                tx.run(
                    INSERT_SUMMARY,
                    &[
                        SqlValue::from(summary.id()),
                        SqlValue::from(book_id),
                        SqlValue::from(summary.title()),
                        SqlValue::from(summary.start_page()),
                        SqlValue::from(summary.end_page()),
                        SqlValue::from(summary.summary()),
                        SqlValue::from(key_statements),
                        SqlValue::from(summary.section_index()),
                        SqlValue::from(summary.created_at()),
                    ],
                )?;
            }
            Ok(())
        })?;

        tracing::debug!("Stored {} section summaries for book {}", summaries.len(), book_id);
        Ok(())
    }

    /// Summaries of a book in section order
    pub fn get_by_book(&self, book_id: &str) -> Result<Vec<SectionSummary>, StorageError> {
        let rows = self.db.query(
            &format!(
                "SELECT {} FROM section_summaries WHERE book_id = ?1 ORDER BY section_index",
                SUMMARY_COLUMNS
            ),
            &[SqlValue::from(book_id)],
        )?;
        rows.iter().map(row_to_summary).collect()
    }

    pub fn delete_by_book(&self, book_id: &str) -> Result<usize, StorageError> {
        self.db.run(
            "DELETE FROM section_summaries WHERE book_id = ?1",
            &[SqlValue::from(book_id)],
        )
    }
}

fn row_to_summary(row: &SqlRow) -> Result<SectionSummary, StorageError> {
    let key_statements: Vec<KeyStatement> = serde_json::from_str(row.text(6)?)
        .map_err(|e| StorageError::corrupted_row("section summary", e))?;

    Ok(SectionSummary::from_row(
        row.text(0)?.to_string(),
        row.text(1)?.to_string(),
        row.text(2)?.to_string(),
        row.u32(3)?,
        row.u32(4)?,
        row.text(5)?.to_string(),
        key_statements,
        row.u32(7)?,
        row.timestamp(8)?,
    ))
}
