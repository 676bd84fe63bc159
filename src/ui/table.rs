use crate::domain::Book;
use crate::storage::{AppliedMigration, MigrationFile};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        render(&self.rows)
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
pub struct BookRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Chunks")]
    pub chunks: usize,
    #[tabled(rename = "Page")]
    pub page: u32,
}

impl BookRow {
    pub fn new(book: &Book, chunks: usize) -> Self {
        Self {
            id: book.id().to_string(),
            title: book.title().to_string(),
            status: book.status().to_string(),
            chunks,
            page: book.current_page(),
        }
    }
}

pub fn book_table(rows: &[BookRow]) -> String {
    render(rows)
}

#[derive(Tabled)]
pub struct MigrationRow {
    #[tabled(rename = "Version")]
    pub version: i64,
    #[tabled(rename = "File")]
    pub name: String,
    #[tabled(rename = "Applied")]
    pub applied: String,
}

impl From<&AppliedMigration> for MigrationRow {
    fn from(m: &AppliedMigration) -> Self {
        Self {
            version: m.version,
            name: m.name.clone(),
            applied: m.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&MigrationFile> for MigrationRow {
    fn from(m: &MigrationFile) -> Self {
        Self {
            version: m.version,
            name: m.name.clone(),
            applied: "pending".to_string(),
        }
    }
}

pub fn migration_table(rows: &[MigrationRow]) -> String {
    render(rows)
}

fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}
