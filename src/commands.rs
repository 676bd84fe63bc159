use crate::{emit_success, OutputMode};
use bookshelf::config::{self, Settings};
use bookshelf::storage::{
    migrate, BookRepository, ChatMessageRepository, ChunkRepository, ConversationRepository,
    Database, SectionSummaryRepository, StorageError,
};
use bookshelf::ui::{self, BookRow, Icons, MigrationRow};
use bookshelf::{Book, BookError, BookStatus, MessageRole};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

fn connect(settings: &Settings) -> anyhow::Result<Database> {
    config::ensure_db_dir(&settings.database)?;
    Ok(Database::open(&settings.database)?)
}

/// Open the database and bring its schema up to date
fn open_migrated(settings: &Settings) -> anyhow::Result<Database> {
    let db = connect(settings)?;
    db.run_migrations(&settings.schema_dir)?;
    Ok(db)
}

fn require_book(db: &Database, book_id: &str) -> bookshelf::Result<Book> {
    BookRepository::new(db)
        .get(book_id)?
        .ok_or_else(|| BookError::NotFound(format!("Book not found: {}", book_id)).into())
}

fn book_json(book: &Book, chunks: usize) -> serde_json::Value {
    json!({
        "id": book.id(),
        "title": book.title(),
        "status": book.status(),
        "current_page": book.current_page(),
        "embedding_provider": book.embedding_provider(),
        "embedding_dimension": book.embedding_dimension(),
        "chunks": chunks,
        "created_at": book.created_at(),
        "updated_at": book.updated_at(),
    })
}

pub fn run_init(
    config_path: &Path,
    settings: &Settings,
    force: bool,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    config::write_config(config_path, &settings.to_config(), force)?;
    let db = open_migrated(settings)?;
    let applied = db.applied_migrations()?;

    if output_mode.is_human() {
        ui::success(&format!("Wrote {}", config_path.display()));
        ui::status(Icons::DATABASE, "Database", &settings.database.display().to_string());
        ui::status(Icons::SCROLL, "Schema version", &latest_version(&applied));
    } else {
        emit_success(
            output_mode,
            "init",
            json!({
                "config": config_path.display().to_string(),
                "database": settings.database.display().to_string(),
                "migrations": applied.len(),
            }),
        )?;
    }
    Ok(())
}

fn latest_version(applied: &[bookshelf::storage::AppliedMigration]) -> String {
    applied
        .last()
        .map(|m| format!("{:03}", m.version))
        .unwrap_or_else(|| "none".to_string())
}

pub fn run_migrate(settings: &Settings, output_mode: OutputMode) -> anyhow::Result<()> {
    let db = connect(settings)?;
    let applied = db.run_migrations(&settings.schema_dir)?;

    if output_mode.is_human() {
        if applied.is_empty() {
            ui::success("Schema is up to date");
        } else {
            for file in &applied {
                println!("{} {}", Icons::SCROLL, file.name);
            }
            ui::success(&format!("Applied {} migration(s)", applied.len()));
        }
    } else {
        let names: Vec<&str> = applied.iter().map(|f| f.name.as_str()).collect();
        emit_success(output_mode, "migrate", json!({ "applied": names }))?;
    }
    Ok(())
}

/// Report applied and pending migrations without touching the database
pub fn run_status(settings: &Settings, output_mode: OutputMode) -> anyhow::Result<()> {
    let (applied, pending) = if settings.database.exists() {
        let db = Database::open_read_only(&settings.database)?;
        (db.applied_migrations()?, db.pending_migrations(&settings.schema_dir)?)
    } else {
        tracing::debug!("{} does not exist yet", settings.database.display());
        (Vec::new(), migrate::discover_migrations(&settings.schema_dir)?)
    };

    if output_mode.is_human() {
        ui::header("Migration status");
        ui::status(Icons::DATABASE, "Database", &settings.database.display().to_string());
        ui::status(Icons::GEAR, "Schema dir", &settings.schema_dir.display().to_string());

        let rows: Vec<MigrationRow> = applied
            .iter()
            .map(MigrationRow::from)
            .chain(pending.iter().map(MigrationRow::from))
            .collect();
        if !rows.is_empty() {
            println!("{}", ui::migration_table(&rows));
        }

        if pending.is_empty() {
            ui::success("Schema is up to date");
        } else {
            ui::warn(&format!("{} migration(s) pending, run `bookshelf migrate`", pending.len()));
        }
    } else {
        let applied_json: Vec<_> = applied
            .iter()
            .map(|m| json!({ "version": m.version, "name": m.name, "applied_at": m.applied_at }))
            .collect();
        let pending_json: Vec<_> = pending
            .iter()
            .map(|f| json!({ "version": f.version, "name": f.name }))
            .collect();
        emit_success(
            output_mode,
            "status",
            json!({ "applied": applied_json, "pending": pending_json }),
        )?;
    }
    Ok(())
}

pub fn run_books(settings: &Settings, output_mode: OutputMode) -> anyhow::Result<()> {
    let db = open_migrated(settings)?;
    let chunks = ChunkRepository::new(&db);

    let mut listing = Vec::new();
    for book in BookRepository::new(&db).get_all()? {
        let count = chunks.count_by_book(book.id())?;
        listing.push((book, count));
    }

    if output_mode.is_human() {
        if listing.is_empty() {
            println!("{}", ui::muted("No books yet."));
            return Ok(());
        }
        let rows: Vec<BookRow> = listing
            .iter()
            .map(|(book, count)| BookRow::new(book, *count))
            .collect();
        println!("{}", ui::book_table(&rows));

        let total_chunks: usize = listing.iter().map(|(_, count)| count).sum();
        let ready = listing
            .iter()
            .filter(|(book, _)| book.status() == BookStatus::Ready)
            .count();
        let (books, ready, total_chunks) = (
            listing.len().to_string(),
            ready.to_string(),
            total_chunks.to_string(),
        );
        println!(
            "{}",
            ui::stats_table(&[
                ("Books", books.as_str()),
                ("Ready", ready.as_str()),
                ("Chunks", total_chunks.as_str()),
            ])
        );
    } else {
        let data: Vec<_> = listing
            .iter()
            .map(|(book, count)| book_json(book, *count))
            .collect();
        emit_success(output_mode, "books", json!(data))?;
    }
    Ok(())
}

pub fn run_show(settings: &Settings, book_id: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let db = open_migrated(settings)?;
    let book = require_book(&db, book_id)?;
    let chunk_count = ChunkRepository::new(&db).count_by_book(book_id)?;
    let conversations = ConversationRepository::new(&db).get_by_book(book_id)?;
    let summaries = SectionSummaryRepository::new(&db).get_by_book(book_id)?;

    if !output_mode.is_human() {
        let mut data = book_json(&book, chunk_count);
        data["conversations"] = json!(conversations);
        data["summaries"] = json!(summaries);
        return emit_success(output_mode, "show", data);
    }

    let theme = ui::theme();
    println!("{} {}", Icons::BOOK, book.title().style(theme.header.clone()));
    ui::info("ID", book.id());
    ui::info(
        "Status",
        &book.status().as_str().style(theme.for_status(book.status())).to_string(),
    );
    ui::info("Page", &book.current_page().to_string());
    ui::info("Chunks", &chunk_count.to_string());
    let embeddings = match (book.embedding_provider(), book.embedding_dimension()) {
        (Some(provider), Some(dimension)) => format!("{} ({} dims)", provider, dimension),
        (Some(provider), None) => provider.to_string(),
        _ => ui::muted("none"),
    };
    ui::info("Embeddings", &embeddings);
    ui::info("Created", &book.created_at().format("%Y-%m-%d %H:%M").to_string());
    ui::info("Updated", &book.updated_at().format("%Y-%m-%d %H:%M").to_string());

    if !summaries.is_empty() {
        ui::section("Sections");
        for summary in &summaries {
            ui::summary_row(
                &format!("pp. {}-{}", summary.start_page(), summary.end_page()),
                summary.title(),
            );
        }
    }

    if !conversations.is_empty() {
        ui::section("Conversations");
        for conversation in &conversations {
            println!(
                "{} {} {}",
                Icons::CHAT,
                conversation.title(),
                ui::dim(conversation.id())
            );
        }
    }
    Ok(())
}

pub fn run_conversations(
    settings: &Settings,
    book_id: &str,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let db = open_migrated(settings)?;
    let book = require_book(&db, book_id)?;
    let conversations = ConversationRepository::new(&db).get_by_book(book_id)?;

    if output_mode.is_human() {
        ui::header(&format!("Conversations about {}", book.title()));
        if conversations.is_empty() {
            println!("{}", ui::muted("No conversations yet."));
        }
        for conversation in &conversations {
            println!(
                "{} {} {} {}",
                Icons::CHAT,
                conversation.title(),
                ui::dim(conversation.id()),
                ui::muted(&conversation.created_at().format("%Y-%m-%d %H:%M").to_string())
            );
        }
    } else {
        emit_success(output_mode, "conversations", json!(conversations))?;
    }
    Ok(())
}

pub fn run_history(
    settings: &Settings,
    conversation_id: &str,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let db = open_migrated(settings)?;
    let conversation = ConversationRepository::new(&db)
        .get(conversation_id)?
        .ok_or_else(|| {
            StorageError::NotFound(format!("Conversation not found: {}", conversation_id))
        })?;
    let messages = ChatMessageRepository::new(&db).get_by_conversation(conversation_id)?;

    if output_mode.is_human() {
        ui::header(conversation.title());
        let theme = ui::theme();
        for message in &messages {
            let icon = match message.role() {
                MessageRole::User => Icons::PERSON,
                MessageRole::Assistant => Icons::ROBOT,
                MessageRole::ToolResult => Icons::WRENCH,
            };
            println!(
                "{} {} {}",
                icon,
                message.role().as_str().style(theme.for_role(message.role())),
                ui::muted(&message.created_at().format("%H:%M:%S").to_string())
            );
            for line in message.content().lines() {
                println!("   {}", line);
            }
        }
        if messages.is_empty() {
            println!("{}", ui::muted("No messages yet."));
        }
    } else {
        emit_success(
            output_mode,
            "history",
            json!({ "conversation": conversation, "messages": messages }),
        )?;
    }
    Ok(())
}

pub fn run_delete(settings: &Settings, book_id: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let db = open_migrated(settings)?;
    if !BookRepository::new(&db).delete(book_id)? {
        return Err(BookError::NotFound(format!("Book not found: {}", book_id)).into());
    }

    if output_mode.is_human() {
        println!("{} Deleted book {}", Icons::DEL, book_id);
    } else {
        emit_success(output_mode, "delete", json!({ "id": book_id }))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf::Chunk;
    use std::path::PathBuf;

    fn settings(dir: &tempfile::TempDir) -> Settings {
        Settings::resolve(
            None,
            Some(dir.path().join("data").join("books.db")),
            Some(PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/schema"))),
        )
    }

    fn seed(settings: &Settings) {
        let db = open_migrated(settings).unwrap();
        BookRepository::new(&db)
            .save(&Book::new("b1", "Moby Dick").unwrap())
            .unwrap();
        ChunkRepository::new(&db)
            .save_chunks("b1", &[Chunk::new("c1", "b1", "Call me Ishmael.", 1, 1, 0).unwrap()])
            .unwrap();
    }

    #[test]
    fn test_init_refuses_to_overwrite_config() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config_path = dir.path().join("bookshelf.toml");

        run_init(&config_path, &settings, false, OutputMode::Json).unwrap();
        assert!(config_path.exists());
        assert!(settings.database.exists());

        assert!(run_init(&config_path, &settings, false, OutputMode::Json).is_err());
        run_init(&config_path, &settings, true, OutputMode::Json).unwrap();
    }

    #[test]
    fn test_status_then_migrate() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);

        run_status(&settings, OutputMode::Json).unwrap();
        let db_dir = settings.database.parent().unwrap();
        assert!(!db_dir.exists());

        run_migrate(&settings, OutputMode::Json).unwrap();
        run_status(&settings, OutputMode::Json).unwrap();
        let db = connect(&settings).unwrap();
        assert!(db.pending_migrations(&settings.schema_dir).unwrap().is_empty());
    }

    #[test]
    fn test_status_leaves_unmigrated_database_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        config::ensure_db_dir(&settings.database).unwrap();
        drop(Database::open(&settings.database).unwrap());

        run_status(&settings, OutputMode::Json).unwrap();

        let db = Database::open(&settings.database).unwrap();
        assert!(db.applied_migrations().unwrap().is_empty());
        let tables = db
            .query("SELECT name FROM sqlite_master WHERE type = 'table'", &[])
            .unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_delete_missing_book_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);

        let err = run_delete(&settings, "ghost", OutputMode::Json).unwrap_err();
        assert!(matches!(err.downcast_ref::<BookError>(), Some(BookError::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_book_and_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        seed(&settings);

        run_delete(&settings, "b1", OutputMode::Json).unwrap();

        let db = open_migrated(&settings).unwrap();
        assert_eq!(BookRepository::new(&db).get("b1").unwrap(), None);
        assert_eq!(ChunkRepository::new(&db).count_by_book("b1").unwrap(), 0);
    }

    #[test]
    fn test_read_commands_on_seeded_database() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        seed(&settings);

        run_books(&settings, OutputMode::Json).unwrap();
        run_show(&settings, "b1", OutputMode::Json).unwrap();
        run_conversations(&settings, "b1", OutputMode::Json).unwrap();
        assert!(run_show(&settings, "nope", OutputMode::Json).is_err());
        assert!(run_history(&settings, "nope", OutputMode::Json).is_err());
    }

    #[test]
    fn test_show_missing_book_surfaces_crate_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);

        let err = run_show(&settings, "ghost", OutputMode::Json).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<bookshelf::Error>(),
            Some(bookshelf::Error::Book(BookError::NotFound(_)))
        ));

        let db = open_migrated(&settings).unwrap();
        db.execute("DROP TABLE books").unwrap();
        assert!(matches!(
            require_book(&db, "ghost"),
            Err(bookshelf::Error::Storage(StorageError::WriteFailed { .. }))
        ));
    }
}
