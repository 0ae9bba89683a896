use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};

/// Highest schema version this build knows how to migrate to.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Open (or create) the database at `path` and bring its schema up to
/// `CURRENT_SCHEMA_VERSION`, running any pending migrations in order.
///
/// Safe to call on every startup — every migration step uses `IF NOT EXISTS`
/// and is itself idempotent.
pub fn open_and_migrate(path: &str) -> Result<Connection> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    migrate(&conn)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<()> {
    create_schema_meta(conn)?;
    let version = schema_version(conn)?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found: version,
            max: CURRENT_SCHEMA_VERSION,
        });
    }

    if version < 1 {
        info!("longmem-store: applying migration 1 (base schema)");
        migration_1_base_schema(conn)?;
        set_schema_version(conn, 1)?;
    }

    Ok(())
}

fn create_schema_meta(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn schema_version(conn: &Connection) -> Result<i64> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .ok();
    Ok(v.and_then(|s| s.parse().ok()).unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_meta (key, value) VALUES ('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::params![version.to_string()],
    )?;
    Ok(())
}

fn migration_1_base_schema(conn: &Connection) -> Result<()> {
    create_memories_table(conn)?;
    create_vector_index(conn)?;
    create_fts_index(conn)?;
    create_turns_table(conn)?;
    create_profile_table(conn)?;
    Ok(())
}

fn create_memories_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS memories (
            id             TEXT PRIMARY KEY,
            type           TEXT NOT NULL,
            category       TEXT NOT NULL DEFAULT '',
            key            TEXT NOT NULL,
            value          TEXT NOT NULL,
            source_turn    INTEGER NOT NULL,
            confidence     REAL NOT NULL DEFAULT 0.9,
            created_at     REAL NOT NULL,
            updated_at     REAL NOT NULL,
            is_active      INTEGER NOT NULL DEFAULT 1,
            last_used_turn INTEGER NOT NULL DEFAULT 0
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_memories_active_key
            ON memories(key) WHERE is_active = 1;
        CREATE INDEX IF NOT EXISTS idx_memories_active
            ON memories(is_active);",
    )?;
    Ok(())
}

/// Embedded vector index — a dedicated table of (id, embedding blob) rather
/// than a federated vector database, so the whole store stays one file on
/// local disk with no external service to stand up. Nearest-neighbor search
/// is a brute-force scan over active rows (see `MemoryStore::search_vector`);
/// correct and fast enough at the scale one conversation's memory set
/// reaches.
fn create_vector_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS memories_vec (
            id        TEXT PRIMARY KEY REFERENCES memories(id),
            embedding BLOB NOT NULL
        );",
    )?;
    Ok(())
}

/// FTS5 virtual table over `memories`, using the external-content pattern
/// keyed off `memories`' hidden rowid (its declared primary key is TEXT, so
/// it can't alias rowid itself). SQLite doesn't maintain an external-content
/// index automatically — every insert/update/expire in `MemoryStore` issues
/// the matching `memories_fts(memories_fts, ...) VALUES ('delete', ...)` and
/// re-insert pair to keep it in step.
fn create_fts_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts
            USING fts5(key, value, category, content='memories', content_rowid='rowid');",
    )?;
    Ok(())
}

fn create_turns_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS turns (
            turn_id            INTEGER PRIMARY KEY,
            role               TEXT NOT NULL,
            content            TEXT NOT NULL,
            timestamp          REAL NOT NULL,
            memories_retrieved TEXT NOT NULL DEFAULT '[]'
        );",
    )?;
    Ok(())
}

fn create_profile_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS profile (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at REAL NOT NULL,
            source_turn INTEGER NOT NULL
        );",
    )?;
    Ok(())
}
