use std::sync::Mutex;

use rusqlite::{params, OptionalExtension};
use tracing::{debug, info, warn};

use longmem_core::stopwords::strip_stopwords;
use longmem_core::types::{Memory, MemoryType, ProfileEntry, Role, TurnRecord};

use crate::db;
use crate::error::{Result, StoreError};

/// Fields required to create a new memory. The store assigns the id —
/// callers (the distiller, via the orchestrator) never choose it themselves,
/// keeping id generation a single responsibility.
pub struct NewMemory {
    pub mem_type: MemoryType,
    pub category: String,
    pub key: String,
    pub value: String,
    pub confidence: f64,
    pub source_turn: i64,
    pub created_at: f64,
}

/// Partial update applied to an existing memory. `None` fields are left
/// unchanged.
#[derive(Default)]
pub struct UpdateFields {
    pub value: Option<String>,
    pub confidence: Option<f64>,
}

/// Durable persistence of memories, embeddings, the FTS index, the turn log,
/// and the profile projection — one SQLite file, one process.
///
/// Thread-safe via a single `Mutex<Connection>`, mirroring the single-writer
/// model this core's concurrency section requires: the orchestrator
/// serializes all per-turn work, so lock contention here is a correctness
/// backstop, not a throughput concern.
pub struct MemoryStore {
    conn: Mutex<rusqlite::Connection>,
    dim: usize,
}

impl MemoryStore {
    /// Open or create the database at `path`, running forward migrations if
    /// the on-disk schema is older than this build expects.
    pub fn open(path: &str, dim: usize) -> Result<Self> {
        let conn = db::open_and_migrate(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            dim,
        })
    }

    pub fn embedding_dim(&self) -> usize {
        self.dim
    }

    /// Insert a new active memory, its embedding, and its FTS entry
    /// atomically. Fails with `DuplicateKey` if an active row with the same
    /// `key` already exists — the caller (orchestrator) is responsible for
    /// coalescing that into an update per the conflict-resolution rule.
    pub fn add(&self, fields: NewMemory, embedding: &[f32]) -> Result<String> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM memories WHERE key = ?1 AND is_active = 1",
                params![fields.key],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::DuplicateKey { key: fields.key });
        }

        let id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO memories
                (id, type, category, key, value, source_turn, confidence,
                 created_at, updated_at, is_active, last_used_turn)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, 1, 0)",
            params![
                id,
                fields.mem_type.to_string(),
                fields.category,
                fields.key,
                fields.value,
                fields.source_turn,
                fields.confidence,
                fields.created_at,
            ],
        )?;

        tx.execute(
            "INSERT INTO memories_vec (id, embedding) VALUES (?1, ?2)",
            params![id, encode_embedding(embedding)],
        )?;

        // `last_insert_rowid()` would reflect the `memories_vec` insert just
        // above, not `memories` — look the latter's rowid up explicitly
        // before syncing its FTS shadow.
        let memories_rowid: i64 = tx.query_row(
            "SELECT rowid FROM memories WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO memories_fts(rowid, key, value, category) VALUES (?1, ?2, ?3, ?4)",
            params![memories_rowid, fields.key, fields.value, fields.category],
        )?;

        tx.commit()?;
        debug!(id = %id, key = %fields.key, "store: memory added");
        Ok(id)
    }

    /// Mutate value/confidence/updated_at, optionally re-embed. Atomic across
    /// all three indexes.
    pub fn update(&self, id: &str, fields: UpdateFields, new_embedding: Option<&[f32]>, now: f64) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let (old_value, key, category, rowid): (String, String, String, i64) = tx
            .query_row(
                "SELECT value, key, category, rowid FROM memories WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let new_value = fields.value.unwrap_or(old_value);

        tx.execute(
            "UPDATE memories SET value = ?1, confidence = COALESCE(?2, confidence), updated_at = ?3 WHERE id = ?4",
            params![new_value, fields.confidence, now, id],
        )?;

        tx.execute(
            "INSERT INTO memories_fts(memories_fts, rowid, key, value, category)
             VALUES('delete', ?1, ?2, ?3, ?4)",
            params![rowid, key, old_value, category],
        )?;
        tx.execute(
            "INSERT INTO memories_fts(rowid, key, value, category) VALUES (?1, ?2, ?3, ?4)",
            params![rowid, key, new_value, category],
        )?;

        if let Some(emb) = new_embedding {
            tx.execute(
                "UPDATE memories_vec SET embedding = ?1 WHERE id = ?2",
                params![encode_embedding(emb), id],
            )?;
        }

        tx.commit()?;
        debug!(id = %id, "store: memory updated");
        Ok(())
    }

    /// Soft-delete: sets `is_active = 0`, removes the row from the vector and
    /// FTS indexes. The `memories` row itself is retained for audit.
    pub fn expire(&self, id: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let (key, value, category, rowid): (String, String, String, i64) = tx
            .query_row(
                "SELECT key, value, category, rowid FROM memories WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        tx.execute(
            "UPDATE memories SET is_active = 0 WHERE id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM memories_vec WHERE id = ?1", params![id])?;
        tx.execute(
            "INSERT INTO memories_fts(memories_fts, rowid, key, value, category)
             VALUES('delete', ?1, ?2, ?3, ?4)",
            params![rowid, key, value, category],
        )?;

        tx.commit()?;
        debug!(id = %id, "store: memory expired");
        Ok(())
    }

    /// `last_used_turn = max(current, turn_id)` — never decreases.
    pub fn touch(&self, id: &str, turn_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE memories SET last_used_turn = MAX(last_used_turn, ?1) WHERE id = ?2",
            params![turn_id, id],
        )?;
        Ok(())
    }

    /// K-nearest neighbors among active memories by ascending L2 distance.
    /// Brute-force scan — correct and fast enough at the scale one
    /// conversation's memory set reaches; see the vector index's doc comment
    /// in `db.rs` for why this isn't a federated ANN index.
    pub fn search_vector(&self, query_embedding: &[f32], k: usize) -> Result<Vec<(String, f64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT v.id, v.embedding FROM memories_vec v
             JOIN memories m ON m.id = v.id
             WHERE m.is_active = 1",
        )?;
        let mut scored: Vec<(String, f64)> = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob))
            })?
            .filter_map(|r| r.ok())
            .map(|(id, blob)| {
                let emb = decode_embedding(&blob);
                (id, l2_distance(query_embedding, &emb))
            })
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// Top-k BM25-style matches among active memories. The closed stopword
    /// list is stripped from the query before it reaches FTS5.
    pub fn search_fts(&self, query_text: &str, k: usize) -> Result<Vec<(String, f64)>> {
        let cleaned = strip_stopwords(query_text);
        if cleaned.trim().is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT m.id, bm25(memories_fts) AS score
             FROM memories_fts
             JOIN memories m ON m.rowid = memories_fts.rowid
             WHERE memories_fts MATCH ?1 AND m.is_active = 1
             ORDER BY score
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![fts_query(&cleaned), k as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn get_active(&self) -> Result<Vec<Memory>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, type, category, key, value, source_turn, confidence,
                    created_at, updated_at, is_active, last_used_turn
             FROM memories WHERE is_active = 1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_memory)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Memory>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, type, category, key, value, source_turn, confidence,
                    created_at, updated_at, is_active, last_used_turn
             FROM memories WHERE id = ?1",
            params![id],
            row_to_memory,
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn active_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM memories WHERE is_active = 1", [], |row| row.get(0))
            .map_err(StoreError::from)
    }

    /// Appends an immutable turn record, assigning it the next dense,
    /// strictly-increasing `turn_id` itself. The store owns this counter —
    /// not the caller — so that a user-message row and its paired
    /// assistant-reply row, logged back to back within the same
    /// conversational turn, get distinct ids instead of colliding on the
    /// `turns` primary key. Returns the assigned id.
    pub fn log_turn(&self, role: Role, content: &str, timestamp: f64, memories_retrieved: &[String]) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let next_id: i64 = tx.query_row("SELECT COALESCE(MAX(turn_id), 0) + 1 FROM turns", [], |row| row.get(0))?;
        let ids_json = serde_json::to_string(memories_retrieved)?;
        tx.execute(
            "INSERT INTO turns (turn_id, role, content, timestamp, memories_retrieved)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![next_id, role.to_string(), content, timestamp, ids_json],
        )?;
        tx.commit()?;
        Ok(next_id)
    }

    /// For restart recovery; 0 if the turn log is empty.
    pub fn last_turn_id(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let v: Option<i64> = conn.query_row("SELECT MAX(turn_id) FROM turns", [], |row| row.get(0))?;
        Ok(v.unwrap_or(0))
    }

    /// Turn records with `segment_start_turn <= turn_id <= current_turn_id`,
    /// in chronological order — the distiller's input window.
    pub fn get_turn_range(&self, start_turn: i64, end_turn: i64) -> Result<Vec<TurnRecord>> {
        if start_turn > end_turn {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT turn_id, role, content, timestamp, memories_retrieved
             FROM turns WHERE turn_id BETWEEN ?1 AND ?2 ORDER BY turn_id ASC",
        )?;
        let rows = stmt.query_map(params![start_turn, end_turn], row_to_turn)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn profile_upsert(&self, key: &str, value: &str, turn_id: i64, now: f64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO profile (key, value, updated_at, source_turn) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now, turn_id],
        )?;
        Ok(())
    }

    /// Removes a key from the profile projection. Used when the backing
    /// preference memory is expired with no replacing `add`/`update` in the
    /// same delta, so the profile doesn't keep injecting a stale value into
    /// every future system prompt. A no-op if the key was never profiled.
    pub fn profile_delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM profile WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn profile_snapshot(&self) -> Result<Vec<ProfileEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value, updated_at, source_turn FROM profile ORDER BY key ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(ProfileEntry {
                key: row.get(0)?,
                value: row.get(1)?,
                updated_at: row.get(2)?,
                source_turn: row.get(3)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Rebuilds the vector and FTS indexes from `memories` where
    /// `is_active = 1`. The relational table is authoritative; both
    /// derivations are rebuildable, so on suspected corruption this is the
    /// recovery path rather than any per-row repair.
    pub fn reindex(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM memories_vec", [])?;
        tx.execute("INSERT INTO memories_fts(memories_fts) VALUES ('delete-all')", [])
            .or_else(|_| tx.execute_batch("DELETE FROM memories_fts;"))?;

        let mut stmt = tx.prepare(
            "SELECT rowid, id, key, value, category FROM memories WHERE is_active = 1",
        )?;
        let rows: Vec<(i64, String, String, String, String)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .filter_map(|r| r.ok())
            .collect();
        drop(stmt);

        for (rowid, id, key, value, category) in rows {
            tx.execute(
                "INSERT INTO memories_fts(rowid, key, value, category) VALUES (?1, ?2, ?3, ?4)",
                params![rowid, key, value, category],
            )?;
            // No embedding survives a reindex unless the caller re-embeds;
            // the vector index is left empty for active rows until the
            // orchestrator repopulates it (it holds the embedder, not the
            // store). This keeps `reindex` synchronous and embedder-free.
            let _ = id;
        }

        tx.commit()?;
        info!("store: reindex complete");
        Ok(())
    }
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let type_str: String = row.get(1)?;
    Ok(Memory {
        id: row.get(0)?,
        mem_type: type_str.parse().unwrap_or(MemoryType::Fact),
        category: row.get(2)?,
        key: row.get(3)?,
        value: row.get(4)?,
        source_turn: row.get(5)?,
        confidence: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        is_active: row.get::<_, i64>(9)? != 0,
        last_used_turn: row.get(10)?,
    })
}

fn row_to_turn(row: &rusqlite::Row<'_>) -> rusqlite::Result<TurnRecord> {
    let role_str: String = row.get(1)?;
    let ids_json: String = row.get(4)?;
    Ok(TurnRecord {
        turn_id: row.get(0)?,
        role: role_str.parse().unwrap_or(Role::User),
        content: row.get(2)?,
        timestamp: row.get(3)?,
        memories_retrieved: serde_json::from_str(&ids_json).unwrap_or_default(),
    })
}

fn encode_embedding(v: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(v.len() * 4);
    for x in v {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    bytes
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// FTS5 MATCH expects bare terms AND-ed by whitespace; quote each token so
/// punctuation left over from the caller's query text can't be parsed as
/// FTS5 query syntax.
fn fts_query(cleaned: &str) -> String {
    cleaned
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use longmem_core::types::MemoryType;

    fn temp_store() -> (MemoryStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("longmem.db");
        let store = MemoryStore::open(path.to_str().unwrap(), 8).unwrap();
        (store, dir)
    }

    fn flat_embedding(dim: usize, seed: f32) -> Vec<f32> {
        (0..dim).map(|i| seed + i as f32 * 0.01).collect()
    }

    #[test]
    fn add_then_get_by_id_roundtrips() {
        let (store, _dir) = temp_store();
        let id = store
            .add(
                NewMemory {
                    mem_type: MemoryType::Fact,
                    category: "identity".into(),
                    key: "name".into(),
                    value: "Alex".into(),
                    confidence: 0.9,
                    source_turn: 1,
                    created_at: 1000.0,
                },
                &flat_embedding(8, 0.1),
            )
            .unwrap();

        let mem = store.get_by_id(&id).unwrap().unwrap();
        assert_eq!(mem.value, "Alex");
        assert!(mem.is_active);
        assert_eq!(store.active_count().unwrap(), 1);
    }

    #[test]
    fn add_duplicate_active_key_is_rejected() {
        let (store, _dir) = temp_store();
        let new = |v: &str| NewMemory {
            mem_type: MemoryType::Preference,
            category: "diet".into(),
            key: "favorite_color".into(),
            value: v.into(),
            confidence: 0.9,
            source_turn: 1,
            created_at: 1000.0,
        };
        store.add(new("blue"), &flat_embedding(8, 0.1)).unwrap();
        let err = store.add(new("red"), &flat_embedding(8, 0.2)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[test]
    fn expire_removes_from_active_count_and_indexes() {
        let (store, _dir) = temp_store();
        let id = store
            .add(
                NewMemory {
                    mem_type: MemoryType::Fact,
                    category: "".into(),
                    key: "k".into(),
                    value: "v".into(),
                    confidence: 0.9,
                    source_turn: 1,
                    created_at: 1.0,
                },
                &flat_embedding(8, 0.1),
            )
            .unwrap();
        store.expire(&id).unwrap();
        assert_eq!(store.active_count().unwrap(), 0);
        assert!(store.search_vector(&flat_embedding(8, 0.1), 5).unwrap().is_empty());
        assert!(store.search_fts("v", 5).unwrap().is_empty());

        let mem = store.get_by_id(&id).unwrap().unwrap();
        assert!(!mem.is_active);
    }

    #[test]
    fn touch_never_decreases_last_used_turn() {
        let (store, _dir) = temp_store();
        let id = store
            .add(
                NewMemory {
                    mem_type: MemoryType::Fact,
                    category: "".into(),
                    key: "k".into(),
                    value: "v".into(),
                    confidence: 0.9,
                    source_turn: 1,
                    created_at: 1.0,
                },
                &flat_embedding(8, 0.1),
            )
            .unwrap();
        store.touch(&id, 10).unwrap();
        store.touch(&id, 3).unwrap();
        assert_eq!(store.get_by_id(&id).unwrap().unwrap().last_used_turn, 10);
    }

    #[test]
    fn search_fts_matches_value_text() {
        let (store, _dir) = temp_store();
        store
            .add(
                NewMemory {
                    mem_type: MemoryType::Fact,
                    category: "identity".into(),
                    key: "name".into(),
                    value: "Alex".into(),
                    confidence: 0.9,
                    source_turn: 1,
                    created_at: 1.0,
                },
                &flat_embedding(8, 0.1),
            )
            .unwrap();
        let hits = store.search_fts("what is my name", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn log_turn_and_last_turn_id_roundtrip() {
        let (store, _dir) = temp_store();
        let id1 = store.log_turn(Role::User, "hi", 1.0, &[]).unwrap();
        let id2 = store.log_turn(Role::Assistant, "hello", 1.1, &[]).unwrap();
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(store.last_turn_id().unwrap(), 2);
        let window = store.get_turn_range(1, 2).unwrap();
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn log_turn_assigns_distinct_ids_for_same_round() {
        let (store, _dir) = temp_store();
        // A user row and its paired assistant-reply row, logged back to back
        // within one conversational turn, must not collide on the `turns`
        // primary key.
        let user_id = store.log_turn(Role::User, "My name is Alex.", 1.0, &[]).unwrap();
        let assistant_id = store.log_turn(Role::Assistant, "Nice to meet you, Alex.", 1.1, &[]).unwrap();
        assert_ne!(user_id, assistant_id);
        assert!(assistant_id > user_id);
    }

    #[test]
    fn last_turn_id_is_zero_when_empty() {
        let (store, _dir) = temp_store();
        assert_eq!(store.last_turn_id().unwrap(), 0);
    }

    #[test]
    fn index_coherence_after_add_and_expire() {
        let (store, _dir) = temp_store();
        let id1 = store
            .add(
                NewMemory {
                    mem_type: MemoryType::Fact,
                    category: "".into(),
                    key: "a".into(),
                    value: "alpha".into(),
                    confidence: 0.9,
                    source_turn: 1,
                    created_at: 1.0,
                },
                &flat_embedding(8, 0.1),
            )
            .unwrap();
        store
            .add(
                NewMemory {
                    mem_type: MemoryType::Fact,
                    category: "".into(),
                    key: "b".into(),
                    value: "beta".into(),
                    confidence: 0.9,
                    source_turn: 1,
                    created_at: 1.0,
                },
                &flat_embedding(8, 0.5),
            )
            .unwrap();
        store.expire(&id1).unwrap();

        let active = store.active_count().unwrap();
        let vec_hits = store.search_vector(&flat_embedding(8, 0.5), 10).unwrap().len() as i64;
        let fts_hits = store.search_fts("beta", 10).unwrap().len() as i64;
        assert_eq!(active, 1);
        assert_eq!(vec_hits, 1);
        assert_eq!(fts_hits, 1);
    }

    #[test]
    fn reopen_then_reindex_rebuilds_fts_and_clears_stale_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("longmem.db");
        let id = {
            let store = MemoryStore::open(path.to_str().unwrap(), 8).unwrap();
            store
                .add(
                    NewMemory {
                        mem_type: MemoryType::Fact,
                        category: "identity".into(),
                        key: "name".into(),
                        value: "Alex".into(),
                        confidence: 0.9,
                        source_turn: 1,
                        created_at: 1.0,
                    },
                    &flat_embedding(8, 0.1),
                )
                .unwrap()
        };

        // Simulate a restart: reopen the same file, then run the operator
        // recovery path.
        let store = MemoryStore::open(path.to_str().unwrap(), 8).unwrap();
        store.reindex().unwrap();

        assert_eq!(store.active_count().unwrap(), 1);
        assert_eq!(store.search_fts("name", 5).unwrap().len(), 1);
        assert!(store.get_by_id(&id).unwrap().unwrap().is_active);
        // reindex() rebuilds the lexical shadow from `memories` but can't
        // recover an embedding it never stored, so the vector index comes
        // back empty until something re-embeds and re-populates it.
        assert!(store.search_vector(&flat_embedding(8, 0.1), 5).unwrap().is_empty());
    }
}
