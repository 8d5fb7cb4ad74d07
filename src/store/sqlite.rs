use std::path::Path;
use std::time::Instant;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{
    migrations, NewThought, StoreError, StoreResult, ThoughtId, ThoughtPatch, ThoughtRecord,
    ThoughtStore,
};
use crate::emotion::Emotion;
use crate::flags::FlagStore;

const THOUGHT_SELECT_SQL: &str = "SELECT
    id,
    content,
    created_at,
    last_active_at,
    emotion,
    solidified
FROM thoughts";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(%journal_mode, "journal mode configured");
        migrations::apply(&mut conn)?;

        tracing::info!(
            path = %path.display(),
            schema = migrations::latest_version(),
            duration_ms = started_at.elapsed().as_millis() as u64,
            "thought store opened"
        );
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrations::apply(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> StoreResult<u32> {
        migrations::current_version(&self.conn)
    }
}

fn solidified_flag(value: bool) -> i64 {
    i64::from(value)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ThoughtRecord> {
    let emotion: Option<String> = row.get(4)?;
    let solidified: Option<i64> = row.get(5)?;
    Ok(ThoughtRecord {
        id: ThoughtId(row.get(0)?),
        content: row.get(1)?,
        created_at: row.get(2)?,
        last_active_at: row.get(3)?,
        emotion: Emotion::from_stored(emotion.as_deref()),
        solidified: solidified.unwrap_or(0) != 0,
    })
}

impl ThoughtStore for SqliteStore {
    fn create(&self, thought: &NewThought) -> StoreResult<ThoughtId> {
        self.conn.execute(
            "INSERT INTO thoughts (content, created_at, last_active_at, emotion, solidified)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                thought.content,
                thought.created_at,
                thought.last_active_at,
                thought.emotion.label(),
                solidified_flag(thought.solidified),
            ],
        )?;
        Ok(ThoughtId(self.conn.last_insert_rowid()))
    }

    fn update(&self, id: ThoughtId, patch: &ThoughtPatch) -> StoreResult<()> {
        if patch.is_empty() {
            let exists = self
                .conn
                .query_row("SELECT 1 FROM thoughts WHERE id = ?1;", [id.0], |_| Ok(()))
                .optional()?;
            return exists.ok_or(StoreError::NotFound(id));
        }

        let mut assignments = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(content) = &patch.content {
            assignments.push("content = ?");
            values.push(Value::Text(content.clone()));
        }
        if let Some(last_active_at) = patch.last_active_at {
            assignments.push("last_active_at = ?");
            values.push(Value::Integer(last_active_at));
        }
        if let Some(emotion) = patch.emotion {
            assignments.push("emotion = ?");
            values.push(Value::Text(emotion.label().to_string()));
        }
        if let Some(solidified) = patch.solidified {
            assignments.push("solidified = ?");
            values.push(Value::Integer(solidified_flag(solidified)));
        }
        values.push(Value::Integer(id.0));

        let sql = format!("UPDATE thoughts SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn query_by_solidified(&self, solidified: bool) -> StoreResult<Vec<ThoughtRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{THOUGHT_SELECT_SQL}
             WHERE solidified = ?1
             ORDER BY last_active_at DESC, id DESC;"
        ))?;
        let rows = stmt.query_map([solidified_flag(solidified)], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl FlagStore for SqliteStore {
    fn is_set(&self, key: &str) -> StoreResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM flags WHERE key = ?1;", [key], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn set(&self, key: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO flags (key, set_at) VALUES (?1, ?2);",
            params![key, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}
