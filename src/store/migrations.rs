use rusqlite::Connection;

use super::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: "CREATE TABLE IF NOT EXISTS thoughts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                last_active_at INTEGER NOT NULL,
                emotion TEXT
              );
              CREATE INDEX IF NOT EXISTS idx_thoughts_last_active
                ON thoughts(last_active_at);",
    },
    Migration {
        version: 2,
        sql: "ALTER TABLE thoughts ADD COLUMN solidified INTEGER;
              CREATE INDEX IF NOT EXISTS idx_thoughts_solidified
                ON thoughts(solidified, last_active_at);",
    },
    Migration {
        version: 3,
        sql: "UPDATE thoughts SET solidified = 0 WHERE solidified IS NULL;
              UPDATE thoughts SET solidified = 1 WHERE solidified NOT IN (0, 1);
              CREATE TABLE IF NOT EXISTS flags (
                key TEXT PRIMARY KEY,
                set_at INTEGER NOT NULL
              );",
    },
];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

pub fn apply(conn: &mut Connection) -> StoreResult<()> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(StoreError::UnsupportedSchema {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        tracing::debug!(version = migration.version, "applied migration");
    }
    tx.commit()?;
    Ok(())
}

pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

#[cfg(test)]
pub(crate) fn apply_up_to(conn: &mut Connection, version: u32) -> StoreResult<()> {
    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version <= version) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    Ok(())
}
