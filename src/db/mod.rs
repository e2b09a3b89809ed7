use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::Path;

use crate::models::NumberLogEntry;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: &Path) -> SqlResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> SqlResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = [
            (
                "001_create_settings.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_settings.sql"
                )),
            ),
            (
                "002_create_number_log.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_number_log.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    pub fn set_setting(&self, key: &str, value: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> SqlResult<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        stmt.query_row(params![key], |row| row.get(0)).optional()
    }

    pub fn remove_setting(&self, key: &str) -> SqlResult<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn clear_settings(&self) -> SqlResult<()> {
        self.conn.execute("DELETE FROM settings", [])?;
        Ok(())
    }

    pub fn log_number(
        &self,
        category: &str,
        document_number: &str,
        source: &str,
        created_at: &str,
    ) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO number_log (id, category, document_number, source, created_at)
             VALUES (hex(randomblob(16)), ?1, ?2, ?3, ?4)",
            params![category, document_number, source, created_at],
        )?;
        Ok(())
    }

    pub fn get_number_log(&self, category: &str, limit: usize) -> SqlResult<Vec<NumberLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, document_number, source, created_at
             FROM number_log
             WHERE category = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![category, limit as i64], |row| {
            Ok(NumberLogEntry {
                id: row.get(0)?,
                category: row.get(1)?,
                document_number: row.get(2)?,
                source: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        rows.collect()
    }

    pub fn clear_number_log(&self) -> SqlResult<()> {
        self.conn.execute("DELETE FROM number_log", [])?;
        Ok(())
    }
}
