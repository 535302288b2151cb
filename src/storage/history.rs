// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shell command history using SQLite.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// A single history entry.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: i64,
    pub timestamp: DateTime<Local>,
    pub command: String,
    pub outcome: Outcome,
}

/// Result of running a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "OK",
            Outcome::Failed => "FAILED",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "OK" => Outcome::Ok,
            _ => Outcome::Failed,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Outcome::Ok => "ok",
            Outcome::Failed => "failed",
        })
    }
}

/// History database manager.
#[derive(Clone)]
pub struct History {
    conn: Arc<Mutex<Connection>>,
    max_entries: u32,
}

impl History {
    /// Create or open the history database at `db_path`.
    pub fn open(db_path: &Path, max_entries: u32) -> Result<Self> {
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        info!("Opening history database: {:?}", db_path);

        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                command TEXT NOT NULL,
                outcome TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_timestamp ON history(timestamp DESC)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            max_entries,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("history database lock poisoned"))
    }

    /// Record a command line and how it ended.
    pub fn add(&self, command: &str, outcome: Outcome) -> Result<()> {
        let conn = self.lock()?;
        let timestamp = Local::now().timestamp();

        conn.execute(
            "INSERT INTO history (timestamp, command, outcome) VALUES (?1, ?2, ?3)",
            params![timestamp, command, outcome.as_str()],
        )?;

        self.prune(&conn)?;
        Ok(())
    }

    /// Most recent entries, newest first.
    pub fn get_recent(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, command, outcome
             FROM history
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;

        let entries = stmt
            .query_map([limit], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Entries whose command contains `query`, newest first.
    pub fn search(&self, query: &str, limit: u32) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, command, outcome
             FROM history
             WHERE command LIKE ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![pattern, limit], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Clear all history.
    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM history", [])?;
        info!("History cleared");
        Ok(())
    }

    /// Get total entry count.
    pub fn count(&self) -> Result<u32> {
        let conn = self.lock()?;
        let count: u32 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove old entries beyond max_entries.
    fn prune(&self, conn: &Connection) -> Result<()> {
        let removed = conn.execute(
            "DELETE FROM history WHERE id NOT IN (
                SELECT id FROM history ORDER BY id DESC LIMIT ?1
            )",
            [self.max_entries],
        )?;
        if removed > 0 {
            debug!("Pruned {} history entries", removed);
        }
        Ok(())
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let timestamp_secs: i64 = row.get(1)?;
    let outcome: String = row.get(3)?;

    Ok(HistoryEntry {
        id: row.get(0)?,
        timestamp: Local
            .timestamp_opt(timestamp_secs, 0)
            .earliest()
            .unwrap_or_else(Local::now),
        command: row.get(2)?,
        outcome: Outcome::from_str(&outcome),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_history_basic() {
        let dir = tempdir().unwrap();
        let history = History::open(&dir.path().join("history.db"), 100).unwrap();

        history.add("cd telecom", Outcome::Ok).unwrap();
        history.add("message 2000", Outcome::Failed).unwrap();

        let entries = history.get_recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command, "message 2000");
        assert_eq!(entries[0].outcome, Outcome::Failed);
        assert_eq!(entries[1].command, "cd telecom");
        assert_eq!(entries[1].outcome, Outcome::Ok);
    }

    #[test]
    fn test_history_search() {
        let dir = tempdir().unwrap();
        let history = History::open(&dir.path().join("history.db"), 100).unwrap();

        history.add("messages inbox", Outcome::Ok).unwrap();
        history.add("messages sent", Outcome::Ok).unwrap();
        history.add("pwd", Outcome::Ok).unwrap();

        let results = history.search("messages", 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_history_prunes_oldest() {
        let dir = tempdir().unwrap();
        let history = History::open(&dir.path().join("history.db"), 3).unwrap();

        for i in 0..5 {
            history.add(&format!("cmd {}", i), Outcome::Ok).unwrap();
        }

        assert_eq!(history.count().unwrap(), 3);
        let commands: Vec<String> = history
            .get_recent(10)
            .unwrap()
            .into_iter()
            .map(|e| e.command)
            .collect();
        assert_eq!(commands, vec!["cmd 4", "cmd 3", "cmd 2"]);
    }

    #[test]
    fn test_history_clear_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let history = History::open(&path, 10).unwrap();
            history.add("pwd", Outcome::Ok).unwrap();
        }

        let history = History::open(&path, 10).unwrap();
        assert_eq!(history.count().unwrap(), 1);
        history.clear().unwrap();
        assert_eq!(history.count().unwrap(), 0);
    }
}
