//! SQLite persistence for finished runs.
//!
//! RULE: Only store.rs talks to the database.
//! The store is written once after generation and read by tooling; the
//! generator itself never queries it.

use crate::{
    error::GenResult,
    event::EventRecord,
    stats::PeriodStats,
};
use rusqlite::{params, Connection};

pub struct TelemetryStore {
    conn: Connection,
}

impl TelemetryStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GenResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GenResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_telemetry.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> GenResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    /// Append a whole run's events in one transaction.
    pub fn append_events(&mut self, run_id: &str, events: &[EventRecord]) -> GenResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO event_log
                    (run_id, event_id, user_id, event_type, period, ts, ts_millis, bytes, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for e in events {
                stmt.execute(params![
                    run_id,
                    e.event_id,
                    e.user_id,
                    e.name(),
                    e.period.to_string(),
                    e.timestamp.to_rfc3339(),
                    e.timestamp.timestamp_millis(),
                    e.bytes(),
                    serde_json::to_string(e)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(events.len())
    }

    pub fn event_count(&self, run_id: &str) -> GenResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?)
    }

    pub fn event_count_by_kind(&self, run_id: &str, kind: &str) -> GenResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, kind],
            |row| row.get(0),
        )?)
    }

    pub fn bytes_for_period(&self, run_id: &str, period: &str) -> GenResult<f64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(bytes), 0.0) FROM event_log
             WHERE run_id = ?1 AND period = ?2 AND event_type = 'data_generated'",
            params![run_id, period],
            |row| row.get(0),
        )?)
    }

    pub fn events_for_period(&self, run_id: &str, period: &str) -> GenResult<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM event_log
             WHERE run_id = ?1 AND period = ?2
             ORDER BY ts_millis ASC, id ASC",
        )?;
        let payloads = stmt
            .query_map(params![run_id, period], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let events = payloads
            .iter()
            .map(|p| serde_json::from_str(p))
            .collect::<Result<Vec<EventRecord>, _>>()?;
        Ok(events)
    }

    // ── Period stats ───────────────────────────────────────────

    pub fn insert_period_stats(&self, run_id: &str, stats: &PeriodStats) -> GenResult<()> {
        self.conn.execute(
            "INSERT INTO period_stats (run_id, period, stats_json) VALUES (?1, ?2, ?3)",
            params![run_id, stats.period.to_string(), serde_json::to_string(stats)?],
        )?;
        Ok(())
    }

    pub fn period_stats(&self, run_id: &str) -> GenResult<Vec<PeriodStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT stats_json FROM period_stats WHERE run_id = ?1 ORDER BY period ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let stats = rows
            .iter()
            .map(|s| serde_json::from_str(s))
            .collect::<Result<Vec<PeriodStats>, _>>()?;
        Ok(stats)
    }
}
