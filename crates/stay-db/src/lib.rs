//! Storage layer for travel-leg records.
//!
//! Provides persistence for imported flight legs using `rusqlite`. The
//! residency engine itself never touches this crate; it consumes plain
//! `TravelLeg` values that callers read out of here.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Use one instance per thread, or serialize access externally.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 format
//! (e.g., `2024-03-01T08:30:00Z`), so lexicographic ordering matches
//! chronological ordering and rows stay human-readable. Country codes are
//! stored as given; validation belongs to the import boundary.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;

use stay_core::{CountryCode, TravelLeg, TravelerId};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A raw leg row ready to be stored.
///
/// Kept as plain strings: the store does not re-validate what the import
/// layer already checked, and it must be able to hold rows whose upstream
/// validation predates stricter rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegRecord {
    pub id: String,
    pub traveler: String,
    pub departed_at: String,
    pub from_country: String,
    pub to_country: String,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Legs table: one row per flight segment
            -- departed_at: ISO 8601 format (e.g., '2024-03-01T08:30:00Z')
            CREATE TABLE IF NOT EXISTS legs (
                id TEXT PRIMARY KEY,
                traveler TEXT NOT NULL,
                departed_at TEXT NOT NULL,
                from_country TEXT NOT NULL,
                to_country TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_legs_traveler_time ON legs(traveler, departed_at);
            CREATE INDEX IF NOT EXISTS idx_legs_time ON legs(departed_at);
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of legs, ignoring duplicates by ID.
    ///
    /// Returns the number of rows actually inserted, so re-importing the
    /// same file reports zero.
    pub fn insert_legs(&mut self, legs: &[LegRecord]) -> Result<usize, DbError> {
        if legs.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO legs
                (id, traveler, departed_at, from_country, to_country)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for leg in legs {
                inserted += stmt.execute(params![
                    leg.id,
                    leg.traveler,
                    leg.departed_at,
                    leg.from_country,
                    leg.to_country,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// All legs for one traveler, ordered by departure time then ID.
    ///
    /// Rows that fail to parse are skipped with a warning: one bad record
    /// must not abort the traveler's entire history.
    pub fn legs_for_traveler(&self, traveler: &TravelerId) -> Result<Vec<TravelLeg>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, traveler, departed_at, from_country, to_country
            FROM legs
            WHERE traveler = ?
            ORDER BY departed_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![traveler.as_str()], row_to_record)?;
        collect_parsed(rows)
    }

    /// All legs across every traveler, ordered by departure time then ID.
    pub fn all_legs(&self) -> Result<Vec<TravelLeg>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, traveler, departed_at, from_country, to_country
            FROM legs
            ORDER BY departed_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        collect_parsed(rows)
    }

    /// Distinct traveler IDs with their leg counts, ascending by ID.
    pub fn travelers(&self) -> Result<Vec<(String, usize)>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT traveler, COUNT(*)
            FROM legs
            GROUP BY traveler
            ORDER BY traveler ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            let traveler: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((traveler, usize::try_from(count).unwrap_or(0)))
        })?;
        let mut travelers = Vec::new();
        for row in rows {
            travelers.push(row?);
        }
        Ok(travelers)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LegRecord> {
    Ok(LegRecord {
        id: row.get(0)?,
        traveler: row.get(1)?,
        departed_at: row.get(2)?,
        from_country: row.get(3)?,
        to_country: row.get(4)?,
    })
}

/// Collects query rows, parsing each into a `TravelLeg` and skipping rows
/// the engine could not consume.
fn collect_parsed<I>(rows: I) -> Result<Vec<TravelLeg>, DbError>
where
    I: Iterator<Item = rusqlite::Result<LegRecord>>,
{
    let mut legs = Vec::new();
    for row in rows {
        let record = row?;
        match parse_record(&record) {
            Some(leg) => legs.push(leg),
            None => {
                tracing::warn!(id = %record.id, "skipping malformed leg row");
            }
        }
    }
    Ok(legs)
}

fn parse_record(record: &LegRecord) -> Option<TravelLeg> {
    let departed_at = record
        .departed_at
        .parse::<DateTime<Utc>>()
        .ok()?;
    Some(TravelLeg {
        departed_at,
        from: CountryCode::new(record.from_country.clone()).ok()?,
        to: CountryCode::new(record.to_country.clone()).ok()?,
        traveler: TravelerId::new(record.traveler.clone()).ok()?,
    })
}
