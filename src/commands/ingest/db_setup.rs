use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::util::now_utc_string;

pub(crate) const DB_SCHEMA_VERSION: &str = "0.2.0";

pub(crate) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(crate) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sections (
          uid TEXT PRIMARY KEY,
          title INTEGER,
          part TEXT,
          section TEXT,
          heading TEXT,
          text_norm TEXT,
          word_count INTEGER,
          paragraph_count INTEGER,
          amend_date TEXT,
          is_reserved INTEGER NOT NULL DEFAULT 0,
          is_definition INTEGER NOT NULL DEFAULT 0,
          chash TEXT,
          created_at TEXT,
          updated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS paragraphs (
          section_uid TEXT NOT NULL,
          idx INTEGER NOT NULL,
          label TEXT,
          text_norm TEXT,
          word_count INTEGER,
          chash TEXT,
          PRIMARY KEY(section_uid, idx)
        );

        CREATE TABLE IF NOT EXISTS refs (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          from_section_uid TEXT NOT NULL,
          ref_type TEXT NOT NULL,
          raw TEXT NOT NULL,
          norm_target TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS metrics_section (
          section_uid TEXT PRIMARY KEY,
          chash TEXT NOT NULL,
          word_count INTEGER,
          paragraph_count INTEGER,
          sentence_count INTEGER,
          structural_complexity REAL,
          compression_index REAL,
          obligation_density REAL,
          prohibition_density REAL,
          prohibition_balance REAL,
          ambiguity_density REAL,
          feasibility_density REAL,
          amendment_recency REAL,
          risk_density REAL,
          scope_reach REAL,
          reference_centrality REAL,
          small_entity_density REAL,
          obligation_per_word REAL,
          readability_grade REAL,
          updated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS metrics_part (
          title INTEGER NOT NULL,
          part TEXT NOT NULL,
          word_count INTEGER,
          paragraph_count INTEGER,
          sentence_count INTEGER,
          obligation_density REAL,
          prohibition_density REAL,
          ambiguity_density REAL,
          feasibility_density REAL,
          risk_density REAL,
          small_entity_density REAL,
          obligation_per_word REAL,
          readability_grade REAL,
          PRIMARY KEY(title, part)
        );

        CREATE INDEX IF NOT EXISTS idx_sections_title_part ON sections(title, part);
        CREATE INDEX IF NOT EXISTS idx_refs_norm_target ON refs(norm_target);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

/// Clear every derived table for a clean rebuild.
pub(crate) fn clear_derived_tables(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            DELETE FROM sections;
            DELETE FROM paragraphs;
            DELETE FROM refs;
            DELETE FROM metrics_section;
            DELETE FROM metrics_part;
            ",
        )
        .context("failed to clear derived tables")
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
