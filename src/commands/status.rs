use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::{StatusArgs, resolve_db_path};
use crate::commands::normalize::{CACHE_FILENAME, NormalizationCache};

pub fn run(args: StatusArgs) -> Result<()> {
    let cache_path = args.data_dir.join(CACHE_FILENAME);
    let db_path = resolve_db_path(args.db_path.clone(), &args.data_dir);

    info!(data_dir = %args.data_dir.display(), "status requested");

    if cache_path.exists() {
        let cache = NormalizationCache::load(&args.data_dir);
        info!(
            path = %cache_path.display(),
            entries = cache.len(),
            "normalization cache"
        );
    } else {
        warn!(path = %cache_path.display(), "normalization cache missing");
    }

    if db_path.exists() {
        let connection = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;

        let sections = query_count(&connection, "SELECT COUNT(*) FROM sections").unwrap_or(0);
        let paragraphs = query_count(&connection, "SELECT COUNT(*) FROM paragraphs").unwrap_or(0);
        let references = query_count(&connection, "SELECT COUNT(*) FROM refs").unwrap_or(0);
        let section_metrics =
            query_count(&connection, "SELECT COUNT(*) FROM metrics_section").unwrap_or(0);
        let part_metrics =
            query_count(&connection, "SELECT COUNT(*) FROM metrics_part").unwrap_or(0);
        let schema_version: String = connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap_or_default();

        info!(
            path = %db_path.display(),
            schema_version = %schema_version,
            sections = sections,
            paragraphs = paragraphs,
            references = references,
            section_metrics = section_metrics,
            part_metrics = part_metrics,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
