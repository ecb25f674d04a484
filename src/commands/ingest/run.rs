use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use crate::cli::{IngestArgs, resolve_db_path};
use crate::model::{IngestCounts, IngestRunManifest};
use crate::util::{ensure_directory, now_utc_string, sha256_hex, utc_compact_string, write_json_pretty};

use super::artifacts::{ArtifactReader, collect_artifact_files};
use super::db_setup::{clear_derived_tables, configure_connection, count_rows, ensure_schema};
use super::references::ReferenceExtractor;

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let sections_root = args.data_dir.join("sections");
    let db_path = resolve_db_path(args.db_path.clone(), &args.data_dir);
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.data_dir
            .join("manifests")
            .join(format!("ingest_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(
        sections_root = %sections_root.display(),
        db_path = %db_path.display(),
        run_id = %run_id,
        replace = args.replace,
        changed_only = args.changed_only,
        "starting ingest"
    );

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let reader = ArtifactReader::new()?;
    let extractor = ReferenceExtractor::new()?;
    let files = collect_artifact_files(&sections_root)?;

    let outcome = ingest_sections(
        &mut connection,
        &files,
        &reader,
        &extractor,
        args.replace,
        args.changed_only,
    )?;

    let sections_total = count_rows(&connection, "SELECT COUNT(*) FROM sections")?;
    let paragraphs_total = count_rows(&connection, "SELECT COUNT(*) FROM paragraphs")?;
    let references_total = count_rows(&connection, "SELECT COUNT(*) FROM refs")?;

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        sections_root: sections_root.display().to_string(),
        db_path: db_path.display().to_string(),
        replace: args.replace,
        changed_only: args.changed_only,
        counts: IngestCounts {
            artifacts_seen: files.len(),
            sections_written: outcome.written,
            sections_skipped_unchanged: outcome.skipped_unchanged,
            artifacts_skipped_malformed: outcome.skipped_malformed,
            sections_total,
            paragraphs_total,
            references_total,
        },
        warnings: outcome.warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        written = outcome.written,
        skipped_unchanged = outcome.skipped_unchanged,
        skipped_malformed = outcome.skipped_malformed,
        sections = sections_total,
        "ingest completed"
    );

    Ok(())
}

#[derive(Debug, Default)]
pub(crate) struct IngestOutcome {
    pub written: usize,
    pub skipped_unchanged: usize,
    pub skipped_malformed: usize,
    pub warnings: Vec<String>,
}

/// Upsert each artifact into the store. All writes for the batch share one
/// transaction so a crash leaves either the prior data or fully reingested
/// sections, never a half-written section/paragraph/reference triple.
pub(crate) fn ingest_sections(
    connection: &mut Connection,
    files: &[PathBuf],
    reader: &ArtifactReader,
    extractor: &ReferenceExtractor,
    replace: bool,
    changed_only: bool,
) -> Result<IngestOutcome> {
    let tx = connection.transaction()?;
    let mut outcome = IngestOutcome::default();

    if replace {
        clear_derived_tables(&tx)?;
    }

    {
        let mut section_statement = tx.prepare(
            "
            INSERT INTO sections(
              uid, title, part, section, heading, text_norm, word_count, paragraph_count,
              amend_date, is_reserved, is_definition, chash, created_at, updated_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(uid) DO UPDATE SET
              title=excluded.title,
              part=excluded.part,
              section=excluded.section,
              heading=excluded.heading,
              text_norm=excluded.text_norm,
              word_count=excluded.word_count,
              paragraph_count=excluded.paragraph_count,
              amend_date=excluded.amend_date,
              is_reserved=excluded.is_reserved,
              is_definition=excluded.is_definition,
              chash=excluded.chash,
              updated_at=excluded.updated_at
            ",
        )?;
        let mut paragraph_statement = tx.prepare(
            "INSERT INTO paragraphs(section_uid, idx, label, text_norm, word_count, chash)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let mut reference_statement = tx.prepare(
            "INSERT INTO refs(from_section_uid, ref_type, raw, norm_target)
             VALUES(?1, ?2, ?3, ?4)",
        )?;

        for path in files {
            let record = match reader.load(path) {
                Ok(record) => record,
                Err(err) => {
                    let warning = format!("skipped malformed artifact {}: {err:#}", path.display());
                    warn!(warning = %warning, "artifact warning");
                    outcome.skipped_malformed += 1;
                    outcome.warnings.push(warning);
                    continue;
                }
            };

            if changed_only {
                let previous: Option<String> = tx
                    .query_row(
                        "SELECT chash FROM sections WHERE uid = ?1",
                        [&record.uid],
                        |row| row.get(0),
                    )
                    .optional()?;
                if previous.as_deref() == Some(record.chash.as_str()) {
                    outcome.skipped_unchanged += 1;
                    continue;
                }
            }

            let now = now_utc_string();
            section_statement.execute(params![
                record.uid,
                record.title,
                record.part,
                record.section,
                record.heading,
                record.text_norm,
                record.word_count,
                record.paragraphs.len() as i64,
                Option::<String>::None,
                record.is_reserved as i64,
                record.is_definition as i64,
                record.chash,
                now,
                now
            ])?;

            tx.execute("DELETE FROM paragraphs WHERE section_uid = ?1", [&record.uid])?;
            for (index, paragraph) in record.paragraphs.iter().enumerate() {
                let text = paragraph.text.trim();
                paragraph_statement.execute(params![
                    record.uid,
                    index as i64,
                    paragraph.label,
                    text,
                    text.split_whitespace().count() as i64,
                    sha256_hex(text)
                ])?;
            }

            tx.execute("DELETE FROM refs WHERE from_section_uid = ?1", [&record.uid])?;
            for edge in extractor.extract(&record.text_norm) {
                reference_statement.execute(params![
                    record.uid,
                    edge.ref_type.as_str(),
                    edge.raw,
                    edge.norm_target
                ])?;
            }

            outcome.written += 1;
        }
    }

    tx.commit()?;
    Ok(outcome)
}
