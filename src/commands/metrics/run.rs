use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::info;

use crate::cli::{MetricsArgs, resolve_db_path};
use crate::commands::ingest::{configure_connection, ensure_schema};
use crate::model::{MetricsCounts, MetricsRunManifest};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

use super::part::compute_part_metrics;
use super::patterns::MetricPatterns;
use super::section::score_section;

pub fn run(args: MetricsArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let db_path = resolve_db_path(args.db_path.clone(), &args.data_dir);
    if !db_path.exists() {
        bail!(
            "analyzer database not found: {} (run ingest first)",
            db_path.display()
        );
    }
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.data_dir.join("manifests").join(format!(
            "metrics_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(db_path = %db_path.display(), run_id = %run_id, "starting metrics pass");

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let patterns = MetricPatterns::new()?;
    let sections_scored = compute_section_metrics(&mut connection, &patterns, args.limit)?;
    let parts_rolled_up = compute_part_metrics(&connection)?;

    let manifest = MetricsRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        db_path: db_path.display().to_string(),
        counts: MetricsCounts {
            sections_scored,
            parts_rolled_up,
        },
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        sections_scored = sections_scored,
        parts_rolled_up = parts_rolled_up,
        "metrics pass completed"
    );

    Ok(())
}

#[derive(Debug)]
struct PendingSection {
    uid: String,
    text: String,
    word_count: i64,
    paragraph_count: i64,
    chash: String,
}

/// Score every section with no metrics row for its current content hash.
/// Sections whose stored hash still matches are untouched, so repeated runs
/// only pay for what changed.
pub(crate) fn compute_section_metrics(
    connection: &mut Connection,
    patterns: &MetricPatterns,
    limit: Option<usize>,
) -> Result<usize> {
    let pending: Vec<PendingSection> = {
        let mut statement = connection.prepare(
            "
            SELECT s.uid, s.text_norm, s.word_count, s.paragraph_count, s.chash
            FROM sections s
            LEFT JOIN metrics_section m
              ON m.section_uid = s.uid AND m.chash = s.chash
            WHERE m.section_uid IS NULL
            ORDER BY s.uid
            LIMIT ?1
            ",
        )?;
        let rows = statement.query_map([limit.map_or(-1, |value| value as i64)], |row| {
            Ok(PendingSection {
                uid: row.get(0)?,
                text: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                word_count: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                paragraph_count: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                chash: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let tx = connection.transaction()?;
    {
        let mut statement = tx.prepare(
            "
            INSERT INTO metrics_section(
              section_uid, chash, word_count, paragraph_count, sentence_count,
              structural_complexity, compression_index, obligation_density,
              prohibition_density, prohibition_balance, ambiguity_density,
              feasibility_density, amendment_recency, risk_density, scope_reach,
              reference_centrality, small_entity_density, obligation_per_word,
              readability_grade, updated_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            ON CONFLICT(section_uid) DO UPDATE SET
              chash=excluded.chash,
              word_count=excluded.word_count,
              paragraph_count=excluded.paragraph_count,
              sentence_count=excluded.sentence_count,
              structural_complexity=excluded.structural_complexity,
              compression_index=excluded.compression_index,
              obligation_density=excluded.obligation_density,
              prohibition_density=excluded.prohibition_density,
              prohibition_balance=excluded.prohibition_balance,
              ambiguity_density=excluded.ambiguity_density,
              feasibility_density=excluded.feasibility_density,
              amendment_recency=excluded.amendment_recency,
              risk_density=excluded.risk_density,
              scope_reach=excluded.scope_reach,
              reference_centrality=excluded.reference_centrality,
              small_entity_density=excluded.small_entity_density,
              obligation_per_word=excluded.obligation_per_word,
              readability_grade=excluded.readability_grade,
              updated_at=excluded.updated_at
            ",
        )?;

        for section in &pending {
            let scores = score_section(
                patterns,
                &section.text,
                section.word_count,
                section.paragraph_count,
            );
            statement.execute(params![
                section.uid,
                section.chash,
                section.word_count,
                section.paragraph_count,
                scores.sentence_count,
                scores.structural_complexity,
                scores.compression_index,
                scores.obligation_density,
                scores.prohibition_density,
                scores.prohibition_balance,
                scores.ambiguity_density,
                scores.feasibility_density,
                scores.amendment_recency,
                scores.risk_density,
                scores.scope_reach,
                scores.reference_centrality,
                scores.small_entity_density,
                scores.obligation_per_word,
                scores.readability_grade,
                now_utc_string()
            ])?;
        }
    }
    tx.commit()?;

    Ok(pending.len())
}
