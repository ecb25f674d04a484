use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::NormalizeArgs;
use crate::model::{NormalizeCounts, NormalizeRunManifest, TitleDocument};
use crate::util::{
    ensure_directory, now_utc_string, sha256_hex, utc_compact_string, write_json_pretty,
};

use super::cache::{CACHE_FILENAME, NormalizationCache};
use super::section::SectionNormalizer;

pub fn run(args: NormalizeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let data_dir = args.data_dir.clone();
    let output_dir = args.output_dir.clone().unwrap_or_else(|| data_dir.clone());
    ensure_directory(&output_dir)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        output_dir.join("manifests").join(format!(
            "normalize_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        data_dir = %data_dir.display(),
        output_dir = %output_dir.display(),
        run_id = %run_id,
        "starting normalization"
    );

    if args.force {
        let cache_path = output_dir.join(CACHE_FILENAME);
        if cache_path.exists() {
            fs::remove_file(&cache_path)
                .with_context(|| format!("failed to remove {}", cache_path.display()))?;
            info!(path = %cache_path.display(), "removed normalization cache");
        }
    }

    let mut cache = NormalizationCache::load(&output_dir);
    let normalizer = SectionNormalizer::new()?;
    let title_files = collect_title_files(&data_dir)?;

    let mut counts = NormalizeCounts {
        title_files_scanned: title_files.len(),
        sections_processed: 0,
        sections_skipped_unchanged: 0,
        documents_backfilled: 0,
    };
    let mut warnings = Vec::<String>::new();

    for path in &title_files {
        match normalize_title_file(path, &output_dir, &normalizer, &mut cache) {
            Ok(outcome) => {
                counts.sections_processed += outcome.sections_written;
                counts.sections_skipped_unchanged += outcome.sections_skipped;
                if outcome.backfilled {
                    counts.documents_backfilled += 1;
                }
            }
            Err(err) => {
                let warning = format!("skipped title document {}: {err:#}", path.display());
                warn!(warning = %warning, "title document warning");
                warnings.push(warning);
            }
        }
    }

    cache.save(&output_dir)?;

    let manifest = NormalizeRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        data_dir: data_dir.display().to_string(),
        output_dir: output_dir.display().to_string(),
        cache_path: output_dir.join(CACHE_FILENAME).display().to_string(),
        counts: counts.clone(),
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        titles = counts.title_files_scanned,
        processed = counts.sections_processed,
        skipped_unchanged = counts.sections_skipped_unchanged,
        backfilled_documents = counts.documents_backfilled,
        "normalization completed"
    );

    Ok(())
}

#[derive(Debug, Default)]
pub(crate) struct TitleOutcome {
    pub sections_written: usize,
    pub sections_skipped: usize,
    pub backfilled: bool,
}

/// Normalize one exported title document into per-section artifacts under
/// `<out_base>/sections/title<T>/`. The document is rewritten in place only
/// when a part or section number was backfilled.
pub(crate) fn normalize_title_file(
    path: &Path,
    out_base: &Path,
    normalizer: &SectionNormalizer,
    cache: &mut NormalizationCache,
) -> Result<TitleOutcome> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut document: TitleDocument = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let title_number = document
        .title_number
        .clone()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| title_number_from_stem(path));

    let sections_dir = out_base
        .join("sections")
        .join(format!("title{}", title_number));
    ensure_directory(&sections_dir)?;

    let mut outcome = TitleOutcome::default();

    for part in &mut document.parts {
        if part.part_number.is_none() {
            if let Some(part_name) = part.part_name.as_deref() {
                if let Some(number) = normalizer.backfill_part_number(part_name) {
                    part.part_number = Some(number);
                    outcome.backfilled = true;
                }
            }
        }
        let part_number = part.part_number.clone();

        for section in &mut part.sections {
            if section.section_number.is_none() {
                if let Some(legacy_name) = section.section_name.as_deref() {
                    if let Some(number) = normalizer.backfill_section_number(legacy_name) {
                        section.section_number = Some(number);
                        outcome.backfilled = true;
                    }
                }
            }

            let normalized =
                normalizer.normalize_section(section, &title_number, part_number.as_deref());
            let payload_hash = sha256_hex(&format!(
                "{}|{}",
                section.content.as_deref().unwrap_or(""),
                section.section_name.as_deref().unwrap_or("")
            ));

            if cache.is_unchanged(&normalized.anchor_id, &payload_hash) {
                outcome.sections_skipped += 1;
                continue;
            }

            let file_stem = normalized
                .section_number
                .clone()
                .unwrap_or_else(|| format!("idx{}", outcome.sections_written));
            let artifact_path = sections_dir.join(format!("{}.json", file_stem.replace('.', "_")));
            write_json_pretty(&artifact_path, &normalized)?;

            cache.record(normalized.anchor_id.clone(), payload_hash);
            outcome.sections_written += 1;
        }
    }

    if outcome.backfilled {
        write_json_pretty(path, &document)?;
        info!(path = %path.display(), "rewrote title document with backfilled numbers");
    }

    Ok(outcome)
}

pub(crate) fn collect_title_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::<PathBuf>::new();
    if !data_dir.exists() {
        return Ok(files);
    }

    for entry in fs::read_dir(data_dir)
        .with_context(|| format!("failed to list {}", data_dir.display()))?
    {
        let path = entry
            .with_context(|| format!("failed to list {}", data_dir.display()))?
            .path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if name.starts_with("title") && name.ends_with(".json") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn title_number_from_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or_default()
        .replace("title", "")
}
