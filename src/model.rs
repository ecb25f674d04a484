use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One exported per-title document, as produced by the upstream export step.
/// Unknown fields are carried through `extra` so a backfill rewrite does not
/// drop anything the exporter recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleDocument {
    #[serde(default)]
    pub title_number: Option<String>,

    #[serde(default)]
    pub parts: Vec<PartRecord>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartRecord {
    #[serde(default)]
    pub part_number: Option<String>,

    #[serde(default)]
    pub part_name: Option<String>,

    #[serde(default)]
    pub sections: Vec<RawSection>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSection {
    #[serde(default)]
    pub section_number: Option<String>,

    #[serde(default)]
    pub section_name: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    pub label: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentEvent {
    pub fr_citation: String,
    pub date: Option<String>,
}

/// Canonical per-section artifact written by the normalizer and read back by
/// the ingestor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSection {
    pub anchor_id: String,
    pub citation_raw: Option<String>,
    pub section_number: Option<String>,
    pub short_title: String,
    pub title_number: String,
    pub part_number: Option<String>,
    pub section_name: String,
    pub fr_citations: Vec<String>,
    pub amend_history: Vec<AmendmentEvent>,
    pub cfr_citations: Vec<String>,
    pub paragraphs: Vec<ParagraphRecord>,
    pub enumerations: BTreeMap<String, Vec<String>>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeCounts {
    pub title_files_scanned: usize,
    pub sections_processed: usize,
    pub sections_skipped_unchanged: usize,
    pub documents_backfilled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub data_dir: String,
    pub output_dir: String,
    pub cache_path: String,
    pub counts: NormalizeCounts,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestCounts {
    pub artifacts_seen: usize,
    pub sections_written: usize,
    pub sections_skipped_unchanged: usize,
    pub artifacts_skipped_malformed: usize,
    pub sections_total: i64,
    pub paragraphs_total: i64,
    pub references_total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub sections_root: String,
    pub db_path: String,
    pub replace: bool,
    pub changed_only: bool,
    pub counts: IngestCounts,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsCounts {
    pub sections_scored: usize,
    pub parts_rolled_up: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub db_path: String,
    pub counts: MetricsCounts,
}
