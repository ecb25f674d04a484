use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::util::sha256_hex;

/// Lenient view of one per-section artifact file. Field aliases cover both
/// normalizer output and hand-built artifacts; numbers may arrive as JSON
/// strings or integers.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SectionArtifact {
    #[serde(default)]
    pub anchor_id: Option<String>,

    #[serde(default)]
    pub section_name: Option<String>,

    #[serde(default)]
    pub heading: Option<String>,

    #[serde(default, alias = "title")]
    pub title_number: Option<serde_json::Value>,

    #[serde(default, alias = "part")]
    pub part_number: Option<serde_json::Value>,

    #[serde(default, alias = "section")]
    pub section_number: Option<serde_json::Value>,

    #[serde(default)]
    pub paragraphs: Vec<ArtifactParagraph>,

    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ArtifactParagraph {
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub text: String,
}

/// One section as it will be written to the store.
#[derive(Debug)]
pub(crate) struct SectionRecord {
    pub uid: String,
    pub title: i64,
    pub part: Option<String>,
    pub section: Option<String>,
    pub heading: String,
    pub text_norm: String,
    pub word_count: i64,
    pub paragraphs: Vec<ArtifactParagraph>,
    pub chash: String,
    pub is_reserved: bool,
    pub is_definition: bool,
}

#[derive(Debug)]
pub(crate) struct ArtifactReader {
    reserved: Regex,
    definition: Regex,
}

impl ArtifactReader {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            reserved: Regex::new(r"(?i)\[RESERVED\]")
                .context("failed to compile reserved heading regex")?,
            definition: Regex::new(r"(?i)\bDefinitions\b")
                .context("failed to compile definitions heading regex")?,
        })
    }

    pub(crate) fn load(&self, path: &Path) -> Result<SectionRecord> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let artifact: SectionArtifact = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let stem = path
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or_default()
            .to_string();
        let uid = artifact
            .anchor_id
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or(stem);

        let heading = artifact
            .section_name
            .clone()
            .or_else(|| artifact.heading.clone())
            .unwrap_or_default();

        let joined = artifact
            .paragraphs
            .iter()
            .map(|paragraph| paragraph.text.as_str())
            .collect::<Vec<&str>>()
            .join("\n");
        let text = if joined.is_empty() {
            artifact.content.clone().unwrap_or_default()
        } else {
            joined
        };
        let text_norm = text.trim().to_string();

        Ok(SectionRecord {
            uid,
            title: value_as_i64(artifact.title_number.as_ref()),
            part: value_as_string(artifact.part_number.as_ref()),
            section: value_as_string(artifact.section_number.as_ref()),
            is_reserved: self.reserved.is_match(&heading),
            is_definition: self.definition.is_match(&heading),
            word_count: text_norm.split_whitespace().count() as i64,
            chash: sha256_hex(&text_norm),
            heading,
            text_norm,
            paragraphs: artifact.paragraphs,
        })
    }
}

/// Collect every artifact file under the sections root, in a stable order.
/// A missing root yields an empty batch rather than an error.
pub(crate) fn collect_artifact_files(sections_root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::<PathBuf>::new();
    if sections_root.exists() {
        collect_json_files(sections_root, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

fn value_as_string(value: Option<&serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

fn value_as_i64(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(number)) => number.as_i64().unwrap_or(0),
        Some(serde_json::Value::String(text)) => text.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}
