use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{NormalizedSection, RawSection};

use super::amendments::AmendmentExtractor;
use super::heading::HeadingParser;
use super::paragraphs::ParagraphSegmenter;

/// Composes the heading, paragraph, and amendment extractors into one
/// canonical per-section record keyed by a stable anchor id.
#[derive(Debug)]
pub(crate) struct SectionNormalizer {
    heading: HeadingParser,
    segmenter: ParagraphSegmenter,
    amendments: AmendmentExtractor,
    part_number: Regex,
    section_number: Regex,
}

impl SectionNormalizer {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            heading: HeadingParser::new()?,
            segmenter: ParagraphSegmenter::new()?,
            amendments: AmendmentExtractor::new()?,
            part_number: Regex::new(r"PART\s+([0-9A-Za-z]+)")
                .context("failed to compile part number regex")?,
            section_number: Regex::new(r"^§\s*([0-9][0-9A-Za-z.\-]*)")
                .context("failed to compile section number regex")?,
        })
    }

    pub(crate) fn normalize_section(
        &self,
        section: &RawSection,
        title_number: &str,
        part_number: Option<&str>,
    ) -> NormalizedSection {
        let legacy_name = section.section_name.clone().unwrap_or_default();
        let heading = self.heading.parse(&legacy_name);

        let content_norm = section
            .content
            .clone()
            .unwrap_or_default()
            .replace('\r', "");

        let paragraphs = self.segmenter.split_paragraphs(&content_norm);
        let enumerations = self.segmenter.build_enumerations(&paragraphs);
        let history = self.amendments.extract_history(&content_norm);
        let cfr_citations = self.amendments.extract_cfr_citations(&content_norm);
        let anchor_id = anchor_id_for(title_number, heading.section_number.as_deref());

        NormalizedSection {
            anchor_id,
            citation_raw: heading.citation_raw,
            section_number: heading.section_number,
            short_title: heading.short_title,
            title_number: title_number.to_string(),
            part_number: part_number.map(str::to_string),
            section_name: legacy_name,
            fr_citations: history.fr_citations,
            amend_history: history.amend_history,
            cfr_citations,
            paragraphs,
            enumerations,
            content: content_norm,
        }
    }

    /// Infer a part number from free text like `PART 123—TEST PART`.
    pub(crate) fn backfill_part_number(&self, part_name: &str) -> Option<String> {
        self.part_number
            .captures(part_name)
            .map(|captures| captures[1].to_string())
    }

    /// Infer a section number from a legacy `§ <number> ...` heading.
    pub(crate) fn backfill_section_number(&self, legacy_name: &str) -> Option<String> {
        self.section_number
            .captures(legacy_name.trim_start())
            .map(|captures| captures[1].to_string())
    }
}

/// Stable anchor id: `title<T>-<section number with dots as hyphens>`, or a
/// `-unknown` suffix when no section number is derivable.
pub(crate) fn anchor_id_for(title_number: &str, section_number: Option<&str>) -> String {
    match section_number {
        Some(number) => format!("title{}-{}", title_number, number.replace('.', "-")),
        None => format!("title{}-unknown", title_number),
    }
}
