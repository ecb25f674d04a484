use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::ParagraphRecord;

#[derive(Debug)]
pub(crate) struct ParagraphSegmenter {
    amendment_block: Regex,
    block_split: Regex,
    enumerator: Regex,
    top_level_label: Regex,
    sub_label: Regex,
    horizontal_ws: Regex,
}

impl ParagraphSegmenter {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            amendment_block: Regex::new(r"\[[^\]]+?\]\s*$")
                .context("failed to compile amendment block regex")?,
            block_split: Regex::new(r"\n\s*\n+")
                .context("failed to compile paragraph split regex")?,
            enumerator: Regex::new(r"^\(([a-z0-9ivxlcdmIVXLCDM]+)\)")
                .context("failed to compile paragraph enumerator regex")?,
            top_level_label: Regex::new(r"^\([a-z]\)$")
                .context("failed to compile top-level label regex")?,
            sub_label: Regex::new(r"^\(\d+\)$").context("failed to compile sub-label regex")?,
            horizontal_ws: Regex::new(r"[ \t]+")
                .context("failed to compile horizontal whitespace regex")?,
        })
    }

    /// Split section body text into labeled paragraphs. The trailing
    /// amendment-history bracket is stripped before splitting so it never
    /// surfaces as a paragraph of its own.
    pub(crate) fn split_paragraphs(&self, content: &str) -> Vec<ParagraphRecord> {
        let without_history = self.amendment_block.replace(content, "");
        let body = without_history.trim_end();

        let mut paragraphs = Vec::<ParagraphRecord>::new();
        for raw_block in self.block_split.split(body) {
            let block = raw_block.trim_matches('\n');
            if block.trim().is_empty() {
                continue;
            }

            let (label, text) = match self.enumerator.captures(block) {
                Some(captures) => {
                    let label = format!("({})", &captures[1]);
                    let rest = block[captures[0].len()..].trim_start();
                    (Some(label), rest)
                }
                None => (None, block),
            };

            paragraphs.push(ParagraphRecord {
                label,
                text: self.collapse_whitespace(text),
            });
        }

        paragraphs
    }

    /// Group `(1)`-style sub-paragraphs under the most recent `(a)`-style
    /// top-level label. Sub-labels seen before any top-level label are not
    /// recorded.
    pub(crate) fn build_enumerations(
        &self,
        paragraphs: &[ParagraphRecord],
    ) -> BTreeMap<String, Vec<String>> {
        let mut enumerations = BTreeMap::<String, Vec<String>>::new();
        let mut current_top: Option<String> = None;

        for paragraph in paragraphs {
            let Some(label) = paragraph.label.as_deref() else {
                continue;
            };

            if self.top_level_label.is_match(label) {
                current_top = Some(label.to_string());
                continue;
            }

            if self.sub_label.is_match(label) {
                if let Some(top) = current_top.as_ref() {
                    enumerations
                        .entry(top.clone())
                        .or_default()
                        .push(format!("{} {}", label, paragraph.text));
                }
            }
        }

        enumerations
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        self.horizontal_ws.replace_all(text.trim(), " ").to_string()
    }
}
