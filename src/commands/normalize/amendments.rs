use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

use crate::model::AmendmentEvent;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct AmendmentHistory {
    pub fr_citations: Vec<String>,
    pub amend_history: Vec<AmendmentEvent>,
}

#[derive(Debug)]
pub(crate) struct AmendmentExtractor {
    amendment_block: Regex,
    fr_citation: Regex,
    full_date: Regex,
    cfr_citation: Regex,
}

impl AmendmentExtractor {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            amendment_block: Regex::new(r"\[([^\]]+?)\]\s*$")
                .context("failed to compile amendment block regex")?,
            fr_citation: Regex::new(r"\d+\s+FR\s+\d+")
                .context("failed to compile FR citation regex")?,
            full_date: Regex::new(
                r"(?:Jan\.|Feb\.|Mar\.|Apr\.|May|Jun\.|Jul\.|Aug\.|Sep\.|Oct\.|Nov\.|Dec\.)\s+\d{1,2},\s+\d{4}",
            )
            .context("failed to compile amendment date regex")?,
            cfr_citation: Regex::new(r"\b(\d+)\s+CFR\s+(\d+(?:\.\d+)*)")
                .context("failed to compile CFR citation regex")?,
        })
    }

    /// Extract the Federal Register amendment history from the trailing
    /// bracketed block, pairing the i-th citation with the i-th date found
    /// in the block. The pairing is positional and best-effort; a count
    /// mismatch is flagged, never realigned.
    pub(crate) fn extract_history(&self, content: &str) -> AmendmentHistory {
        let Some(captures) = self.amendment_block.captures(content) else {
            return AmendmentHistory::default();
        };
        let block = &captures[1];

        let citations: Vec<String> = self
            .fr_citation
            .find_iter(block)
            .map(|m| m.as_str().to_string())
            .collect();
        let dates: Vec<&str> = self.full_date.find_iter(block).map(|m| m.as_str()).collect();

        if !citations.is_empty() && citations.len() != dates.len() {
            warn!(
                citations = citations.len(),
                dates = dates.len(),
                "amendment citation/date count mismatch, pairing positionally"
            );
        }

        let amend_history = citations
            .iter()
            .enumerate()
            .map(|(index, citation)| AmendmentEvent {
                fr_citation: citation.clone(),
                date: dates.get(index).and_then(|raw| parse_amendment_date(raw)),
            })
            .collect();

        AmendmentHistory {
            fr_citations: citations,
            amend_history,
        }
    }

    /// Collect every `<n> CFR <sec>` citation in the text, deduplicated and
    /// sorted.
    pub(crate) fn extract_cfr_citations(&self, text: &str) -> Vec<String> {
        let mut citations = BTreeSet::<String>::new();
        for captures in self.cfr_citation.captures_iter(text) {
            citations.insert(format!("{} CFR {}", &captures[1], &captures[2]));
        }
        citations.into_iter().collect()
    }
}

fn parse_amendment_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(&raw.replace('.', ""), "%b %d, %Y")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}
