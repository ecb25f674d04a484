use anyhow::{Context, Result};
use regex::Regex;

/// Compiled keyword classes behind the heuristic density metrics. The
/// alternations are case-insensitive and word-bounded; matching is
/// leftmost-first, so "shall not" counts once via its "shall" prefix.
#[derive(Debug)]
pub(crate) struct MetricPatterns {
    pub obligation: Regex,
    pub prohibition: Regex,
    pub ambiguity: Regex,
    pub feasibility: Regex,
    pub risk: Regex,
    pub small_entity: Regex,
    pub word: Regex,
    pub sentence_split: Regex,
    pub syllable: Regex,
}

impl MetricPatterns {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            obligation: Regex::new(r"(?i)\b(?:shall|must|may not|prohibited|required|shall not)\b")
                .context("failed to compile obligation keyword regex")?,
            prohibition: Regex::new(r"(?i)\b(?:may not|shall not|prohibited|ban|forbidden)\b")
                .context("failed to compile prohibition keyword regex")?,
            ambiguity: Regex::new(
                r"(?i)\b(?:reasonable|adequate|appropriate|sufficient|timely)\b",
            )
            .context("failed to compile ambiguity keyword regex")?,
            feasibility: Regex::new(r"(?i)\b(?:feasible|practicable|possible)\b")
                .context("failed to compile feasibility keyword regex")?,
            risk: Regex::new(r"(?i)\b(?:risk|hazard|exposure|threat)\b")
                .context("failed to compile risk keyword regex")?,
            small_entity: Regex::new(r"(?i)\b(?:small entity|small business|micro entity)\b")
                .context("failed to compile small entity keyword regex")?,
            word: Regex::new(r"[A-Za-z]+").context("failed to compile word regex")?,
            sentence_split: Regex::new(r"[.!?]+")
                .context("failed to compile sentence split regex")?,
            syllable: Regex::new(r"[aeiouy]+").context("failed to compile syllable regex")?,
        })
    }
}
