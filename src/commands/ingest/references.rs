use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefType {
    Cfr,
    Usc,
    Fr,
    Eo,
    PubL,
}

impl RefType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            RefType::Cfr => "CFR",
            RefType::Usc => "USC",
            RefType::Fr => "FR",
            RefType::Eo => "EO",
            RefType::PubL => "PubL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferenceEdge {
    pub ref_type: RefType,
    pub raw: String,
    pub norm_target: String,
}

/// Multi-pattern extractor for the typed reference edges stored at
/// ingestion time. Duplicate matches within one section are kept as
/// separate edges so later frequency analysis can count them.
#[derive(Debug)]
pub(crate) struct ReferenceExtractor {
    cfr: Regex,
    usc: Regex,
    fr: Regex,
    eo: Regex,
    public_law: Regex,
}

impl ReferenceExtractor {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            cfr: Regex::new(r"(?i)\b(\d+)\s*CFR\s*§?\s*([\d\.]+[a-z\-]*)|§\s*([\d\.]+[a-z\-]*)")
                .context("failed to compile CFR reference regex")?,
            usc: Regex::new(r"(?i)\b(\d+)\s*U\.S\.C\.\s*§?\s*([\w\.\-\(\)]+)")
                .context("failed to compile USC reference regex")?,
            fr: Regex::new(r"\b\d+\s+FR\s+\d+\b")
                .context("failed to compile FR reference regex")?,
            eo: Regex::new(r"(?i)\bE\.?.?O\.?.?\s*\d{4,}\b")
                .context("failed to compile executive order regex")?,
            public_law: Regex::new(r"(?i)\bPub\.\s*L\.\s*\d+\-\d+\b")
                .context("failed to compile public law regex")?,
        })
    }

    pub(crate) fn extract(&self, text: &str) -> Vec<ReferenceEdge> {
        let mut edges = Vec::<ReferenceEdge>::new();

        for captures in self.cfr.captures_iter(text) {
            // Either the `<n> CFR § <sec>` surface form or a bare `§ <sec>`;
            // both collapse to the section number as the target.
            let Some(section) = captures.get(2).or_else(|| captures.get(3)) else {
                continue;
            };
            edges.push(ReferenceEdge {
                ref_type: RefType::Cfr,
                raw: captures[0].to_string(),
                norm_target: section.as_str().to_string(),
            });
        }

        for captures in self.usc.captures_iter(text) {
            edges.push(ReferenceEdge {
                ref_type: RefType::Usc,
                raw: captures[0].to_string(),
                norm_target: format!("{} USC {}", &captures[1], &captures[2]),
            });
        }

        for found in self.fr.find_iter(text) {
            edges.push(ReferenceEdge {
                ref_type: RefType::Fr,
                raw: found.as_str().to_string(),
                norm_target: found.as_str().to_string(),
            });
        }

        for found in self.eo.find_iter(text) {
            let raw = found.as_str().to_string();
            let norm_target = raw.to_uppercase().replace([' ', '.'], "");
            edges.push(ReferenceEdge {
                ref_type: RefType::Eo,
                raw,
                norm_target,
            });
        }

        for found in self.public_law.find_iter(text) {
            edges.push(ReferenceEdge {
                ref_type: RefType::PubL,
                raw: found.as_str().to_string(),
                norm_target: found.as_str().to_string(),
            });
        }

        edges
    }
}
