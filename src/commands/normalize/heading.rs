use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadingParts {
    pub citation_raw: Option<String>,
    pub section_number: Option<String>,
    pub short_title: String,
}

#[derive(Debug)]
pub(crate) struct HeadingParser {
    heading: Regex,
}

impl HeadingParser {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(r"^(§\s*([0-9][0-9A-Za-z.\-]*))\s+(.+?)\s*$")
                .context("failed to compile section heading regex")?,
        })
    }

    /// Parse a legacy `§ <number> <title>` heading into a structured
    /// citation. Headings with no recognizable structure degrade to an
    /// unstructured short title; this never fails.
    pub(crate) fn parse(&self, section_name: &str) -> HeadingParts {
        let trimmed = section_name.trim();
        let Some(captures) = self.heading.captures(trimmed) else {
            return HeadingParts {
                citation_raw: None,
                section_number: None,
                short_title: trimmed.to_string(),
            };
        };

        HeadingParts {
            citation_raw: captures.get(1).map(|value| value.as_str().to_string()),
            section_number: captures.get(2).map(|value| value.as_str().to_string()),
            short_title: captures
                .get(3)
                .map(|value| value.as_str().trim().to_string())
                .unwrap_or_default(),
        }
    }
}
