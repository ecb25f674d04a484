use std::fs;

use anyhow::{Context, Result};

use crate::cli::{RenderArgs, RenderFormat};
use crate::model::NormalizedSection;

pub fn run(args: RenderArgs) -> Result<()> {
    let raw = fs::read(&args.artifact_path)
        .with_context(|| format!("failed to read {}", args.artifact_path.display()))?;
    let section: NormalizedSection = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.artifact_path.display()))?;

    let rendered = match args.format {
        RenderFormat::Html => render_section_html(&section),
        RenderFormat::Markdown => render_section_markdown(&section),
    };
    println!("{rendered}");

    Ok(())
}

pub(crate) fn render_section_html(section: &NormalizedSection) -> String {
    let body: Vec<String> = section
        .paragraphs
        .iter()
        .map(|paragraph| match paragraph.label.as_deref() {
            Some(label) => format!("<p><strong>{}</strong> {}</p>", label, paragraph.text),
            None => format!("<p>{}</p>", paragraph.text),
        })
        .collect();

    format!(
        "<article id='{}'><h2>{}</h2>\n{}\n</article>",
        section.anchor_id,
        section.section_name,
        body.join("\n")
    )
}

pub(crate) fn render_section_markdown(section: &NormalizedSection) -> String {
    let mut lines = vec![format!("## {}", section.section_name)];
    for paragraph in &section.paragraphs {
        match paragraph.label.as_deref() {
            Some(label) => lines.push(format!("**{}** {}", label, paragraph.text)),
            None => lines.push(paragraph.text.clone()),
        }
        lines.push(String::new());
    }

    format!("{}\n", lines.join("\n").trim())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::ParagraphRecord;

    fn sample_section() -> NormalizedSection {
        NormalizedSection {
            anchor_id: "title21-21-10".to_string(),
            citation_raw: Some("§ 21.10".to_string()),
            section_number: Some("21.10".to_string()),
            short_title: "Sections.".to_string(),
            title_number: "21".to_string(),
            part_number: Some("21".to_string()),
            section_name: "§ 21.10 Sections.".to_string(),
            fr_citations: Vec::new(),
            amend_history: Vec::new(),
            cfr_citations: Vec::new(),
            paragraphs: vec![
                ParagraphRecord {
                    label: Some("(a)".to_string()),
                    text: "Alpha.".to_string(),
                },
                ParagraphRecord {
                    label: None,
                    text: "Closing text.".to_string(),
                },
            ],
            enumerations: BTreeMap::new(),
            content: String::new(),
        }
    }

    #[test]
    fn html_render_anchors_article_and_bolds_labels() {
        let html = render_section_html(&sample_section());

        assert!(html.starts_with("<article id='title21-21-10'>"));
        assert!(html.contains("<h2>§ 21.10 Sections.</h2>"));
        assert!(html.contains("<p><strong>(a)</strong> Alpha.</p>"));
        assert!(html.contains("<p>Closing text.</p>"));
    }

    #[test]
    fn markdown_render_emits_heading_and_labels() {
        let markdown = render_section_markdown(&sample_section());

        assert!(markdown.starts_with("## § 21.10 Sections."));
        assert!(markdown.contains("**(a)** Alpha."));
        assert!(markdown.ends_with("Closing text.\n"));
    }
}
