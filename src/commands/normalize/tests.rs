use std::fs;

use tempfile::TempDir;

use super::*;
use crate::model::RawSection;

fn raw_section(name: &str, content: &str) -> RawSection {
    RawSection {
        section_number: None,
        section_name: Some(name.to_string()),
        content: Some(content.to_string()),
        extra: serde_json::Map::new(),
    }
}

#[test]
fn parse_heading_extracts_number_and_title() {
    let parser = HeadingParser::new().expect("parser");
    let parts = parser.parse("§ 10.2   Scope and sources.");

    assert_eq!(parts.section_number.as_deref(), Some("10.2"));
    assert!(parts.short_title.contains("Scope"));
    assert_eq!(parts.citation_raw.as_deref(), Some("§ 10.2"));
}

#[test]
fn parse_heading_degrades_to_short_title() {
    let parser = HeadingParser::new().expect("parser");
    let parts = parser.parse("  Appendix A to Part 10  ");

    assert_eq!(parts.citation_raw, None);
    assert_eq!(parts.section_number, None);
    assert_eq!(parts.short_title, "Appendix A to Part 10");
}

#[test]
fn split_paragraphs_labels_and_collapses_whitespace() {
    let segmenter = ParagraphSegmenter::new().expect("segmenter");
    let paragraphs = segmenter.split_paragraphs(
        "Intro text  with   spaces.\n\n(a) General rule.\n\n(1) First item.\n\n\n\n",
    );

    assert_eq!(paragraphs.len(), 3);
    assert_eq!(paragraphs[0].label, None);
    assert_eq!(paragraphs[0].text, "Intro text with spaces.");
    assert_eq!(paragraphs[1].label.as_deref(), Some("(a)"));
    assert_eq!(paragraphs[1].text, "General rule.");
    assert_eq!(paragraphs[2].label.as_deref(), Some("(1)"));
}

#[test]
fn split_paragraphs_strips_amendment_block() {
    let segmenter = ParagraphSegmenter::new().expect("segmenter");
    let paragraphs =
        segmenter.split_paragraphs("Body paragraph.\n\n[62 FR 100, Mar. 2, 1997]");

    assert_eq!(paragraphs.len(), 1);
    assert_eq!(paragraphs[0].text, "Body paragraph.");
}

#[test]
fn build_enumerations_groups_sub_items_under_top_label() {
    let segmenter = ParagraphSegmenter::new().expect("segmenter");
    let paragraphs = segmenter.split_paragraphs(
        "(a) General rule.\n\n(1) First item.\n\n(2) Second item.\n\n(b) Exceptions.",
    );

    let enumerations = segmenter.build_enumerations(&paragraphs);
    assert_eq!(
        enumerations.get("(a)"),
        Some(&vec![
            "(1) First item.".to_string(),
            "(2) Second item.".to_string()
        ])
    );
    assert!(!enumerations.contains_key("(b)"));
}

#[test]
fn build_enumerations_ignores_sub_items_with_no_open_group() {
    let segmenter = ParagraphSegmenter::new().expect("segmenter");
    let paragraphs = segmenter.split_paragraphs("(1) Orphan item.\n\nPlain text.");

    assert!(segmenter.build_enumerations(&paragraphs).is_empty());
}

#[test]
fn extract_history_pairs_citations_with_dates() {
    let extractor = AmendmentExtractor::new().expect("extractor");
    let history = extractor
        .extract_history("Body text.\n\n[62 FR 100, Mar. 2, 1997; 63 FR 200, Apr. 15, 1998]");

    assert_eq!(history.fr_citations, vec!["62 FR 100", "63 FR 200"]);
    assert_eq!(history.amend_history.len(), 2);
    assert_eq!(history.amend_history[0].date.as_deref(), Some("1997-03-02"));
    assert_eq!(history.amend_history[1].date.as_deref(), Some("1998-04-15"));
}

#[test]
fn extract_history_leaves_unmatched_citations_undated() {
    let extractor = AmendmentExtractor::new().expect("extractor");
    let history = extractor.extract_history("Body.\n\n[62 FR 100; 63 FR 200, Apr. 15, 1998]");

    assert_eq!(history.amend_history.len(), 2);
    assert_eq!(history.amend_history[0].date.as_deref(), Some("1998-04-15"));
    assert_eq!(history.amend_history[1].date, None);
}

#[test]
fn extract_history_without_block_is_empty() {
    let extractor = AmendmentExtractor::new().expect("extractor");
    let history = extractor.extract_history("No amendment history here.");

    assert!(history.fr_citations.is_empty());
    assert!(history.amend_history.is_empty());
}

#[test]
fn extract_cfr_citations_dedupes_and_sorts() {
    let extractor = AmendmentExtractor::new().expect("extractor");
    let citations = extractor.extract_cfr_citations(
        "See 12 CFR 1026.5 and 12 CFR 1026.4; also 12 CFR 1026.4 again.",
    );

    assert_eq!(citations, vec!["12 CFR 1026.4", "12 CFR 1026.5"]);
}

#[test]
fn normalize_section_builds_stable_anchor() {
    let normalizer = SectionNormalizer::new().expect("normalizer");
    let section = raw_section("§ 21.10   Sections.", "§ 21.10   Sections.\n(a) Alpha.");

    let normalized = normalizer.normalize_section(&section, "21", None);
    assert_eq!(normalized.anchor_id, "title21-21-10");
    assert!(!normalized.paragraphs.is_empty());
    assert_eq!(normalized.section_number.as_deref(), Some("21.10"));
}

#[test]
fn normalize_section_without_number_uses_unknown_anchor() {
    let normalizer = SectionNormalizer::new().expect("normalizer");
    let section = raw_section("Appendix A", "Some appendix text.");

    let normalized = normalizer.normalize_section(&section, "21", Some("100"));
    assert_eq!(normalized.anchor_id, "title21-unknown");
    assert_eq!(normalized.part_number.as_deref(), Some("100"));
}

#[test]
fn backfill_patterns_recover_numbers() {
    let normalizer = SectionNormalizer::new().expect("normalizer");

    assert_eq!(
        normalizer.backfill_part_number("PART 123—TEST PART").as_deref(),
        Some("123")
    );
    assert_eq!(normalizer.backfill_part_number("Subpart A"), None);
    assert_eq!(
        normalizer
            .backfill_section_number("§ 123.4 Sample section.")
            .as_deref(),
        Some("123.4")
    );
    assert_eq!(normalizer.backfill_section_number("Sample section."), None);
}

#[test]
fn cache_round_trips_and_survives_corrupt_file() {
    let dir = TempDir::new().expect("tempdir");

    let mut cache = NormalizationCache::load(dir.path());
    assert_eq!(cache.len(), 0);

    cache.record("title1-1-1".to_string(), "abc".to_string());
    cache.save(dir.path()).expect("save cache");

    let reloaded = NormalizationCache::load(dir.path());
    assert!(reloaded.is_unchanged("title1-1-1", "abc"));
    assert!(!reloaded.is_unchanged("title1-1-1", "other"));

    fs::write(dir.path().join(CACHE_FILENAME), "not json").expect("corrupt cache");
    assert_eq!(NormalizationCache::load(dir.path()).len(), 0);
}

const TITLE_DOC: &str = r#"{
  "title_number": "21",
  "parts": [
    {
      "part_number": null,
      "part_name": "PART 123—TEST PART",
      "sections": [
        {
          "section_number": null,
          "section_name": "§ 123.4 Sample section.",
          "content": "§ 123.4 Sample section.\n\n(a) General rule with 12 CFR 1026.4.\n\n[62 FR 100, Mar. 2, 1997]"
        }
      ]
    }
  ]
}"#;

#[test]
fn normalize_title_file_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let title_path = dir.path().join("title21.json");
    fs::write(&title_path, TITLE_DOC).expect("write title doc");

    let normalizer = SectionNormalizer::new().expect("normalizer");
    let mut cache = NormalizationCache::load(dir.path());

    let first =
        normalize_title_file(&title_path, dir.path(), &normalizer, &mut cache).expect("first run");
    assert_eq!(first.sections_written, 1);
    assert_eq!(first.sections_skipped, 0);
    assert!(first.backfilled);
    assert!(dir.path().join("sections/title21/123_4.json").exists());

    let second =
        normalize_title_file(&title_path, dir.path(), &normalizer, &mut cache).expect("second run");
    assert_eq!(second.sections_written, 0);
    assert_eq!(second.sections_skipped, 1);
    assert!(!second.backfilled);
}

#[test]
fn normalize_title_file_backfills_part_and_section_numbers() {
    let dir = TempDir::new().expect("tempdir");
    let title_path = dir.path().join("title21.json");
    fs::write(&title_path, TITLE_DOC).expect("write title doc");

    let normalizer = SectionNormalizer::new().expect("normalizer");
    let mut cache = NormalizationCache::load(dir.path());
    normalize_title_file(&title_path, dir.path(), &normalizer, &mut cache).expect("run");

    let rewritten: serde_json::Value =
        serde_json::from_slice(&fs::read(&title_path).expect("read rewritten"))
            .expect("parse rewritten");
    assert_eq!(rewritten["parts"][0]["part_number"], "123");
    assert_eq!(rewritten["parts"][0]["sections"][0]["section_number"], "123.4");
}
