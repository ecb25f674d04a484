use std::fs;
use std::path::Path;

use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

use super::*;

fn count_edges(edges: &[ReferenceEdge], ref_type: RefType) -> usize {
    edges.iter().filter(|edge| edge.ref_type == ref_type).count()
}

#[test]
fn extract_recognizes_all_reference_kinds() {
    let extractor = ReferenceExtractor::new().expect("extractor");
    let edges = extractor.extract(
        "Under 12 CFR § 1026.4 and § 226.3, see 15 U.S.C. 1601 and 62 FR 100. \
         E.O. 12866 applies, as does Pub. L. 111-203.",
    );

    assert_eq!(count_edges(&edges, RefType::Cfr), 2);
    assert_eq!(count_edges(&edges, RefType::Usc), 1);
    assert_eq!(count_edges(&edges, RefType::Fr), 1);
    assert_eq!(count_edges(&edges, RefType::Eo), 1);
    assert_eq!(count_edges(&edges, RefType::PubL), 1);

    let cfr_targets: Vec<&str> = edges
        .iter()
        .filter(|edge| edge.ref_type == RefType::Cfr)
        .map(|edge| edge.norm_target.as_str())
        .collect();
    assert_eq!(cfr_targets, vec!["1026.4", "226.3"]);

    let usc = edges
        .iter()
        .find(|edge| edge.ref_type == RefType::Usc)
        .expect("usc edge");
    assert_eq!(usc.norm_target, "15 USC 1601");

    let eo = edges
        .iter()
        .find(|edge| edge.ref_type == RefType::Eo)
        .expect("eo edge");
    assert_eq!(eo.norm_target, "EO12866");
}

#[test]
fn extract_preserves_duplicate_references() {
    let extractor = ReferenceExtractor::new().expect("extractor");
    let edges = extractor.extract("First 12 CFR 1026.4, then 12 CFR 1026.4 again.");

    assert_eq!(count_edges(&edges, RefType::Cfr), 2);
    assert!(edges.iter().all(|edge| edge.norm_target == "1026.4"));
}

fn write_artifact(root: &Path, title: &str, file_name: &str, value: &serde_json::Value) {
    let dir = root.join("sections").join(format!("title{title}"));
    fs::create_dir_all(&dir).expect("create sections dir");
    fs::write(
        dir.join(file_name),
        serde_json::to_vec_pretty(value).expect("serialize artifact"),
    )
    .expect("write artifact");
}

fn open_store(path: &Path) -> Connection {
    let connection = Connection::open(path).expect("open db");
    configure_connection(&connection).expect("configure db");
    ensure_schema(&connection).expect("ensure schema");
    connection
}

fn seed_artifacts(root: &Path) {
    write_artifact(
        root,
        "1",
        "1_1.json",
        &json!({
            "anchor_id": "title1-1-1",
            "title_number": "1",
            "part_number": "1",
            "section_number": "1.1",
            "section_name": "§ 1.1 Heading",
            "paragraphs": [
                {"label": "(a)", "text": "Sample text with 12 CFR 1000.1 reference."}
            ]
        }),
    );
    write_artifact(
        root,
        "1",
        "1_2.json",
        &json!({
            "anchor_id": "title1-1-2",
            "title_number": "1",
            "part_number": "1",
            "section_number": "1.2",
            "section_name": "§ 1.2 [Reserved]",
            "content": "Another section referencing 15 U.S.C. 1601 and 12 CFR 1000.2"
        }),
    );
}

#[test]
fn artifact_reader_derives_flags_and_hash() {
    let dir = TempDir::new().expect("tempdir");
    seed_artifacts(dir.path());

    let reader = ArtifactReader::new().expect("reader");
    let files = collect_artifact_files(&dir.path().join("sections")).expect("collect");
    assert_eq!(files.len(), 2);

    let first = reader.load(&files[0]).expect("load first");
    assert_eq!(first.uid, "title1-1-1");
    assert_eq!(first.title, 1);
    assert_eq!(first.part.as_deref(), Some("1"));
    assert!(!first.is_reserved);
    assert_eq!(first.word_count, 7);

    let second = reader.load(&files[1]).expect("load second");
    assert!(second.is_reserved);
    assert!(second.text_norm.starts_with("Another section"));
}

#[test]
fn ingest_skips_malformed_artifacts_without_aborting() {
    let dir = TempDir::new().expect("tempdir");
    seed_artifacts(dir.path());
    fs::write(dir.path().join("sections/title1/broken.json"), "not json")
        .expect("write malformed artifact");

    let mut connection = open_store(&dir.path().join("analyzer.sqlite"));
    let reader = ArtifactReader::new().expect("reader");
    let extractor = ReferenceExtractor::new().expect("extractor");
    let files = collect_artifact_files(&dir.path().join("sections")).expect("collect");

    let outcome =
        ingest_sections(&mut connection, &files, &reader, &extractor, false, false)
            .expect("ingest");
    assert_eq!(outcome.written, 2);
    assert_eq!(outcome.skipped_malformed, 1);
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM sections").expect("count"),
        2
    );
}

#[test]
fn ingest_changed_only_skips_unchanged_sections() {
    let dir = TempDir::new().expect("tempdir");
    seed_artifacts(dir.path());

    let mut connection = open_store(&dir.path().join("analyzer.sqlite"));
    let reader = ArtifactReader::new().expect("reader");
    let extractor = ReferenceExtractor::new().expect("extractor");
    let files = collect_artifact_files(&dir.path().join("sections")).expect("collect");

    let first = ingest_sections(&mut connection, &files, &reader, &extractor, false, false)
        .expect("first ingest");
    assert_eq!(first.written, 2);

    let paragraphs_before =
        count_rows(&connection, "SELECT COUNT(*) FROM paragraphs").expect("count");
    let references_before = count_rows(&connection, "SELECT COUNT(*) FROM refs").expect("count");

    let second = ingest_sections(&mut connection, &files, &reader, &extractor, false, true)
        .expect("second ingest");
    assert_eq!(second.written, 0);
    assert_eq!(second.skipped_unchanged, 2);
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM paragraphs").expect("count"),
        paragraphs_before
    );
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM refs").expect("count"),
        references_before
    );

    // A text change flips the hash and the section is rewritten.
    write_artifact(
        dir.path(),
        "1",
        "1_1.json",
        &json!({
            "anchor_id": "title1-1-1",
            "title_number": "1",
            "part_number": "1",
            "section_number": "1.1",
            "section_name": "§ 1.1 Heading",
            "paragraphs": [
                {"label": "(a)", "text": "Amended text with 12 CFR 1000.9 reference."}
            ]
        }),
    );
    let third = ingest_sections(&mut connection, &files, &reader, &extractor, false, true)
        .expect("third ingest");
    assert_eq!(third.written, 1);
    assert_eq!(third.skipped_unchanged, 1);
}

#[test]
fn ingest_preserves_created_at_across_rewrites() {
    let dir = TempDir::new().expect("tempdir");
    seed_artifacts(dir.path());

    let mut connection = open_store(&dir.path().join("analyzer.sqlite"));
    let reader = ArtifactReader::new().expect("reader");
    let extractor = ReferenceExtractor::new().expect("extractor");
    let files = collect_artifact_files(&dir.path().join("sections")).expect("collect");

    ingest_sections(&mut connection, &files, &reader, &extractor, false, false).expect("first");
    let created_at: String = connection
        .query_row(
            "SELECT created_at FROM sections WHERE uid = 'title1-1-1'",
            [],
            |row| row.get(0),
        )
        .expect("created_at");

    ingest_sections(&mut connection, &files, &reader, &extractor, false, false).expect("second");
    let created_at_after: String = connection
        .query_row(
            "SELECT created_at FROM sections WHERE uid = 'title1-1-1'",
            [],
            |row| row.get(0),
        )
        .expect("created_at after");
    assert_eq!(created_at, created_at_after);
}

#[test]
fn ingest_replace_clears_derived_tables() {
    let dir = TempDir::new().expect("tempdir");
    seed_artifacts(dir.path());

    let mut connection = open_store(&dir.path().join("analyzer.sqlite"));
    let reader = ArtifactReader::new().expect("reader");
    let extractor = ReferenceExtractor::new().expect("extractor");
    let files = collect_artifact_files(&dir.path().join("sections")).expect("collect");

    ingest_sections(&mut connection, &files, &reader, &extractor, false, false).expect("seed");

    let outcome = ingest_sections(&mut connection, &[], &reader, &extractor, true, false)
        .expect("replace with empty batch");
    assert_eq!(outcome.written, 0);
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM sections").expect("count"),
        0
    );
    assert_eq!(
        count_rows(&connection, "SELECT COUNT(*) FROM refs").expect("count"),
        0
    );
}
