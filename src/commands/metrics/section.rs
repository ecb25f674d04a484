use super::patterns::MetricPatterns;

/// Metric vector computed for one section. Ratios are `None` whenever their
/// denominator is zero; the three graph/longitudinal metrics stay `None`
/// until amendment history and a cross-document reference graph exist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SectionScores {
    pub sentence_count: i64,
    pub structural_complexity: Option<f64>,
    pub compression_index: Option<f64>,
    pub obligation_density: Option<f64>,
    pub prohibition_density: Option<f64>,
    pub prohibition_balance: f64,
    pub ambiguity_density: Option<f64>,
    pub feasibility_density: Option<f64>,
    pub amendment_recency: Option<f64>,
    pub risk_density: Option<f64>,
    pub scope_reach: Option<f64>,
    pub reference_centrality: Option<f64>,
    pub small_entity_density: Option<f64>,
    pub obligation_per_word: Option<f64>,
    pub readability_grade: Option<f64>,
}

pub(crate) fn sentence_count(patterns: &MetricPatterns, text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    patterns
        .sentence_split
        .split(text)
        .filter(|span| !span.trim().is_empty())
        .count()
}

pub(crate) fn score_section(
    patterns: &MetricPatterns,
    text: &str,
    word_count: i64,
    paragraph_count: i64,
) -> SectionScores {
    let words = word_count.max(0) as f64;
    let paragraphs = paragraph_count.max(0) as f64;
    let sentences = sentence_count(patterns, text) as f64;

    let obligations = patterns.obligation.find_iter(text).count() as f64;
    let prohibitions = patterns.prohibition.find_iter(text).count() as f64;
    let ambiguities = patterns.ambiguity.find_iter(text).count() as f64;
    let feasibilities = patterns.feasibility.find_iter(text).count() as f64;
    let risks = patterns.risk.find_iter(text).count() as f64;
    let small_entities = patterns.small_entity.find_iter(text).count() as f64;

    let per_sentence = |count: f64| (sentences > 0.0).then(|| count / sentences);
    let per_word = |count: f64| (words > 0.0).then(|| count / words);

    SectionScores {
        sentence_count: sentences as i64,
        structural_complexity: (paragraphs > 0.0).then(|| sentences / paragraphs),
        compression_index: (words > 0.0).then(|| paragraphs / words),
        obligation_density: per_sentence(obligations),
        prohibition_density: per_sentence(prohibitions),
        prohibition_balance: prohibitions / (obligations + 1.0),
        ambiguity_density: per_word(ambiguities),
        feasibility_density: per_sentence(feasibilities),
        amendment_recency: None,
        risk_density: per_sentence(risks),
        scope_reach: None,
        reference_centrality: None,
        small_entity_density: per_word(small_entities),
        obligation_per_word: per_word(obligations),
        readability_grade: readability_grade(patterns, text),
    }
}

/// Two-factor grade-level formula over words-per-sentence and
/// syllables-per-word. Syllables are estimated as vowel-letter runs, a
/// coarse approximation.
pub(crate) fn readability_grade(patterns: &MetricPatterns, text: &str) -> Option<f64> {
    let words: Vec<&str> = patterns
        .word
        .find_iter(text)
        .map(|found| found.as_str())
        .collect();
    if words.is_empty() {
        return None;
    }

    let sentences = sentence_count(patterns, text);
    if sentences == 0 {
        return None;
    }

    let syllables: usize = words
        .iter()
        .map(|word| syllable_estimate(patterns, word))
        .sum();
    let word_total = words.len() as f64;

    Some(0.39 * (word_total / sentences as f64) + 11.8 * (syllables as f64 / word_total) - 15.59)
}

fn syllable_estimate(patterns: &MetricPatterns, word: &str) -> usize {
    let lower = word.to_lowercase();
    patterns.syllable.find_iter(&lower).count().max(1)
}
