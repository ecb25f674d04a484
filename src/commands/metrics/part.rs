use anyhow::Result;
use rusqlite::{Connection, params};

#[derive(Debug)]
struct PartMember {
    word_count: i64,
    paragraph_count: i64,
    sentence_count: i64,
    obligation_density: Option<f64>,
    prohibition_density: Option<f64>,
    ambiguity_density: Option<f64>,
    feasibility_density: Option<f64>,
    risk_density: Option<f64>,
    small_entity_density: Option<f64>,
    obligation_per_word: Option<f64>,
    readability_grade: Option<f64>,
}

/// Recompute the per-part rollups from the current per-section metrics.
/// Counts are summed; ratios are averaged over member sections that have a
/// value, with missing values excluded rather than treated as zero. Parts
/// with no scored sections produce no row.
pub(crate) fn compute_part_metrics(connection: &Connection) -> Result<usize> {
    let parts: Vec<(i64, String)> = {
        let mut statement = connection.prepare(
            "SELECT title, part FROM sections WHERE part IS NOT NULL GROUP BY title, part",
        )?;
        let rows = statement.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut rolled_up = 0usize;

    for (title, part) in &parts {
        let members: Vec<PartMember> = {
            let mut statement = connection.prepare(
                "
                SELECT m.word_count, m.paragraph_count, m.sentence_count,
                       m.obligation_density, m.prohibition_density, m.ambiguity_density,
                       m.feasibility_density, m.risk_density, m.small_entity_density,
                       m.obligation_per_word, m.readability_grade
                FROM metrics_section m
                JOIN sections s ON s.uid = m.section_uid
                WHERE s.title = ?1 AND s.part = ?2
                ",
            )?;
            let rows = statement.query_map(params![title, part], |row| {
                Ok(PartMember {
                    word_count: row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                    paragraph_count: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    sentence_count: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    obligation_density: row.get(3)?,
                    prohibition_density: row.get(4)?,
                    ambiguity_density: row.get(5)?,
                    feasibility_density: row.get(6)?,
                    risk_density: row.get(7)?,
                    small_entity_density: row.get(8)?,
                    obligation_per_word: row.get(9)?,
                    readability_grade: row.get(10)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        if members.is_empty() {
            continue;
        }

        let word_count: i64 = members.iter().map(|member| member.word_count).sum();
        let paragraph_count: i64 = members.iter().map(|member| member.paragraph_count).sum();
        let sentence_count: i64 = members.iter().map(|member| member.sentence_count).sum();

        connection.execute(
            "
            INSERT INTO metrics_part(
              title, part, word_count, paragraph_count, sentence_count,
              obligation_density, prohibition_density, ambiguity_density,
              feasibility_density, risk_density, small_entity_density,
              obligation_per_word, readability_grade
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(title, part) DO UPDATE SET
              word_count=excluded.word_count,
              paragraph_count=excluded.paragraph_count,
              sentence_count=excluded.sentence_count,
              obligation_density=excluded.obligation_density,
              prohibition_density=excluded.prohibition_density,
              ambiguity_density=excluded.ambiguity_density,
              feasibility_density=excluded.feasibility_density,
              risk_density=excluded.risk_density,
              small_entity_density=excluded.small_entity_density,
              obligation_per_word=excluded.obligation_per_word,
              readability_grade=excluded.readability_grade
            ",
            params![
                title,
                part,
                word_count,
                paragraph_count,
                sentence_count,
                average(members.iter().map(|member| member.obligation_density)),
                average(members.iter().map(|member| member.prohibition_density)),
                average(members.iter().map(|member| member.ambiguity_density)),
                average(members.iter().map(|member| member.feasibility_density)),
                average(members.iter().map(|member| member.risk_density)),
                average(members.iter().map(|member| member.small_entity_density)),
                average(members.iter().map(|member| member.obligation_per_word)),
                average(members.iter().map(|member| member.readability_grade)),
            ],
        )?;

        rolled_up += 1;
    }

    Ok(rolled_up)
}

fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let values: Vec<f64> = values.flatten().collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
