//! Serialization of score data to CSV and JSON, and reading it back.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{DatasetError, DatasetResult};
use crate::normalize::normalize_ipa;
use crate::types::{Cooccurrence, ScoreData};

/// Digits beyond this are below `f64` resolution for scores in [0, 1].
const MAX_ROUNDING_DIGITS: u32 = 15;

/// Round `value` to `ndigits` decimal places. Past the precision of `f64` the
/// value is returned unchanged.
pub fn round_score(value: f64, ndigits: Option<u32>) -> f64 {
    match ndigits {
        Some(digits) if digits <= MAX_ROUNDING_DIGITS => {
            let scale = 10f64.powi(digits as i32);
            (value * scale).round() / scale
        }
        _ => value,
    }
}

/// Pairs eligible for output: self-pairs are skipped.
fn output_rows(scores: &ScoreData) -> impl Iterator<Item = (&Cooccurrence, f64)> {
    scores
        .iter()
        .filter(|(pair, _)| !pair.is_self_pair())
        .map(|(pair, &score)| (pair, score))
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write `phone1,phone2,score` rows with `phone1 < phone2`.
pub fn write_csv<W: Write>(writer: W, scores: &ScoreData, ndigits: Option<u32>) -> DatasetResult<()> {
    let mut writer = BufWriter::new(writer);
    for (pair, score) in output_rows(scores) {
        writeln!(
            writer,
            "{},{},{}",
            csv_field(pair.first()),
            csv_field(pair.second()),
            round_score(score, ndigits)
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Save score data as a CSV file.
pub fn save_as_csv(path: impl AsRef<Path>, scores: &ScoreData, ndigits: Option<u32>) -> DatasetResult<()> {
    write_csv(File::create(path)?, scores, ndigits)
}

/// JSON document `{"similarity": {"<phone1> <phone2>": score}}`.
pub fn to_json_value(scores: &ScoreData, ndigits: Option<u32>) -> Value {
    let data: Map<String, Value> = output_rows(scores)
        .map(|(pair, score)| {
            (
                format!("{} {}", pair.first(), pair.second()),
                Value::from(round_score(score, ndigits)),
            )
        })
        .collect();

    let mut root = Map::new();
    root.insert("similarity".to_string(), Value::Object(data));
    Value::Object(root)
}

/// Write score data as JSON. Non-ASCII phones are written unescaped.
pub fn write_json<W: Write>(writer: W, scores: &ScoreData, ndigits: Option<u32>) -> DatasetResult<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer(&mut writer, &to_json_value(scores, ndigits))?;
    writer.flush()?;
    Ok(())
}

/// Save score data as a JSON file.
pub fn save_as_json(path: impl AsRef<Path>, scores: &ScoreData, ndigits: Option<u32>) -> DatasetResult<()> {
    write_json(File::create(path)?, scores, ndigits)
}

/// Split one CSV line into fields, honoring double-quoted fields.
pub(crate) fn split_csv_record(line: &str, line_number: usize) -> DatasetResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match (quoted, c) {
            (true, '"') if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            (true, '"') => quoted = false,
            (true, c) => field.push(c),
            (false, '"') if field.is_empty() => quoted = true,
            (false, ',') => fields.push(std::mem::take(&mut field)),
            (false, c) => field.push(c),
        }
    }
    if quoted {
        return Err(DatasetError::malformed(line_number, "unterminated quoted field"));
    }
    fields.push(field);
    Ok(fields)
}

/// Read `phone1,phone2,score` rows. Phones are re-normalized and each pair
/// is stored in canonical order.
pub fn read_csv<R: Read>(reader: R) -> DatasetResult<ScoreData> {
    let mut scores = ScoreData::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let fields = split_csv_record(line, line_number)?;
        let [phone1, phone2, token] = fields.as_slice() else {
            return Err(DatasetError::malformed(
                line_number,
                format!("expected 3 fields, got {}", fields.len()),
            ));
        };
        let score: f64 = token.trim().parse().map_err(|_| {
            DatasetError::malformed(line_number, format!("invalid score {token:?}"))
        })?;

        scores.insert(
            Cooccurrence::new(normalize_ipa(phone1), normalize_ipa(phone2)),
            score,
        );
    }
    Ok(scores)
}

/// Read score data from a CSV file.
pub fn read_from_csv(path: impl AsRef<Path>) -> DatasetResult<ScoreData> {
    read_csv(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScoreData {
        let mut scores = ScoreData::new();
        scores.insert(Cooccurrence::new("n", "m"), 0.123456);
        scores.insert(Cooccurrence::new("a", "a"), 0.0);
        scores
    }

    #[test]
    fn test_csv_skips_self_pairs_and_rounds() {
        let mut out = Vec::new();
        write_csv(&mut out, &sample(), Some(2)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "m,n,0.12\n");
    }

    #[test]
    fn test_json_keeps_unicode_unescaped() {
        let mut scores = ScoreData::new();
        scores.insert(Cooccurrence::new("á", "ä"), 0.1);

        let mut out = Vec::new();
        write_json(&mut out, &scores, None).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains('á'));
        assert!(text.contains('ä'));
        assert!(!text.contains('\\'));
        assert!(text.starts_with(r#"{"similarity":{"#));
    }

    #[test]
    fn test_read_csv_canonicalizes_pairs() {
        let scores = read_csv("n,m,0.5\n".as_bytes()).unwrap();
        assert_eq!(scores.get(&Cooccurrence::new("m", "n")), Some(&0.5));
    }

    #[test]
    fn test_read_csv_rejects_bad_rows() {
        let err = read_csv("m,n\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { line: 1, .. }));

        let err = read_csv("m,n,0.5\nm,ŋ,high\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_split_csv_record_quotes() {
        let fields = split_csv_record(r#"a,"b c","say ""hi""""#, 1).unwrap();
        assert_eq!(fields, vec!["a", "b c", r#"say "hi""#]);
        assert!(split_csv_record(r#"a,"b"#, 1).is_err());
    }

    #[test]
    fn test_saved_csv_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let mut scores = ScoreData::new();
        scores.insert(Cooccurrence::new("n", "ŋ"), 0.75);
        scores.insert(Cooccurrence::new("m", "n"), 0.5);

        save_as_csv(&path, &scores, None).unwrap();
        assert_eq!(read_from_csv(&path).unwrap(), scores);

        save_as_json(dir.path().join("scores.json"), &scores, Some(1)).unwrap();
        let text = std::fs::read_to_string(dir.path().join("scores.json")).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["similarity"]["m n"], 0.5);
        assert_eq!(value["similarity"]["n ŋ"], 0.8);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.125, None), 0.125);
        assert_eq!(round_score(0.987, Some(1)), 1.0);
    }

    #[test]
    fn test_round_score_past_precision_keeps_value() {
        assert_eq!(round_score(0.5, Some(400)), 0.5);
        assert_eq!(round_score(0.123, Some(u32::MAX)), 0.123);
        assert_eq!(round_score(0.25, Some(16)), 0.25);

        let mut scores = ScoreData::new();
        scores.insert(Cooccurrence::new("m", "n"), 0.5);
        let mut out = Vec::new();
        write_csv(&mut out, &scores, Some(400)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "m,n,0.5\n");
    }
}
