//! Extract per-language phonological inventories from the PHOIBLE dataset.
//!
//! Only four columns of the PHOIBLE CSV are used: the Glottocode (1), the
//! language name (3), the phoneme (6) and its allophones (7). Every phoneme
//! and its allophones are recorded as pairwise mutual allophones, both in the
//! language's own inventory and in the combined `"*"` inventory.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{DatasetError, DatasetResult};
use crate::normalize::normalize_ipa;
use crate::serialize::split_csv_record;
use crate::types::{AllophoneSet, Inventory, InventoryDataset, Phone, COMBINED_INVENTORY};

const GLOTTOCODE_COLUMN: usize = 1;
const LANGUAGE_NAME_COLUMN: usize = 3;
const PHONEME_COLUMN: usize = 6;
const ALLOPHONES_COLUMN: usize = 7;

const COMBINING_RING_ABOVE: &str = "\u{030a}";
const COMBINING_RING_BELOW: &str = "\u{0325}";

/// Glyph fixes for segments PHOIBLE writes inconsistently.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("tʂ", "ʈʂ"),
    ("tʂʼ", "ʈʂʼ"),
    ("tʃː", "t̠ʃː"),
    (COMBINING_RING_ABOVE, COMBINING_RING_BELOW),
];

/// Replace invalid glyphs inside a phone segment.
pub fn substitute(phone: &str) -> Phone {
    SUBSTITUTIONS
        .iter()
        .fold(phone.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Parse a space-separated allophone list. `NA` and the empty string mean none.
///
/// Tokens in angle brackets are graphemes and skipped; tokens such as `t̪|t`
/// contribute each of their parts.
pub fn parse_allophones(text: &str) -> AllophoneSet {
    if text.is_empty() || text == "NA" {
        return AllophoneSet::new();
    }
    let text = text.replace(COMBINING_RING_ABOVE, COMBINING_RING_BELOW);

    text.split_whitespace()
        .filter(|token| !token.contains(['<', '>', '⟨', '⟩']))
        .flat_map(|token| token.split('|'))
        .filter(|part| !part.is_empty())
        .map(|part| substitute(&normalize_ipa(part)))
        .collect()
}

/// Record `phoneme` and `allophones` as pairwise mutual allophones.
pub fn update_inventory(inventory: &mut Inventory, phoneme: &str, allophones: &AllophoneSet) {
    let mut phones: AllophoneSet = allophones.clone();
    phones.insert(phoneme.to_string());

    for phone in &phones {
        inventory
            .entry(phone.clone())
            .or_default()
            .extend(phones.iter().cloned());
    }
}

/// Build an inventory from groups of mutual allophones.
pub fn inventory_from_groups(groups: &[&[&str]]) -> Inventory {
    let mut inventory = Inventory::new();
    for group in groups {
        if let Some((phoneme, rest)) = group.split_first() {
            let allophones = rest.iter().map(|s| s.to_string()).collect();
            update_inventory(&mut inventory, phoneme, &allophones);
        }
    }
    inventory
}

/// Language key for a row: the Glottocode, or the language name without
/// whitespace when the Glottocode is unavailable.
fn language_key(glottocode: &str, language_name: &str) -> String {
    if glottocode == "NA" || glottocode.is_empty() {
        language_name.split_whitespace().collect()
    } else {
        glottocode.to_string()
    }
}

/// Read inventories from PHOIBLE CSV data. The first line is a header.
pub fn inventories_from_reader<R: Read>(reader: R) -> DatasetResult<InventoryDataset> {
    let mut inventories = InventoryDataset::new();
    let mut rows = 0usize;

    for (index, line) in BufReader::new(reader).lines().enumerate().skip(1) {
        let line = line?;
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_record(&line, line_number)?;
        if fields.len() <= ALLOPHONES_COLUMN {
            return Err(DatasetError::malformed(
                line_number,
                format!(
                    "expected at least {} fields, got {}",
                    ALLOPHONES_COLUMN + 1,
                    fields.len()
                ),
            ));
        }

        let code = language_key(&fields[GLOTTOCODE_COLUMN], &fields[LANGUAGE_NAME_COLUMN]);
        let raw_phoneme = substitute(&fields[PHONEME_COLUMN]);
        let mut allophones = parse_allophones(&fields[ALLOPHONES_COLUMN]);

        // Piped segments are treated as allophones of their first part.
        let (head, rest) = match raw_phoneme.split_once('|') {
            Some((head, rest)) => (head, Some(rest)),
            None => (raw_phoneme.as_str(), None),
        };
        if let Some(rest) = rest {
            allophones.extend(parse_allophones(&rest.replace('|', " ")));
        }
        let phoneme = normalize_ipa(head);

        update_inventory(
            inventories.entry(COMBINED_INVENTORY.to_string()).or_default(),
            &phoneme,
            &allophones,
        );
        update_inventory(inventories.entry(code).or_default(), &phoneme, &allophones);
        rows += 1;
    }

    debug!(rows, "parsed PHOIBLE rows");
    Ok(inventories)
}

/// Read inventories from a PHOIBLE CSV file.
pub fn read_inventories(path: impl AsRef<Path>) -> DatasetResult<InventoryDataset> {
    let path = path.as_ref();
    let inventories = inventories_from_reader(File::open(path)?)?;
    info!(
        path = %path.display(),
        languages = inventories.len().saturating_sub(1),
        "loaded phonological inventories"
    );
    Ok(inventories)
}

/// Phones of one inventory; empty when the language is unknown.
pub fn sounds(dataset: &InventoryDataset, language: &str) -> AllophoneSet {
    dataset
        .get(language)
        .map(|inventory| inventory.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "InventoryID,Glottocode,ISO6393,LanguageName,SpecificDialect,GlyphID,Phoneme,Allophones,Marginal,SegmentClass,Source";

    fn sample() -> String {
        [
            HEADER,
            "1,stan1293,eng,English,NA,0070,p,p pʰ,FALSE,consonant,spa",
            "1,stan1293,eng,English,NA,0062,b,b,FALSE,consonant,spa",
            "2,NA,NA,Modern Aramaic,NA,0074,t|t̪,NA,FALSE,consonant,upsid",
            "3,taga1270,tgl,Tagalog,NA,0064,d,\"d ɾ <r>\",FALSE,consonant,spa",
        ]
        .join("\n")
    }

    #[test]
    fn test_parse_allophones_with_pipe() {
        let allophones = parse_allophones("a|b c|d e");
        let expected: AllophoneSet = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        assert_eq!(allophones, expected);
    }

    #[test]
    fn test_parse_allophones_skips_graphemes_and_na() {
        assert!(parse_allophones("NA").is_empty());
        assert!(parse_allophones("").is_empty());
        let allophones = parse_allophones("x <x> ⟨y⟩");
        assert_eq!(allophones.len(), 1);
        assert!(allophones.contains("x"));
    }

    #[test]
    fn test_substitute_invalid_segments() {
        assert_eq!(substitute("tʂ"), "ʈʂ");
        assert_eq!(substitute("tʃː"), "t̠ʃː");
        assert_eq!(substitute("a\u{030a}"), "a\u{0325}");
    }

    #[test]
    fn test_update_inventory_is_symmetric() {
        let mut inventory = Inventory::new();
        let allophones: AllophoneSet = ["b".to_string(), "β".to_string()].into_iter().collect();
        update_inventory(&mut inventory, "p", &allophones);

        for (phone, set) in &inventory {
            assert!(set.contains(phone));
            for other in set {
                assert!(inventory[other].contains(phone));
            }
        }
        assert_eq!(inventory.len(), 3);
    }

    #[test]
    fn test_inventories_from_reader() {
        let dataset = inventories_from_reader(sample().as_bytes()).unwrap();

        assert!(dataset.contains_key("stan1293"));
        assert!(dataset.contains_key("ModernAramaic"));
        assert!(!dataset.contains_key("NA"));

        let english = &dataset["stan1293"];
        assert!(english["p"].contains("pʰ"));
        assert!(english["pʰ"].contains("p"));
        assert_eq!(english["b"].len(), 1);

        // Piped phoneme: first part is the phoneme, the rest allophones.
        let aramaic = &dataset["ModernAramaic"];
        assert!(aramaic["t"].contains(&normalize_ipa("t̪")));

        // Graphemes in angle brackets are dropped.
        let tagalog = &dataset["taga1270"];
        assert!(tagalog["d"].contains("ɾ"));
        assert!(!tagalog.contains_key("<r>"));
    }

    #[test]
    fn test_combined_inventory_is_superset() {
        let dataset = inventories_from_reader(sample().as_bytes()).unwrap();
        let combined = sounds(&dataset, COMBINED_INVENTORY);
        for (language, inventory) in &dataset {
            if language != COMBINED_INVENTORY {
                assert!(inventory.keys().all(|phone| combined.contains(phone)));
            }
        }
        assert!(sounds(&dataset, "unknown").is_empty());
    }

    #[test]
    fn test_short_row_is_malformed() {
        let data = format!("{HEADER}\n1,stan1293,eng");
        let err = inventories_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { line: 2, .. }));
    }
}
