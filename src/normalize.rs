//! IPA normalization following PHOIBLE's segment conventions.
//!
//! Transcriptions are NFD-decomposed, then every run of modifier symbols
//! (diacritics and spacing modifier letters) is reordered into PHOIBLE's
//! canonical order so that equal segments compare equal as strings.

use unicode_normalization::UnicodeNormalization;

/// Modifier symbols and their PHOIBLE sort rank.
pub const MODIFIERS: &[(char, u8)] = &[
    // Place
    ('\u{0334}', 0),  // velarized/pharyngealized
    ('\u{033c}', 1),  // linguolabial
    ('\u{032a}', 2),  // dental
    ('\u{033a}', 3),  // apical
    ('\u{033b}', 4),  // laminal
    ('\u{031f}', 5),  // advanced
    ('\u{0320}', 6),  // retracted
    // Manner
    ('\u{0347}', 7),  // non-sibilant
    ('\u{031d}', 8),  // raised
    ('\u{031e}', 9),  // lowered
    ('\u{0318}', 10), // advanced tongue root
    ('\u{0319}', 11), // retracted tongue root
    ('\u{0353}', 12), // frictionalized
    // Secondary articulation
    ('\u{0339}', 13), // more round
    ('\u{031c}', 14), // less round
    // Laryngeal setting
    ('\u{0330}', 15), // creaky
    ('\u{0324}', 16), // breathy
    ('\u{032c}', 17), // voiced
    ('\u{0325}', 19), // devoiced, ring below
    ('\u{030a}', 20), // devoiced, ring above
    ('\u{0348}', 21), // fortis
    ('\u{0349}', 22), // lenis
    // Length
    ('\u{0306}', 23), // short
    // Syllabicity
    ('\u{0329}', 24), // syllabic
    ('\u{032f}', 25), // non-syllabic
    // Vowel quality
    ('\u{0303}', 26), // nasalized
    ('\u{034a}', 27), // denasalized
    ('\u{0308}', 28), // centralized
    ('\u{033d}', 29), // mid-centralized
    // Release
    ('\u{031a}', 30), // unreleased
    // Spacing modifier letters
    ('\u{02de}', 31), // rhotic hook
    ('\u{207f}', 31), // nasal release
    ('\u{02e1}', 31), // lateral release
    ('\u{02b7}', 31), // labialized
    ('\u{02b2}', 31), // palatalized
    ('\u{1da3}', 31), // labial-palatalized
    ('\u{02e0}', 31), // velarized
    ('\u{02e4}', 31), // pharyngealized
    ('\u{02c0}', 31), // glottalized
    ('\u{1d4a}', 31), // schwa-like release
    ('\u{1d31}', 31), // epilaryngeal source
    ('\u{02b0}', 31), // aspirated
    ('\u{02b1}', 31), // breathy aspirated
    ('\u{02bc}', 31), // ejective
    ('\u{02d0}', 31), // long
    ('\u{02d1}', 31), // half long
];

/// Sort rank of a modifier symbol, `None` for base symbols.
pub fn modifier_rank(symbol: char) -> Option<u8> {
    MODIFIERS
        .iter()
        .find(|(modifier, _)| *modifier == symbol)
        .map(|&(_, rank)| rank)
}

/// Normalize a transcription according to the convention used by PHOIBLE.
pub fn normalize_ipa(transcription: &str) -> String {
    let mut result = String::with_capacity(transcription.len());
    let mut pending: Vec<(u8, char)> = Vec::new();

    for symbol in transcription.nfd() {
        if let Some(rank) = modifier_rank(symbol) {
            pending.push((rank, symbol));
            continue;
        }
        flush_modifiers(&mut pending, &mut result);
        result.push(symbol);
    }
    flush_modifiers(&mut pending, &mut result);
    result
}

fn flush_modifiers(pending: &mut Vec<(u8, char)>, out: &mut String) {
    // Stable: equal ranks keep their input order.
    pending.sort_by_key(|&(rank, _)| rank);
    out.extend(pending.drain(..).map(|(_, symbol)| symbol));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_unicode_matches_nfd() {
        let example = "\u{00e4}"; // precomposed ä
        let output = normalize_ipa(example);
        assert_ne!(output, example);
        assert_eq!(output, "a\u{0308}");
    }

    #[test]
    fn test_modifiers_sorted_by_rank() {
        let mut symbols: Vec<char> = MODIFIERS.iter().map(|&(c, _)| c).collect();
        symbols.reverse();
        let input: String = symbols.into_iter().collect();

        let output = normalize_ipa(&input);
        let ranks: Vec<u8> = output.chars().filter_map(modifier_rank).collect();
        assert_eq!(ranks.len(), MODIFIERS.len());
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_modifier_runs_reset_at_base_symbols() {
        // aspirated before dental on t, nasalized vowel after
        let output = normalize_ipa("t\u{02b0}\u{032a}a\u{0303}");
        assert_eq!(output, "t\u{032a}\u{02b0}a\u{0303}");
    }

    #[test]
    fn test_equal_ranks_keep_input_order() {
        let output = normalize_ipa("k\u{02b7}\u{02b0}");
        assert_eq!(output, "k\u{02b7}\u{02b0}");
    }
}
