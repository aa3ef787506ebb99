//! French number words, 0 to 100.
//!
//! Speech-to-text hands us noisy transcripts ("euh... douze", "soixante
//! quinze", "Quatre-Vingt-Dix-Neuf"), so [`parse`] is deliberately
//! permissive. Lookup runs through five stages and stops at the first hit:
//!
//! 1. exact match on the normalized text,
//! 2. the same with spaces turned into hyphens,
//! 3. the same with hyphens turned into spaces,
//! 4. a literal digit run between 0 and 100 (`"j'ai 12"`),
//! 5. a word-bounded scan for any known phrase, longest phrase first.
//!
//! [`format`] is the inverse, preferring hyphenated spellings. Many
//! spellings map to the same number, so only `parse(format(n)) == n` holds.

use std::collections::HashMap;
use std::sync::OnceLock;

use unicode_normalization::UnicodeNormalization;

/// 0 to 16, in the order their spellings are preferred.
const UNITS: &[(&str, u32)] = &[
    ("zéro", 0),
    ("zero", 0),
    ("un", 1),
    ("une", 1),
    ("deux", 2),
    ("trois", 3),
    ("quatre", 4),
    ("cinq", 5),
    ("six", 6),
    ("sept", 7),
    ("huit", 8),
    ("neuf", 9),
    ("dix", 10),
    ("onze", 11),
    ("douze", 12),
    ("treize", 13),
    ("quatorze", 14),
    ("quinze", 15),
    ("seize", 16),
];

const TEENS: &[(&str, u32)] = &[
    ("dix-sept", 17),
    ("dix sept", 17),
    ("dix-huit", 18),
    ("dix huit", 18),
    ("dix-neuf", 19),
    ("dix neuf", 19),
];

/// Regular tens; units 1-9 are attached programmatically.
const TENS: &[(&str, u32)] = &[
    ("vingt", 20),
    ("trente", 30),
    ("quarante", 40),
    ("cinquante", 50),
    ("soixante", 60),
];

/// 70-100. The vigesimal forms follow no pattern, so they are listed.
const VIGESIMAL: &[(&str, u32)] = &[
    ("soixante-dix", 70),
    ("soixante dix", 70),
    ("soixante et onze", 71),
    ("soixante-onze", 71),
    ("soixante onze", 71),
    ("soixante-douze", 72),
    ("soixante douze", 72),
    ("soixante-treize", 73),
    ("soixante treize", 73),
    ("soixante-quatorze", 74),
    ("soixante quatorze", 74),
    ("soixante-quinze", 75),
    ("soixante quinze", 75),
    ("soixante-seize", 76),
    ("soixante seize", 76),
    ("soixante-dix-sept", 77),
    ("soixante dix sept", 77),
    ("soixante-dix-huit", 78),
    ("soixante dix huit", 78),
    ("soixante-dix-neuf", 79),
    ("soixante dix neuf", 79),
    ("quatre-vingts", 80),
    ("quatre vingts", 80),
    ("quatre-vingt", 80),
    ("quatre vingt", 80),
    ("quatre-vingt-un", 81),
    ("quatre vingt un", 81),
    ("quatre-vingt-une", 81),
    ("quatre-vingt-deux", 82),
    ("quatre vingt deux", 82),
    ("quatre-vingt-trois", 83),
    ("quatre vingt trois", 83),
    ("quatre-vingt-quatre", 84),
    ("quatre vingt quatre", 84),
    ("quatre-vingt-cinq", 85),
    ("quatre vingt cinq", 85),
    ("quatre-vingt-six", 86),
    ("quatre vingt six", 86),
    ("quatre-vingt-sept", 87),
    ("quatre vingt sept", 87),
    ("quatre-vingt-huit", 88),
    ("quatre vingt huit", 88),
    ("quatre-vingt-neuf", 89),
    ("quatre vingt neuf", 89),
    ("quatre-vingt-dix", 90),
    ("quatre vingt dix", 90),
    ("quatre-vingt-onze", 91),
    ("quatre vingt onze", 91),
    ("quatre-vingt-douze", 92),
    ("quatre vingt douze", 92),
    ("quatre-vingt-treize", 93),
    ("quatre vingt treize", 93),
    ("quatre-vingt-quatorze", 94),
    ("quatre vingt quatorze", 94),
    ("quatre-vingt-quinze", 95),
    ("quatre vingt quinze", 95),
    ("quatre-vingt-seize", 96),
    ("quatre vingt seize", 96),
    ("quatre-vingt-dix-sept", 97),
    ("quatre vingt dix sept", 97),
    ("quatre-vingt-dix-huit", 98),
    ("quatre vingt dix huit", 98),
    ("quatre-vingt-dix-neuf", 99),
    ("quatre vingt dix neuf", 99),
    ("cent", 100),
];

struct NumberTable {
    /// Every spelling, in preference order.
    spellings: Vec<(String, u32)>,
    /// Normalized spelling to value.
    lookup: HashMap<String, u32>,
    /// Normalized, hyphen-free spellings, longest first, for the substring scan.
    by_length: Vec<(String, u32)>,
}

impl NumberTable {
    fn build() -> Self {
        let mut spellings: Vec<(String, u32)> = Vec::new();
        let mut push = |word: String, value: u32| {
            if !spellings.iter().any(|(w, _)| *w == word) {
                spellings.push((word, value));
            }
        };

        for &(word, value) in UNITS.iter().chain(TEENS) {
            push(word.to_string(), value);
        }

        for &(tens, tens_value) in TENS {
            push(tens.to_string(), tens_value);
            for &(unit, unit_value) in UNITS {
                match unit_value {
                    1 => {
                        push(format!("{} et un", tens), tens_value + 1);
                        push(format!("{}-et-un", tens), tens_value + 1);
                        push(format!("{} et une", tens), tens_value + 1);
                    }
                    2..=9 => {
                        push(format!("{}-{}", tens, unit), tens_value + unit_value);
                        push(format!("{} {}", tens, unit), tens_value + unit_value);
                    }
                    _ => {}
                }
            }
        }

        for &(word, value) in VIGESIMAL {
            push(word.to_string(), value);
        }

        let mut lookup = HashMap::with_capacity(spellings.len());
        for (word, value) in &spellings {
            lookup.entry(normalize(word)).or_insert(*value);
        }

        // The scan runs on hyphen-free text, so phrases are stored spaced.
        let mut spaced: HashMap<String, u32> = HashMap::new();
        for (word, value) in &lookup {
            spaced.entry(word.replace('-', " ")).or_insert(*value);
        }
        let mut by_length: Vec<(String, u32)> = spaced.into_iter().collect();
        // Longest first; ties broken alphabetically so the scan is deterministic.
        by_length.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            spellings,
            lookup,
            by_length,
        }
    }
}

fn table() -> &'static NumberTable {
    static TABLE: OnceLock<NumberTable> = OnceLock::new();
    TABLE.get_or_init(NumberTable::build)
}

/// Lowercase, trim, strip diacritics and collapse whitespace runs.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a French number (words or digits) between 0 and 100.
///
/// Returns `None` when nothing in the text is recognized.
pub fn parse(text: &str) -> Option<u32> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }
    let table = table();

    if let Some(&value) = table.lookup.get(&normalized) {
        return Some(value);
    }

    let with_hyphens = normalized.replace(' ', "-");
    if let Some(&value) = table.lookup.get(&with_hyphens) {
        return Some(value);
    }

    let with_spaces = normalized.replace('-', " ");
    if let Some(&value) = table.lookup.get(&with_spaces) {
        return Some(value);
    }

    if let Some(value) = first_digit_run(&normalized).filter(|v| *v <= 100) {
        return Some(value as u32);
    }

    scan_phrases(&with_spaces)
}

/// Parse the primary transcript, then each alternative in order.
pub fn parse_best<S: AsRef<str>>(primary: &str, alternatives: &[S]) -> Option<u32> {
    parse(primary).or_else(|| alternatives.iter().find_map(|alt| parse(alt.as_ref())))
}

/// Whether the text parses as a number.
pub fn is_french_number(text: &str) -> bool {
    parse(text).is_some()
}

/// French spelling of `n`, preferring a hyphenated form. `None` above 100.
pub fn format(n: u32) -> Option<&'static str> {
    let spellings = &table().spellings;
    spellings
        .iter()
        .find(|(word, value)| *value == n && word.contains('-'))
        .or_else(|| spellings.iter().find(|(_, value)| *value == n))
        .map(|(word, _)| word.as_str())
}

/// Every known spelling of `n`, in preference order.
pub fn variants(n: u32) -> Vec<&'static str> {
    table()
        .spellings
        .iter()
        .filter(|(_, value)| *value == n)
        .map(|(word, _)| word.as_str())
        .collect()
}

/// First standalone run of ASCII digits (not glued to letters).
fn first_digit_run(text: &str) -> Option<u64> {
    let chars: Vec<char> = text.chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let bounded_left = start == 0 || !is_word(chars[start - 1]);
            let bounded_right = i == chars.len() || !is_word(chars[i]);
            if bounded_left && bounded_right {
                let run: String = chars[start..i].iter().collect();
                // Runs too long for u64 are certainly above 100
                return Some(run.parse().unwrap_or(u64::MAX));
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Longest known phrase appearing as whole words in `text`.
fn scan_phrases(text: &str) -> Option<u32> {
    let padded = format!(" {} ", text);
    table()
        .by_length
        .iter()
        .find(|(phrase, _)| padded.contains(&format!(" {} ", phrase)))
        .map(|(_, value)| *value)
}
