//! English edition: definitions grouped under part-of-speech headers.
//!
//! Only meanings are extracted. A definition is a `# ...` line inside a
//! `===Noun===`-style section; any other level-3+ header ends the region.

use crate::config::ExtractionConfig;
use crate::inline::resolve;
use crate::record::ResolvedText;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref POS_HEADER: Regex = Regex::new(r"^===+\s*(.+?)\s*===+\s*$").unwrap();
    // Single `#`; `##`, `#:` and `#*` are sub-senses, examples and quotations
    static ref DEFINITION_LINE: Regex = Regex::new(r"^#([^#:*].*)$").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"'{2,}").unwrap();
}

const PARTS_OF_SPEECH: &[&str] = &[
    "Noun",
    "Verb",
    "Adjective",
    "Adverb",
    "Pronoun",
    "Preposition",
    "Conjunction",
    "Interjection",
    "Particle",
    "Determiner",
];

/// Definitions shorter than this (in characters) are noise
const MIN_DEFINITION_CHARS: usize = 3;

/// Definitions from every part-of-speech section, prefixed with the part
/// of speech: `(noun) A small domesticated feline.`
pub fn meanings<'a>(lines: impl IntoIterator<Item = &'a str>, config: &ExtractionConfig) -> Vec<ResolvedText> {
    let mut meanings = Vec::new();
    let mut part_of_speech: Option<String> = None;

    for line in lines {
        let line = line.trim();

        if let Some(cap) = POS_HEADER.captures(line) {
            let header = &cap[1];
            part_of_speech = PARTS_OF_SPEECH
                .contains(&header)
                .then(|| header.to_lowercase());
            continue;
        }

        let Some(pos) = part_of_speech.as_deref() else {
            continue;
        };
        let Some(cap) = DEFINITION_LINE.captures(line) else {
            continue;
        };

        let definition = resolve(cap[1].trim(), config)
            .map_text(|text| EMPHASIS.replace_all(text, "").into_owned())
            .trimmed();
        if definition.plain().chars().count() < MIN_DEFINITION_CHARS {
            continue;
        }

        let mut meaning = ResolvedText::from(format!("({}) ", pos).as_str());
        for segment in definition.segments() {
            meaning.push_segment(segment.clone());
        }
        meanings.push(meaning);
    }

    meanings
}
