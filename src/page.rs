//! Raw page markup → [`LexicalRecord`].

use crate::config::ExtractionConfig;
use crate::english;
use crate::extract;
use crate::record::{Edition, Field, LexicalRecord};
use crate::segmenter::{segment, SectionKind};
use tracing::debug;

/// Parse one page. Never fails: fields whose section or template is
/// missing stay empty and are listed in `LexicalRecord::degraded`.
pub fn parse_page(edition: Edition, word: &str, raw: &str, config: &ExtractionConfig) -> LexicalRecord {
    let mut record = match edition {
        Edition::Polish => parse_polish(word, raw, config),
        Edition::English => parse_english(word, raw, config),
    };
    record.raw_source = raw.to_string();

    if !record.degraded.is_empty() {
        debug!(%edition, word, missing = ?record.degraded, "parse degraded");
    }
    record
}

fn parse_polish(word: &str, raw: &str, config: &ExtractionConfig) -> LexicalRecord {
    let sections = segment(raw.lines(), config);
    let lines = |kind: SectionKind| sections.lines(kind).unwrap_or_default();

    let mut record = LexicalRecord::empty(Edition::Polish, word);
    record.pronunciation = extract::pronunciation(lines(SectionKind::Pronunciation), config);
    record.meanings = extract::meanings(lines(SectionKind::Meanings), config);
    record.inflection = extract::inflection(lines(SectionKind::Inflection), config);
    record.examples = extract::examples(lines(SectionKind::Examples), config);
    record.etymology = extract::etymology(lines(SectionKind::Etymology), config);

    record.degraded = [
        (Field::Pronunciation, record.pronunciation.is_empty()),
        (Field::Meanings, record.meanings.is_empty()),
        (Field::Inflection, record.inflection.is_empty()),
        (Field::Examples, record.examples.is_empty()),
        (Field::Etymology, record.etymology.is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, empty)| empty.then_some(field))
    .collect();

    record
}

fn parse_english(word: &str, raw: &str, config: &ExtractionConfig) -> LexicalRecord {
    let mut record = LexicalRecord::empty(Edition::English, word);
    record.meanings = english::meanings(raw.lines(), config);
    if record.meanings.is_empty() {
        record.degraded.push(Field::Meanings);
    }
    record
}
