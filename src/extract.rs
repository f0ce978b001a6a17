//! Field extractors for the Polish edition.
//!
//! Each extractor takes the trimmed lines of one section and returns the
//! field value, falling back to the empty default when the expected template
//! or line shape is missing.

use crate::config::ExtractionConfig;
use crate::inline::resolve;
use crate::record::{Example, InflectionTable, ResolvedText};
use tracing::debug;

const NESTED_OPENER: &str = "{{";

/// Bracketed transcription from the first phonetic template, e.g.
/// `{{IPA3|kɔt}}` → `[kɔt]`
pub fn pronunciation(lines: &[String], config: &ExtractionConfig) -> String {
    for line in lines {
        for name in config.pronunciation_templates() {
            let open = format!("{{{{{}|", name);
            let Some(start) = line.find(&open).map(|i| i + open.len()) else {
                continue;
            };
            match line[start..].find("}}") {
                Some(len) if len > 0 => return format!("[{}]", &line[start..start + len]),
                _ => continue,
            }
        }
    }
    String::new()
}

/// One sense per line, in order. Lines that resolve to nothing are kept as
/// empty entries so sense numbering lines up with the source.
pub fn meanings(lines: &[String], config: &ExtractionConfig) -> Vec<ResolvedText> {
    lines
        .iter()
        .map(|line| resolve(line, config).trimmed())
        .collect()
}

/// Declension/conjugation forms from `{{odmiana-...}}` templates.
///
/// Only keys in the configured canonicalization table are kept. Later
/// templates overwrite earlier values for the same canonical key. Values
/// that still carry template markup are skipped.
pub fn inflection(lines: &[String], config: &ExtractionConfig) -> InflectionTable {
    let tokens = config.inflection();
    let mut table = InflectionTable::new();
    // Template text collected so far, and how many `{{` are still open
    let mut buffer: Option<(String, usize)> = None;

    for line in lines {
        match buffer.as_mut() {
            None => {
                let Some(start) = line.find(&tokens.opener) else {
                    continue;
                };
                let body = &line[start..];
                let after_opener = tokens.opener.len();
                let mut depth = 1;
                match closing_index(&body[after_opener..], &mut depth, &tokens.closer) {
                    Some(end) => parse_inflection_fields(&body[..after_opener + end], config, &mut table),
                    None => buffer = Some((body.to_string(), depth)),
                }
            }
            Some((buf, depth)) => {
                buf.push(' ');
                match closing_index(line, depth, &tokens.closer) {
                    Some(end) => {
                        buf.push_str(&line[..end]);
                        parse_inflection_fields(buf, config, &mut table);
                        buffer = None;
                    }
                    None => buf.push_str(line),
                }
            }
        }
    }

    if let Some((buf, _)) = buffer {
        debug!("inflection template not closed before end of section");
        parse_inflection_fields(&buf, config, &mut table);
    }

    table
}

/// Byte offset of the closer that brings `depth` to zero. Nested `{{`
/// raise the depth, so a closer belonging to an inner template is skipped.
fn closing_index(text: &str, depth: &mut usize, closer: &str) -> Option<usize> {
    let mut rest = text;
    while !rest.is_empty() {
        let at = text.len() - rest.len();
        if rest.starts_with(closer) {
            *depth -= 1;
            if *depth == 0 {
                return Some(at);
            }
            rest = &rest[closer.len()..];
        } else if rest.starts_with(NESTED_OPENER) {
            *depth += 1;
            rest = &rest[NESTED_OPENER.len()..];
        } else {
            let width = rest.chars().next().map_or(1, char::len_utf8);
            rest = &rest[width..];
        }
    }
    None
}

fn parse_inflection_fields(buffer: &str, config: &ExtractionConfig, table: &mut InflectionTable) {
    let closer = config.inflection().closer.as_str();
    for field in buffer.split('|') {
        let Some((key, value)) = field.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || value.contains(NESTED_OPENER) || value.contains(closer) {
            continue;
        }
        if let Some(label) = config.canonical_inflection_key(key.trim()) {
            table.insert(label.to_string(), value.to_string());
        }
    }
}

/// Example sentences: numbered lines with an italic span, e.g.
/// `: (1.1) ''[[kot|Kot]] śpi.'' → The cat sleeps.`
pub fn examples(lines: &[String], config: &ExtractionConfig) -> Vec<Example> {
    let shape = config.examples();
    let italic = shape.italic.as_str();

    lines
        .iter()
        .filter(|line| line.starts_with(&shape.prefix))
        .filter_map(|line| {
            let first = line.find(italic)?;
            let last = line.rfind(italic)?;
            if last < first + italic.len() {
                return None;
            }
            let source_text = resolve(&line[first + italic.len()..last], config).trimmed();
            Some(Example {
                source_text,
                translation: String::new(),
            })
        })
        .collect()
}

/// First indented line of the etymology section
pub fn etymology(lines: &[String], config: &ExtractionConfig) -> ResolvedText {
    let marker = config.etymology_marker();
    lines
        .iter()
        .find_map(|line| line.strip_prefix(marker))
        .map(|rest| resolve(rest.trim(), config).trimmed())
        .unwrap_or_default()
}
