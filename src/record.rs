//! Lexical record types produced by page parsing.
//!
//! A [`LexicalRecord`] is built once per successful lookup and never mutated
//! afterwards; the cache hands out `Arc<LexicalRecord>` clones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Language edition of the source dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edition {
    #[serde(rename = "pl")]
    Polish,
    #[serde(rename = "en")]
    English,
}

impl Edition {
    /// Short edition tag, as used in wiki hostnames (`pl`, `en`)
    pub fn tag(self) -> &'static str {
        match self {
            Edition::Polish => "pl",
            Edition::English => "en",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pl" | "polish" => Ok(Edition::Polish),
            "en" | "english" => Ok(Edition::English),
            other => Err(format!("unknown edition: {}", other)),
        }
    }
}

/// Structured cross-reference: `[[target|display]]`
///
/// Carries the lookup key so a caller can issue a fresh `get_record` for
/// `target_key` when the label is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceLabel {
    pub target_key: String,
    pub display_text: String,
}

impl CrossReferenceLabel {
    pub fn new(target_key: impl Into<String>, display_text: impl Into<String>) -> Self {
        CrossReferenceLabel {
            target_key: target_key.into(),
            display_text: display_text.into(),
        }
    }
}

/// One piece of resolved inline text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    CrossReference(CrossReferenceLabel),
}

/// Output of the inline markup resolver: plain text interleaved with
/// cross-reference labels, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedText {
    segments: Vec<Segment>,
}

impl ResolvedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Append plain text, merging with a trailing text segment.
    /// Empty strings are ignored.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    pub fn push_cross_reference(&mut self, label: CrossReferenceLabel) {
        self.segments.push(Segment::CrossReference(label));
    }

    pub fn push_segment(&mut self, segment: Segment) {
        match segment {
            Segment::Text(text) => self.push_text(&text),
            Segment::CrossReference(label) => self.push_cross_reference(label),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All cross-reference labels, in order of appearance
    pub fn cross_references(&self) -> impl Iterator<Item = &CrossReferenceLabel> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::CrossReference(label) => Some(label),
            Segment::Text(_) => None,
        })
    }

    /// Plain display text; cross references render as their display text
    pub fn plain(&self) -> String {
        self.to_string()
    }

    /// Apply `f` to every text segment, dropping segments that become empty
    pub(crate) fn map_text(self, f: impl Fn(&str) -> String) -> Self {
        let mut out = ResolvedText::new();
        for segment in self.segments {
            match segment {
                Segment::Text(text) => out.push_text(&f(&text)),
                label => out.push_segment(label),
            }
        }
        out
    }

    /// Trim leading whitespace of the first segment and trailing whitespace
    /// of the last one, when those are text.
    pub(crate) fn trimmed(mut self) -> Self {
        if let Some(Segment::Text(first)) = self.segments.first_mut() {
            *first = first.trim_start().to_string();
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            *last = last.trim_end().to_string();
        }
        self.segments
            .retain(|segment| !matches!(segment, Segment::Text(text) if text.is_empty()));
        self
    }
}

impl fmt::Display for ResolvedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::CrossReference(label) => f.write_str(&label.display_text)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for ResolvedText {
    fn from(text: &str) -> Self {
        let mut resolved = ResolvedText::new();
        resolved.push_text(text);
        resolved
    }
}

/// Canonical grammatical-case label → surface form.
/// Keys only ever come from the configured canonicalization table.
pub type InflectionTable = BTreeMap<String, String>;

/// Example sentence; `translation` is filled by a cross-edition lookup
/// outside this crate and starts out empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub source_text: ResolvedText,
    pub translation: String,
}

/// Record fields that can fall back to an empty default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Pronunciation,
    Meanings,
    Inflection,
    Examples,
    Etymology,
}

/// Markup was present but some expected sections or templates were not.
/// Not an error: the listed fields hold their empty defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDegraded {
    pub missing: Vec<Field>,
}

/// Normalized dictionary entry for one word in one edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalRecord {
    pub edition: Edition,
    pub word: String,
    pub pronunciation: String,
    pub meanings: Vec<ResolvedText>,
    pub inflection: InflectionTable,
    pub examples: Vec<Example>,
    pub etymology: ResolvedText,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Field>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw_source: String,
}

impl LexicalRecord {
    /// Empty record for `word`; every field at its default
    pub fn empty(edition: Edition, word: impl Into<String>) -> Self {
        LexicalRecord {
            edition,
            word: word.into(),
            pronunciation: String::new(),
            meanings: Vec::new(),
            inflection: InflectionTable::new(),
            examples: Vec::new(),
            etymology: ResolvedText::new(),
            degraded: Vec::new(),
            raw_source: String::new(),
        }
    }

    /// `Some` when any field fell back to its empty default
    pub fn degraded(&self) -> Option<ParseDegraded> {
        if self.degraded.is_empty() {
            None
        } else {
            Some(ParseDegraded {
                missing: self.degraded.clone(),
            })
        }
    }

    /// Every cross reference in meanings, examples and etymology
    pub fn cross_references(&self) -> Vec<&CrossReferenceLabel> {
        self.meanings
            .iter()
            .chain(self.examples.iter().map(|example| &example.source_text))
            .chain(std::iter::once(&self.etymology))
            .flat_map(|text| text.cross_references())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edition_parses_tags_and_names() {
        assert_eq!("pl".parse::<Edition>(), Ok(Edition::Polish));
        assert_eq!(" English ".parse::<Edition>(), Ok(Edition::English));
        assert!("de".parse::<Edition>().is_err());
        assert_eq!(Edition::Polish.to_string(), "pl");
    }

    #[test]
    fn push_text_merges_adjacent_text() {
        let mut text = ResolvedText::new();
        text.push_text("a ");
        text.push_text("");
        text.push_text("b");
        assert_eq!(text.segments(), &[Segment::Text("a b".to_string())]);
    }

    #[test]
    fn display_uses_cross_reference_display_text() {
        let mut text = ResolvedText::from("mały ");
        text.push_cross_reference(CrossReferenceLabel::new("kot", "kotek"));
        text.push_text("!");
        assert_eq!(text.plain(), "mały kotek!");
        let targets: Vec<_> = text.cross_references().map(|l| l.target_key.as_str()).collect();
        assert_eq!(targets, vec!["kot"]);
    }

    #[test]
    fn trimmed_strips_outer_whitespace_only() {
        let mut text = ResolvedText::from("  a ");
        text.push_cross_reference(CrossReferenceLabel::new("b", "b"));
        text.push_text("  ");
        let text = text.trimmed();
        assert_eq!(text.plain(), "a b");
        assert_eq!(text.segments().len(), 2);
    }

    #[test]
    fn degraded_is_none_for_complete_record() {
        let record = LexicalRecord::empty(Edition::Polish, "kot");
        assert!(record.degraded().is_none());
    }

    #[test]
    fn record_serializes_resolved_text_as_segment_list() {
        let mut record = LexicalRecord::empty(Edition::Polish, "kot");
        record.etymology = ResolvedText::from("prasł.");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["edition"], "pl");
        assert_eq!(json["etymology"][0]["text"], "prasł.");
        assert!(json.get("raw_source").is_none());
    }
}
