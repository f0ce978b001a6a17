//! Section segmenter: splits page lines into regions bounded by section
//! marker templates such as `{{znaczenia}}`.

use crate::config::ExtractionConfig;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

lazy_static! {
    // Wiki headings (`== kot ({{język polski}}) ==`) end whatever section is open
    static ref HEADING: Regex = Regex::new(r"^==+.*==+$").unwrap();
}

/// Recognized section types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Pronunciation,
    Meanings,
    Inflection,
    Examples,
    Etymology,
}

/// Lines belonging to one section, trimmed, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub lines: Vec<String>,
}

/// Sections of one page, in the order they were closed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    sections: Vec<Section>,
}

impl Sections {
    pub fn get(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn lines(&self, kind: SectionKind) -> Option<&[String]> {
        self.get(kind).map(|section| section.lines.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn close(&mut self, open: Option<Section>) {
        let Some(section) = open else { return };
        if self.get(section.kind).is_some() {
            // First occurrence wins; later ones usually belong to another language
            debug!(kind = ?section.kind, lines = section.lines.len(), "discarding repeated section");
            return;
        }
        self.sections.push(section);
    }
}

/// A line that looks like a section boundary without being a known marker
fn is_marker_shaped(line: &str) -> bool {
    line.starts_with("{{") || HEADING.is_match(line)
}

/// Split `lines` into recognized sections.
///
/// Lines outside any recognized section are dropped, as is the content of
/// unknown sections. Never fails.
pub fn segment<'a>(lines: impl IntoIterator<Item = &'a str>, config: &ExtractionConfig) -> Sections {
    let mut sections = Sections::default();
    let mut open: Option<Section> = None;

    for raw in lines {
        let line = raw.trim();

        if let Some(kind) = config.marker_kind(line) {
            sections.close(open.take());
            open = Some(Section {
                kind,
                lines: Vec::new(),
            });
        } else if is_marker_shaped(line) {
            if let Some(section) = open.take() {
                debug!(kind = ?section.kind, marker = line, "section closed by unknown marker");
                sections.close(Some(section));
            }
        } else if let Some(section) = open.as_mut() {
            section.lines.push(line.to_string());
        }
    }
    sections.close(open);

    sections
}
