//! Extraction tables: every fixed vocabulary the extractors rely on.
//!
//! The defaults describe the Polish edition. A YAML file with the same shape
//! (see `schema/pl.yaml`) can replace any subset of the tables; fields left
//! out keep their defaults.

use crate::error::ConfigError;
use crate::segmenter::SectionKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Source key → canonical label, as written in the schema file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMapping {
    pub source: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InflectionConfig {
    /// Prefix that opens an inflection template, e.g. `{{odmiana-`
    pub opener: String,
    /// Token that closes the template
    pub closer: String,
    pub keys: Vec<KeyMapping>,
}

impl Default for InflectionConfig {
    fn default() -> Self {
        let keys = [
            ("Mianownik lp", "Mianownik (lp)"),
            ("Dopełniacz lp", "Dopełniacz (lp)"),
            ("Celownik lp", "Celownik (lp)"),
            ("Biernik lp", "Biernik (lp)"),
            ("Narzędnik lp", "Narzędnik (lp)"),
            ("Miejscownik lp", "Miejscownik (lp)"),
            ("Wołacz lp", "Wołacz (lp)"),
            ("Mianownik lm", "Mianownik (lm)"),
            ("Dopełniacz lm", "Dopełniacz (lm)"),
            ("Celownik lm", "Celownik (lm)"),
            ("Biernik lm", "Biernik (lm)"),
            ("Narzędnik lm", "Narzędnik (lm)"),
            ("Miejscownik lm", "Miejscownik (lm)"),
            ("Wołacz lm", "Wołacz (lm)"),
            ("Forma ndepr", "Forma niedeprecjonalna"),
        ]
        .into_iter()
        .map(|(source, label)| KeyMapping {
            source: source.to_string(),
            label: label.to_string(),
        })
        .collect();

        InflectionConfig {
            opener: "{{odmiana-".to_string(),
            closer: "}}".to_string(),
            keys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleConfig {
    /// Bullet/numbering prefix an example line must start with
    pub prefix: String,
    /// Italic delimiter surrounding the example sentence
    pub italic: String,
}

impl Default for ExampleConfig {
    fn default() -> Self {
        ExampleConfig {
            prefix: ": (".to_string(),
            italic: "''".to_string(),
        }
    }
}

/// Tables as read from YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSchema {
    pub section_markers: BTreeMap<SectionKind, String>,
    pub transparent_templates: Vec<String>,
    /// Phonetic transcription templates, highest priority first
    pub pronunciation_templates: Vec<String>,
    pub inflection: InflectionConfig,
    pub examples: ExampleConfig,
    pub etymology_marker: String,
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        let section_markers = [
            (SectionKind::Pronunciation, "{{wymowa}}"),
            (SectionKind::Meanings, "{{znaczenia}}"),
            (SectionKind::Inflection, "{{odmiana}}"),
            (SectionKind::Examples, "{{przykłady}}"),
            (SectionKind::Etymology, "{{etymologia}}"),
        ]
        .into_iter()
        .map(|(kind, token)| (kind, token.to_string()))
        .collect();

        let transparent_templates = [
            "dokonany od",
            "niedokonany od",
            "forma",
            "odmiana",
            "synonim",
            "antonim",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        ExtractionSchema {
            section_markers,
            transparent_templates,
            pronunciation_templates: vec!["IPA3".to_string(), "IPA".to_string()],
            inflection: InflectionConfig::default(),
            examples: ExampleConfig::default(),
            etymology_marker: ":".to_string(),
        }
    }
}

/// Lookup-ready form of [`ExtractionSchema`], shared by all extractors
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    schema: ExtractionSchema,
    transparent: HashSet<String>,
    inflection_keys: HashMap<String, String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::from_schema(ExtractionSchema::default())
    }
}

impl ExtractionConfig {
    pub fn from_schema(schema: ExtractionSchema) -> Self {
        let transparent = schema.transparent_templates.iter().cloned().collect();
        let inflection_keys = schema
            .inflection
            .keys
            .iter()
            .map(|mapping| (mapping.source.clone(), mapping.label.clone()))
            .collect();

        ExtractionConfig {
            schema,
            transparent,
            inflection_keys,
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let schema: ExtractionSchema = serde_yaml::from_str(contents)?;
        Ok(Self::from_schema(schema))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// Section kind whose marker token starts `line`, if any
    pub fn marker_kind(&self, line: &str) -> Option<SectionKind> {
        self.schema
            .section_markers
            .iter()
            .find(|(_, token)| line.starts_with(token.as_str()))
            .map(|(kind, _)| *kind)
    }

    pub fn is_transparent(&self, template_name: &str) -> bool {
        self.transparent.contains(template_name)
    }

    pub fn canonical_inflection_key(&self, key: &str) -> Option<&str> {
        self.inflection_keys.get(key).map(String::as_str)
    }

    pub fn pronunciation_templates(&self) -> &[String] {
        &self.schema.pronunciation_templates
    }

    pub fn inflection(&self) -> &InflectionConfig {
        &self.schema.inflection
    }

    pub fn examples(&self) -> &ExampleConfig {
        &self.schema.examples
    }

    pub fn etymology_marker(&self) -> &str {
        &self.schema.etymology_marker
    }
}
