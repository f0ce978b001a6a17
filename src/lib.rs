//! Lexical record extraction from Wiktionary-style wikitext.
//!
//! Raw page markup flows through the [`segmenter`], the per-field
//! [`extract`]ors and the [`inline`] markup resolver into a
//! [`LexicalRecord`]. [`Dictionary`] wraps that pipeline with a
//! [`Retriever`] and a single-flight [`RecordCache`].
//!
//! ```no_run
//! use wikilex::{Dictionary, DirectoryRetriever, Edition};
//!
//! # async fn run() -> Result<(), wikilex::LookupError> {
//! let dict = Dictionary::new(DirectoryRetriever::new("pages"));
//! let record = dict.get_record(Edition::Polish, "kot").await?;
//! for (n, meaning) in record.meanings.iter().enumerate() {
//!     println!("{}. {}", n + 1, meaning);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod english;
pub mod error;
pub mod extract;
pub mod inline;
pub mod page;
pub mod record;
pub mod retrieval;
pub mod segmenter;

pub use cache::{normalize_word, CacheKey, RecordCache};
pub use config::{ExtractionConfig, ExtractionSchema};
pub use dictionary::Dictionary;
pub use error::{ConfigError, LookupError, LookupResult, RetrievalError};
pub use inline::resolve;
pub use page::parse_page;
pub use record::{
    CrossReferenceLabel, Edition, Example, Field, InflectionTable, LexicalRecord, ParseDegraded, ResolvedText,
    Segment,
};
pub use retrieval::{DirectoryRetriever, MemoryRetriever, Retriever};
pub use segmenter::{segment, Section, SectionKind, Sections};
