//! Corpus scanning for the knowledge-base quality gate.
//!
//! One scan pass owns everything it produces: documents are parsed fresh,
//! aggregated into a [`scanner::Corpus`], and indexed by relative path in a
//! [`index::CrossRefIndex`]. Nothing here mutates the corpus on disk.

pub mod document;
pub mod header;
pub mod index;
pub mod links;
pub mod scanner;

pub use document::{parse_document, Depth, Document, Header, Section};
pub use header::{extract_header, HeaderBlock};
pub use index::{normalize_join, CrossRefIndex};
pub use links::{extract_links, LinkKind, LinkRef};
pub use scanner::{scan_corpus, Corpus, ScanError, DEFAULT_EXCLUDED_DIRS};
