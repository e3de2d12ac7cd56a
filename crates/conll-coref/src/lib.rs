//! Coreference chains to CoNLL bracket notation.
//!
//! Takes reference sets whose spans may be abbreviated (`first..last`) or
//! gapped, reconstructs the consecutive word run each span stands for, drops
//! duplicate mentions and chains, and writes `(n`, `n)` and `(n)` fragments
//! onto the words of a [`Document`](conll_types::Document).
//!
//! # How it works
//! 1. [`WordIndex`] maps every word ID to its position in the document.
//! 2. [`SpanResolver`] turns each [`RawSpan`](conll_types::RawSpan) into the
//!    canonical run between its endpoints, rejecting or repairing gaps.
//! 3. [`uniqueyfy`] removes duplicate spans and duplicate reference sets.
//! 4. [`CorefConverter`] numbers the surviving sets and annotates the words.
//!
//! # Example
//! ```rust
//! use conll_coref::{CorefConverter, CorefOptions};
//! use conll_types::{Document, RawSpan, Word};
//!
//! # fn main() -> Result<(), conll_coref::CorefError> {
//! let mut doc = Document::new(
//!     Some("doc".into()),
//!     vec![vec![Word::new("w1", "John"), Word::new("w2", "said"), Word::new("w3", "he")]],
//! );
//! let sets = vec![vec![RawSpan::from_iter(["w1"]), RawSpan::from_iter(["w3"])]];
//!
//! CorefConverter::new(CorefOptions::default()).annotate(&mut doc, sets)?;
//! assert_eq!(doc.sentences[0][0].coref.as_deref(), Some("(0)"));
//! assert_eq!(doc.sentences[0][1].coref, None);
//! # Ok(()) }
//! ```

pub mod chains;
pub mod convert;
pub mod dedup;
pub mod error;
pub mod index;
pub mod span;

pub use chains::{MarkableFilter, chains_from_markables};
pub use convert::{CorefAnnotations, CorefConverter, CorefOptions, CorefSummary};
pub use dedup::uniqueyfy;
pub use error::{CorefError, Result};
pub use index::WordIndex;
pub use span::{ResolvedSpan, SpanMode, SpanResolver, expand_span_text, find_missing};
