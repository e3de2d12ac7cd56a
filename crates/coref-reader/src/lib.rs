//! Read coreference documents into sentences and reference sets.
//!
//! Two corpus layouts are supported, both stored as JSON with a `format`
//! tag:
//! - `"naf"`: tokens carrying a sentence number, optional terms, and
//!   coreference sets listing term IDs. See [`naf::NafDocument`].
//! - `"mmax"`: a words layer, an optional sentence layer, and markables
//!   linked by `ref` pointers into chains. See [`mmax::MmaxDocument`].
//!
//! Callers choose between memory-mapped files or owned buffers at runtime
//! via [`LoadMode`]. The result is a [`CorefDocument`] ready for
//! [`conll_coref::CorefConverter::annotate`].
//!
//! # Example
//! ```no_run
//! use coref_reader::{LoadMode, ReaderOptions, read_document};
//!
//! # fn main() -> anyhow::Result<()> {
//! let doc = read_document("corpus/wiki-1.json", LoadMode::Mmap, &ReaderOptions::default())?;
//! println!(
//!     "{} words, {} reference sets",
//!     doc.document.word_count(),
//!     doc.reference_sets.len()
//! );
//! # Ok(()) }
//! ```

pub mod mmax;
pub mod naf;
pub mod util;

use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use anyhow::{Context, Result};
use conll_coref::MarkableFilter;
use conll_types::{Document, ReferenceSet};
use memmap2::Mmap;
use serde::Deserialize;
use tracing::debug;

pub use mmax::MmaxDocument;
pub use naf::NafDocument;
pub use util::{
    add_word_numbers, corea_document_id, corea_part_number, document_id_from_filename,
    split_on_numbering,
};

/// NAF sentence numbers start at 1.
pub const SENTENCE_START_NUMBER: u32 = 1;

/// Strategy for loading input files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy).
    #[default]
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

/// File contents, either mapped or read into memory.
enum Contents {
    Mapped(Mmap),
    Read(Vec<u8>),
}

impl Deref for Contents {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Contents::Mapped(map) => map,
            Contents::Read(bytes) => bytes,
        }
    }
}

impl Contents {
    fn open(path: &Path, mode: LoadMode) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        // Empty files cannot be mapped on every platform.
        if mode == LoadMode::Owned || len == 0 {
            let mut bytes = Vec::with_capacity(len as usize);
            (&file)
                .read_to_end(&mut bytes)
                .with_context(|| format!("read {}", path.display()))?;
            return Ok(Contents::Read(bytes));
        }
        let map = unsafe { Mmap::map(&file) }
            .with_context(|| format!("mmap {}", path.display()))?;
        Ok(Contents::Mapped(map))
    }
}

/// Validation switches shared by both readers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReaderOptions {
    pub validate: bool,
    pub sentence_start_number: u32,
    /// Which MMAX markables take part in coreference chains.
    pub markable_filter: MarkableFilter,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            validate: true,
            sentence_start_number: SENTENCE_START_NUMBER,
            markable_filter: MarkableFilter::default(),
        }
    }
}

/// Input file contents, tagged by corpus layout.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum SourceDocument {
    Naf(NafDocument),
    Mmax(MmaxDocument),
}

/// A document as read from disk, before coreference conversion.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CorefDocument {
    /// Sentences; `document.id` is the ID stored inside the file, if any.
    pub document: Document,
    pub reference_sets: Vec<ReferenceSet>,
}

impl SourceDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Build sentences and reference sets.
    pub fn into_coref_document(self, options: &ReaderOptions) -> Result<CorefDocument> {
        match self {
            SourceDocument::Naf(naf) => {
                let sentences = naf.sentences(options)?;
                let reference_sets = naf.reference_sets()?;
                Ok(CorefDocument {
                    document: Document::new(naf.public_id, sentences),
                    reference_sets,
                })
            }
            SourceDocument::Mmax(mmax) => {
                let index = mmax.word_index()?;
                let sentences = mmax.sentences(&index, options)?;
                let reference_sets =
                    mmax.reference_sets(&index, &options.markable_filter, options.validate)?;
                Ok(CorefDocument {
                    document: Document::new(mmax.document_id(), sentences),
                    reference_sets,
                })
            }
        }
    }
}

/// Read one document, memory-mapping the file.
pub fn load(path: impl AsRef<Path>, options: &ReaderOptions) -> Result<CorefDocument> {
    read_document(path, LoadMode::Mmap, options)
}

/// Read one document, choosing between mmap and an owned buffer at runtime.
pub fn read_document(
    path: impl AsRef<Path>,
    mode: LoadMode,
    options: &ReaderOptions,
) -> Result<CorefDocument> {
    let path = path.as_ref();
    let contents = Contents::open(path, mode)?;
    let source = SourceDocument::from_slice(&contents)
        .with_context(|| format!("parse {}", path.display()))?;
    let doc = source
        .into_coref_document(options)
        .with_context(|| format!("read {}", path.display()))?;
    debug!(
        "read {} sentences and {} reference sets from {}",
        doc.document.sentences.len(),
        doc.reference_sets.len(),
        path.display()
    );
    Ok(doc)
}
