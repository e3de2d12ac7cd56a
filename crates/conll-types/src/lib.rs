//! Shared types for converting coreference annotations into CoNLL.
//!
//! Words carry every field the CoNLL writer may emit as explicit, optional
//! struct fields; spans and reference sets stay as plain word-ID lists so the
//! readers, the coreference core and the writer can share them without
//! conversions.
//!
//! Use [`Word`] and [`Sentence`] for token data, [`RawSpan`] and
//! [`ReferenceSet`] for coreference chains as read from a corpus, and
//! [`BracketFragment`] for the `(0`, `0)`, `(0)` markers of the coreference
//! column.
//!
//! ```rust
//! use conll_types::{BracketFragment, Column, FragmentKind};
//!
//! let frag: BracketFragment = "(3".parse().unwrap();
//! assert_eq!(frag.kind, FragmentKind::Start);
//! assert_eq!(frag.to_string(), "(3");
//! assert_eq!(Column::Coref.default_value(), "-");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between several fragments (or problem references) on one word.
pub const FRAGMENT_DELIMITER: &str = "|";

/// A single token of a document, with every CoNLL column as a named field.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub text: String,
    /// 0-based position in the whole document, assigned when the document is built.
    #[serde(default)]
    pub sequence_position: usize,
    /// 0-based position within the sentence.
    #[serde(default)]
    pub word_number: Option<usize>,
    #[serde(default)]
    pub part_number: Option<u32>,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub parse_bit: Option<String>,
    #[serde(default)]
    pub pred_lemma: Option<String>,
    #[serde(default)]
    pub pred_frameset_id: Option<String>,
    #[serde(default)]
    pub word_sense: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub named_entities: Option<String>,
    #[serde(default)]
    pub coref: Option<String>,
    #[serde(default)]
    pub problem: Option<String>,
}

impl Word {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// True when coreference repair filled this word into a span.
    pub fn has_problem(&self) -> bool {
        self.problem.is_some()
    }
}

/// Words of one sentence in document order.
pub type Sentence = Vec<Word>;

/// A document's sentences, with `sequence_position` numbered across all of them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Document {
    pub id: Option<String>,
    pub sentences: Vec<Sentence>,
}

impl Document {
    /// Build a document, renumbering `sequence_position` from 0 in reading order.
    pub fn new(id: Option<String>, mut sentences: Vec<Sentence>) -> Self {
        for (position, word) in sentences.iter_mut().flatten().enumerate() {
            word.sequence_position = position;
        }
        Self { id, sentences }
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> + '_ {
        self.sentences.iter().flatten()
    }

    pub fn word_count(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }
}

/// A mention as supplied by a reader.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSpan {
    /// Every word ID of the mention, possibly with gaps.
    Ids(Vec<String>),
    /// Only the first and last word ID; the words in between are implied.
    Abbreviated { first: String, last: String },
}

impl RawSpan {
    pub fn abbreviated(first: impl Into<String>, last: impl Into<String>) -> Self {
        RawSpan::Abbreviated {
            first: first.into(),
            last: last.into(),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            RawSpan::Ids(ids) => ids.first().map(String::as_str),
            RawSpan::Abbreviated { first, .. } => Some(first),
        }
    }

    pub fn last(&self) -> Option<&str> {
        match self {
            RawSpan::Ids(ids) => ids.last().map(String::as_str),
            RawSpan::Abbreviated { last, .. } => Some(last),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for RawSpan {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        RawSpan::Ids(iter.into_iter().map(Into::into).collect())
    }
}

/// Mentions believed to refer to the same entity (a coreference chain).
pub type ReferenceSet = Vec<RawSpan>;

/// A coreference markable as found in MMAX markable levels.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Markable {
    pub id: String,
    /// Expanded word IDs covered by the markable.
    pub span: Vec<String>,
    /// ID of the markable this one refers back to.
    #[serde(default, rename = "ref")]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default, rename = "type")]
    pub markable_type: Option<String>,
}

/// Where a fragment sits within its span.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FragmentKind {
    Singleton,
    Start,
    End,
}

/// One `(n)`, `(n` or `n)` marker of the CoNLL coreference column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BracketFragment {
    pub reference: usize,
    pub kind: FragmentKind,
}

impl BracketFragment {
    pub fn singleton(reference: usize) -> Self {
        Self {
            reference,
            kind: FragmentKind::Singleton,
        }
    }

    pub fn start(reference: usize) -> Self {
        Self {
            reference,
            kind: FragmentKind::Start,
        }
    }

    pub fn end(reference: usize) -> Self {
        Self {
            reference,
            kind: FragmentKind::End,
        }
    }
}

impl fmt::Display for BracketFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FragmentKind::Singleton => write!(f, "({})", self.reference),
            FragmentKind::Start => write!(f, "({}", self.reference),
            FragmentKind::End => write!(f, "{})", self.reference),
        }
    }
}

/// Returned when text is not a bracket fragment.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("not a coreference bracket fragment: {0:?}")]
pub struct ParseFragmentError(pub String);

impl FromStr for BracketFragment {
    type Err = ParseFragmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFragmentError(s.to_string());
        let (opens, rest) = match s.strip_prefix('(') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (closes, digits) = match rest.strip_suffix(')') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let reference = digits.parse().map_err(|_| err())?;
        let kind = match (opens, closes) {
            (true, true) => FragmentKind::Singleton,
            (true, false) => FragmentKind::Start,
            (false, true) => FragmentKind::End,
            (false, false) => return Err(err()),
        };
        Ok(Self { reference, kind })
    }
}

/// Split a coreference cell (`(0|1)`) into its fragments.
pub fn parse_fragments(cell: &str) -> Result<Vec<BracketFragment>, ParseFragmentError> {
    cell.split(FRAGMENT_DELIMITER).map(str::parse).collect()
}

/// Join fragments into the text of a coreference cell.
pub fn join_fragments(fragments: &[BracketFragment]) -> String {
    fragments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(FRAGMENT_DELIMITER)
}

/// A CoNLL column that can be emitted after the document ID.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "part_number")]
    PartNumber,
    #[serde(rename = "word_number")]
    WordNumber,
    #[serde(rename = "word")]
    Word,
    #[serde(rename = "problem")]
    Problem,
    #[serde(rename = "POS")]
    Pos,
    #[serde(rename = "parse_bit")]
    ParseBit,
    #[serde(rename = "pred_lemma")]
    PredLemma,
    #[serde(rename = "pred_frameset_ID")]
    PredFramesetId,
    #[serde(rename = "word_sense")]
    WordSense,
    #[serde(rename = "speaker")]
    Speaker,
    #[serde(rename = "named_entities")]
    NamedEntities,
    #[serde(rename = "coref")]
    Coref,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::PartNumber,
        Column::WordNumber,
        Column::Word,
        Column::Problem,
        Column::Pos,
        Column::ParseBit,
        Column::PredLemma,
        Column::PredFramesetId,
        Column::WordSense,
        Column::Speaker,
        Column::NamedEntities,
        Column::Coref,
    ];

    /// Name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Column::PartNumber => "part_number",
            Column::WordNumber => "word_number",
            Column::Word => "word",
            Column::Problem => "problem",
            Column::Pos => "POS",
            Column::ParseBit => "parse_bit",
            Column::PredLemma => "pred_lemma",
            Column::PredFramesetId => "pred_frameset_ID",
            Column::WordSense => "word_sense",
            Column::Speaker => "speaker",
            Column::NamedEntities => "named_entities",
            Column::Coref => "coref",
        }
    }

    /// Value written when a word lacks this column and no default is configured.
    pub fn default_value(self) -> &'static str {
        match self {
            Column::PartNumber => "0",
            Column::WordNumber => "[WORD_NUMBER]",
            Column::Word => "[WORD]",
            Column::Problem => "",
            Column::Pos => "[POS]",
            Column::ParseBit => "*",
            Column::PredLemma => "-",
            Column::PredFramesetId => "-",
            Column::WordSense => "-",
            Column::Speaker => "UNKNOWN",
            Column::NamedEntities => "*",
            Column::Coref => "-",
        }
    }

    /// Policy used when nothing is configured for this column.
    pub fn default_on_missing(self) -> OnMissing {
        match self {
            Column::WordNumber | Column::Word => OnMissing::Throw,
            _ => OnMissing::Nothing,
        }
    }

    /// The textual value of this column for `word`, if present.
    pub fn value(self, word: &Word) -> Option<String> {
        match self {
            Column::PartNumber => word.part_number.map(|n| n.to_string()),
            Column::WordNumber => word.word_number.map(|n| n.to_string()),
            Column::Word => Some(word.text.clone()),
            Column::Problem => word.problem.clone(),
            Column::Pos => word.pos.clone(),
            Column::ParseBit => word.parse_bit.clone(),
            Column::PredLemma => word.pred_lemma.clone(),
            Column::PredFramesetId => word.pred_frameset_id.clone(),
            Column::WordSense => word.word_sense.clone(),
            Column::Speaker => word.speaker.clone(),
            Column::NamedEntities => word.named_entities.clone(),
            Column::Coref => word.coref.clone(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when text names no CoNLL column.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown CoNLL column {0:?}")]
pub struct UnknownColumn(pub String);

impl FromStr for Column {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

/// What to do when a word has no value for a column.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMissing {
    /// Substitute the default silently.
    #[default]
    Nothing,
    /// Substitute the default and log a warning.
    Warn,
    /// Fail the conversion.
    Throw,
}

/// Post-conversion selection of sentences to write.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceFilter {
    #[default]
    None,
    /// Only sentences where at least one word was filled into a span.
    HasProblem,
    /// Only sentences without any filled word.
    NoProblem,
}

impl SentenceFilter {
    pub fn keeps(self, sentence: &[Word]) -> bool {
        match self {
            SentenceFilter::None => true,
            SentenceFilter::HasProblem => sentence.iter().any(Word::has_problem),
            SentenceFilter::NoProblem => !sentence.iter().any(Word::has_problem),
        }
    }
}
