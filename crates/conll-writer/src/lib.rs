//! CoNLL-2012 style output for annotated sentences.
//!
//! Every part of a document is wrapped in
//! `#begin document (<id>); part <NNN>` and `#end document`. Each word is one
//! line starting with the document ID, followed by the configured columns,
//! right-aligned per sentence and separated by at least
//! [`WriterConfig::min_column_spacing`] spaces. A blank line ends a sentence.
//!
//! Part numbers are read from the first word of every sentence and may only
//! grow; skipped numbers still get an (empty) begin/end block.
//!
//! ```rust
//! use conll_types::Word;
//! use conll_writer::{CoNLLWriter, WriterConfig};
//!
//! let mut word = Word::new("w1", "Hello");
//! word.word_number = Some(0);
//! word.coref = Some("(0)".into());
//!
//! let mut lines: Vec<String> = Vec::new();
//! CoNLLWriter::new(WriterConfig::default())
//!     .write(&mut lines, "doc", &[vec![word]])
//!     .unwrap();
//! assert_eq!(
//!     lines,
//!     [
//!         "#begin document (doc); part 000",
//!         "doc   0   Hello      (0)",
//!         "",
//!         "#end document",
//!     ]
//! );
//! ```

use std::collections::HashMap;
use std::io;

use conll_types::{Column, OnMissing, Word};
use thiserror::Error;
use tracing::{debug, warn};

pub const MIN_COLUMN_SPACING: usize = 3;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("column {column} is missing from word {word_id}")]
    MissingField { column: Column, word_id: String },
    #[error("part number decreased from {previous} to {found} at word {word_id}")]
    PartNumberRegression {
        previous: u32,
        found: u32,
        word_id: String,
    },
    #[error("part number default {0:?} is not a number")]
    InvalidPartNumber(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, WriteError>;

/// Which columns to write and how to treat words lacking a value.
///
/// Columns absent from `defaults` or `on_missing` use
/// [`Column::default_value`] and [`Column::default_on_missing`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriterConfig {
    pub columns: Vec<Column>,
    pub defaults: HashMap<Column, String>,
    pub on_missing: HashMap<Column, OnMissing>,
    pub min_column_spacing: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                Column::WordNumber,
                Column::Word,
                Column::Problem,
                Column::Coref,
            ],
            defaults: HashMap::new(),
            on_missing: HashMap::new(),
            min_column_spacing: MIN_COLUMN_SPACING,
        }
    }
}

impl WriterConfig {
    pub fn default_for(&self, column: Column) -> &str {
        self.defaults
            .get(&column)
            .map_or(column.default_value(), String::as_str)
    }

    pub fn on_missing_for(&self, column: Column) -> OnMissing {
        self.on_missing
            .get(&column)
            .copied()
            .unwrap_or_else(|| column.default_on_missing())
    }
}

/// Destination for finished output lines, without trailing newlines.
pub trait LineSink {
    fn write_line(&mut self, line: &str) -> Result<()>;
}

impl LineSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes each line followed by `\n` to any [`io::Write`].
#[derive(Debug)]
pub struct IoSink<W: io::Write>(pub W);

impl<W: io::Write> IoSink<W> {
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: io::Write> LineSink for IoSink<W> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.0, "{line}")?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct CoNLLWriter {
    config: WriterConfig,
}

impl CoNLLWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write all `sentences` of one document.
    ///
    /// Output always opens with part 000. Empty sentences are skipped.
    pub fn write(
        &self,
        sink: &mut impl LineSink,
        document_id: &str,
        sentences: &[Vec<Word>],
    ) -> Result<()> {
        let mut part = 0;
        write_part_start(sink, document_id, part)?;

        for sentence in sentences {
            let Some(first) = sentence.first() else {
                debug!("skipping empty sentence in {document_id}");
                continue;
            };
            let current = match first.part_number {
                Some(number) => number,
                None => self.default_part_number()?,
            };
            if current < part {
                return Err(WriteError::PartNumberRegression {
                    previous: part,
                    found: current,
                    word_id: first.id.clone(),
                });
            }
            while part < current {
                sink.write_line("#end document")?;
                part += 1;
                write_part_start(sink, document_id, part)?;
            }
            self.write_sentence(sink, document_id, sentence)?;
        }

        sink.write_line("#end document")
    }

    fn default_part_number(&self) -> Result<u32> {
        let raw = self.config.default_for(Column::PartNumber);
        raw.trim()
            .parse()
            .map_err(|_| WriteError::InvalidPartNumber(raw.to_string()))
    }

    fn write_sentence(
        &self,
        sink: &mut impl LineSink,
        document_id: &str,
        sentence: &[Word],
    ) -> Result<()> {
        let rows = self.sentence_cells(sentence)?;
        let widths: Vec<usize> = (0..self.config.columns.len())
            .map(|col| {
                rows.iter()
                    .map(|row| row[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let spacing = " ".repeat(self.config.min_column_spacing);
        for row in &rows {
            let mut line = String::from(document_id);
            for (value, &width) in row.iter().zip(&widths) {
                line.push_str(&spacing);
                line.push_str(&format!("{value:>width$}"));
            }
            sink.write_line(&line)?;
        }
        sink.write_line("")
    }

    /// Textual cell values per word, after applying the missing-value policies.
    fn sentence_cells(&self, sentence: &[Word]) -> Result<Vec<Vec<String>>> {
        sentence
            .iter()
            .map(|word| {
                self.config
                    .columns
                    .iter()
                    .map(|&column| self.cell(column, word))
                    .collect()
            })
            .collect()
    }

    fn cell(&self, column: Column, word: &Word) -> Result<String> {
        if let Some(value) = column.value(word) {
            return Ok(value);
        }
        match self.config.on_missing_for(column) {
            OnMissing::Nothing => {}
            OnMissing::Warn => warn!("column {column} is missing from word {}", word.id),
            OnMissing::Throw => {
                return Err(WriteError::MissingField {
                    column,
                    word_id: word.id.clone(),
                });
            }
        }
        Ok(self.config.default_for(column).to_string())
    }
}

fn write_part_start(sink: &mut impl LineSink, document_id: &str, part: u32) -> Result<()> {
    sink.write_line(&format!("#begin document ({document_id}); part {part:03}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: &str, number: usize, part: Option<u32>) -> Word {
        Word {
            word_number: Some(number),
            part_number: part,
            ..Word::new(id, id.to_uppercase())
        }
    }

    #[test]
    fn config_falls_back_to_column_defaults() {
        let mut config = WriterConfig::default();
        config.defaults.insert(Column::Coref, "_".into());
        config.on_missing.insert(Column::Word, OnMissing::Warn);
        assert_eq!(config.default_for(Column::Coref), "_");
        assert_eq!(config.default_for(Column::Pos), "[POS]");
        assert_eq!(config.on_missing_for(Column::Word), OnMissing::Warn);
        assert_eq!(config.on_missing_for(Column::WordNumber), OnMissing::Throw);
        assert_eq!(config.on_missing_for(Column::Coref), OnMissing::Nothing);
    }

    #[test]
    fn invalid_part_default_is_rejected() {
        let mut config = WriterConfig::default();
        config.defaults.insert(Column::PartNumber, "first".into());
        let err = CoNLLWriter::new(config)
            .write(&mut Vec::new(), "d", &[vec![word("a", 0, None)]])
            .unwrap_err();
        assert!(matches!(err, WriteError::InvalidPartNumber(p) if p == "first"));
    }

    #[test]
    fn empty_sentences_are_skipped() {
        let mut lines = Vec::new();
        CoNLLWriter::default()
            .write(&mut lines, "d", &[Vec::new(), vec![word("a", 0, None)]])
            .unwrap();
        assert_eq!(
            lines,
            [
                "#begin document (d); part 000",
                "d   0   A      -",
                "",
                "#end document",
            ]
        );
    }

    #[test]
    fn io_sink_appends_newlines() {
        let mut sink = IoSink(Vec::new());
        sink.write_line("a").unwrap();
        sink.write_line("").unwrap();
        assert_eq!(sink.into_inner(), b"a\n\n");
    }
}
