use std::collections::HashSet;

use conll_types::RawSpan;

use crate::error::{CorefError, Result};
use crate::index::WordIndex;

/// How a span that is not a consecutive run of words is treated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SpanMode {
    /// Reject it with [`CorefError::NonConsecutiveSpan`].
    #[default]
    Strict,
    /// Fill the gaps and report which words were added.
    Repair,
    /// Use the run between its endpoints without checking the rest.
    Lenient,
}

/// A span expanded to every word between its endpoints.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResolvedSpan {
    pub ids: Vec<String>,
    /// Words that were not in the given span but had to be added to close gaps.
    pub filled: Vec<String>,
}

/// Reconstructs canonical spans against a [`WordIndex`].
#[derive(Clone, Copy, Debug)]
pub struct SpanResolver<'a> {
    index: &'a WordIndex,
    mode: SpanMode,
}

impl<'a> SpanResolver<'a> {
    pub fn new(index: &'a WordIndex, mode: SpanMode) -> Self {
        Self { index, mode }
    }

    pub fn mode(&self) -> SpanMode {
        self.mode
    }

    /// The consecutive run of IDs from the span's first word to its last word.
    pub fn get_correct_span(&self, span: &RawSpan) -> Result<Vec<String>> {
        let (Some(first), Some(last)) = (span.first(), span.last()) else {
            return Err(CorefError::EmptySpan);
        };
        let start = self.index.position(first)?;
        let end = self.index.position(last)?;
        if start > end {
            return Err(CorefError::InvalidSpanOrder {
                span: span_ids(span),
            });
        }
        Ok(self.index.slice(start, end).to_vec())
    }

    /// Validate a span against its canonical run according to the resolver's mode.
    ///
    /// Abbreviated spans carry no middle IDs and are expanded without comparison.
    pub fn resolve(&self, span: &RawSpan) -> Result<ResolvedSpan> {
        let correct = self.get_correct_span(span)?;
        let given = match span {
            RawSpan::Ids(ids) if *ids != correct => ids,
            _ => {
                return Ok(ResolvedSpan {
                    ids: correct,
                    filled: Vec::new(),
                });
            }
        };

        match self.mode {
            SpanMode::Strict => Err(CorefError::NonConsecutiveSpan {
                span: given.clone(),
                correct,
            }),
            SpanMode::Repair => {
                let filled = find_missing(given, &correct)?;
                Ok(ResolvedSpan {
                    ids: correct,
                    filled,
                })
            }
            SpanMode::Lenient => Ok(ResolvedSpan {
                ids: correct,
                filled: Vec::new(),
            }),
        }
    }
}

/// IDs of `correct` that are absent from `span`, in document order.
///
/// Fails when `span` holds an ID that `correct` does not, since no amount of
/// gap filling turns it into `correct`.
pub fn find_missing(span: &[String], correct: &[String]) -> Result<Vec<String>> {
    let correct_set: HashSet<&str> = correct.iter().map(String::as_str).collect();
    if !span.iter().all(|id| correct_set.contains(id.as_str())) {
        return Err(CorefError::IllegalCorrection {
            span: span.to_vec(),
            correct: correct.to_vec(),
        });
    }
    let span_set: HashSet<&str> = span.iter().map(String::as_str).collect();
    Ok(correct
        .iter()
        .filter(|id| !span_set.contains(id.as_str()))
        .cloned()
        .collect())
}

/// Expand an MMAX span attribute such as `word_1..word_5,word_7`.
///
/// Ranges are replaced by every ID between their endpoints; single IDs are
/// kept as written.
pub fn expand_span_text(index: &WordIndex, text: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut bounds = part.split("..");
        match (bounds.next(), bounds.next(), bounds.next()) {
            (Some(single), None, _) => ids.push(single.to_string()),
            (Some(first), Some(last), None) => {
                let start = index.position(first)?;
                let end = index.position(last)?;
                if start > end {
                    return Err(CorefError::InvalidSpanOrder {
                        span: vec![first.to_string(), last.to_string()],
                    });
                }
                ids.extend_from_slice(index.slice(start, end));
            }
            _ => return Err(CorefError::MalformedSpanText(text.to_string())),
        }
    }
    Ok(ids)
}

fn span_ids(span: &RawSpan) -> Vec<String> {
    match span {
        RawSpan::Ids(ids) => ids.clone(),
        RawSpan::Abbreviated { first, last } => vec![first.clone(), last.clone()],
    }
}
