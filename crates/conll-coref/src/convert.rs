use std::collections::HashMap;

use conll_types::{BracketFragment, Document, FRAGMENT_DELIMITER, ReferenceSet, join_fragments};
use tracing::{debug, warn};

use crate::dedup::uniqueyfy;
use crate::error::Result;
use crate::index::WordIndex;
use crate::span::{ResolvedSpan, SpanMode, SpanResolver};

/// Switches controlling span validation and deduplication.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CorefOptions {
    /// Reject non-consecutive spans (ignored when `fill_spans` is set).
    pub validate: bool,
    /// Drop duplicate mentions and duplicate reference sets.
    pub uniqueyfy: bool,
    /// Fill gaps in non-consecutive spans and mark the filled words.
    pub fill_spans: bool,
}

impl Default for CorefOptions {
    fn default() -> Self {
        Self {
            validate: true,
            uniqueyfy: false,
            fill_spans: false,
        }
    }
}

impl CorefOptions {
    pub fn span_mode(&self) -> SpanMode {
        if self.fill_spans {
            SpanMode::Repair
        } else if self.validate {
            SpanMode::Strict
        } else {
            SpanMode::Lenient
        }
    }
}

/// Per-word output of the conversion, keyed by word ID.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CorefAnnotations {
    /// Bracket fragments in the order their reference sets were numbered.
    pub fragments: HashMap<String, Vec<BracketFragment>>,
    /// Reference IDs whose spans had to be widened over this word.
    pub problems: HashMap<String, Vec<usize>>,
    pub reference_sets: usize,
    pub mentions: usize,
}

/// Counts reported after annotating a document.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CorefSummary {
    pub reference_sets: usize,
    pub mentions: usize,
    pub annotated_words: usize,
    pub filled_words: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CorefConverter {
    options: CorefOptions,
}

impl CorefConverter {
    pub fn new(options: CorefOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CorefOptions {
        self.options
    }

    /// Resolve, deduplicate and number `sets`, returning the fragments per word.
    ///
    /// Reference IDs are the 0-based positions of the non-empty sets that
    /// survive deduplication, in input order.
    pub fn word_annotations(
        &self,
        index: &WordIndex,
        sets: impl IntoIterator<Item = ReferenceSet>,
    ) -> Result<CorefAnnotations> {
        let resolver = SpanResolver::new(index, self.options.span_mode());
        let mut resolved = Vec::new();
        for refset in sets {
            let spans = refset
                .iter()
                .map(|span| resolver.resolve(span))
                .collect::<Result<Vec<_>>>()?;
            resolved.push(spans);
        }

        if self.options.uniqueyfy {
            resolved = uniqueyfy(resolved, |span: &ResolvedSpan| span.ids.clone());
        }

        let mut out = CorefAnnotations::default();
        for (reference, refset) in resolved.iter().filter(|s| !s.is_empty()).enumerate() {
            out.reference_sets += 1;
            for span in refset {
                out.mentions += 1;
                for id in &span.filled {
                    let refs = out.problems.entry(id.clone()).or_default();
                    if refs.last() != Some(&reference) {
                        refs.push(reference);
                    }
                }
                match span.ids.as_slice() {
                    [only] => push_fragment(&mut out, only, BracketFragment::singleton(reference)),
                    [first, .., last] => {
                        push_fragment(&mut out, first, BracketFragment::start(reference));
                        push_fragment(&mut out, last, BracketFragment::end(reference));
                    }
                    [] => {}
                }
            }
        }

        debug!(
            "numbered {} reference sets with {} mentions",
            out.reference_sets, out.mentions
        );
        Ok(out)
    }

    /// Write `coref` (and `problem`) onto the document's words in place.
    pub fn annotate(
        &self,
        doc: &mut Document,
        sets: impl IntoIterator<Item = ReferenceSet>,
    ) -> Result<CorefSummary> {
        let index = WordIndex::from_document(doc)?;
        let annotations = self.word_annotations(&index, sets)?;

        let mut summary = CorefSummary {
            reference_sets: annotations.reference_sets,
            mentions: annotations.mentions,
            ..CorefSummary::default()
        };
        for word in doc.sentences.iter_mut().flatten() {
            if let Some(fragments) = annotations.fragments.get(&word.id) {
                word.coref = Some(join_fragments(fragments));
                summary.annotated_words += 1;
            }
            if let Some(refs) = annotations.problems.get(&word.id) {
                word.problem = Some(
                    refs.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(FRAGMENT_DELIMITER),
                );
                summary.filled_words += 1;
            }
        }

        if summary.annotated_words == 0 {
            warn!("no coreference data found");
        }
        Ok(summary)
    }
}

fn push_fragment(out: &mut CorefAnnotations, id: &str, fragment: BracketFragment) {
    out.fragments
        .entry(id.to_string())
        .or_default()
        .push(fragment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CorefError;
    use conll_types::{RawSpan, Word};

    fn doc(words: &[&str]) -> Document {
        Document::new(
            Some("test".into()),
            vec![
                words
                    .iter()
                    .map(|id| Word::new(*id, id.to_uppercase()))
                    .collect(),
            ],
        )
    }

    fn span(ids: &[&str]) -> RawSpan {
        ids.iter().copied().collect()
    }

    fn corefs(doc: &Document) -> Vec<Option<&str>> {
        doc.words().map(|w| w.coref.as_deref()).collect()
    }

    fn problems(doc: &Document) -> Vec<Option<&str>> {
        doc.words().map(|w| w.problem.as_deref()).collect()
    }

    #[test]
    fn singleton_mentions() {
        let mut d = doc(&["w1", "w2", "w3"]);
        let summary = CorefConverter::default()
            .annotate(&mut d, vec![vec![span(&["w1"]), span(&["w3"])]])
            .unwrap();
        assert_eq!(corefs(&d), vec![Some("(0)"), None, Some("(0)")]);
        assert_eq!(summary.reference_sets, 1);
        assert_eq!(summary.mentions, 2);
        assert_eq!(summary.annotated_words, 2);
    }

    #[test]
    fn repair_marks_filled_words() {
        let mut d = doc(&["w1", "w2", "w3", "w4", "w5"]);
        let converter = CorefConverter::new(CorefOptions {
            fill_spans: true,
            ..CorefOptions::default()
        });
        let summary = converter
            .annotate(&mut d, vec![vec![span(&["w1", "w5"])]])
            .unwrap();
        assert_eq!(corefs(&d), vec![Some("(0"), None, None, None, Some("0)")]);
        assert_eq!(
            problems(&d),
            vec![None, Some("0"), Some("0"), Some("0"), None]
        );
        assert_eq!(summary.filled_words, 3);
    }

    #[test]
    fn strict_mode_fails_on_gap() {
        let mut d = doc(&["w1", "w2", "w3"]);
        let err = CorefConverter::default()
            .annotate(&mut d, vec![vec![span(&["w1", "w3"])]])
            .unwrap_err();
        assert!(matches!(err, CorefError::NonConsecutiveSpan { .. }));
        assert_eq!(corefs(&d), vec![None, None, None]);
    }

    #[test]
    fn lenient_mode_accepts_gap_without_problem() {
        let mut d = doc(&["w1", "w2", "w3"]);
        let converter = CorefConverter::new(CorefOptions {
            validate: false,
            ..CorefOptions::default()
        });
        converter
            .annotate(&mut d, vec![vec![span(&["w1", "w3"])]])
            .unwrap();
        assert_eq!(corefs(&d), vec![Some("(0"), None, Some("0)")]);
        assert_eq!(problems(&d), vec![None, None, None]);
    }

    #[test]
    fn overlapping_sets_join_in_enumeration_order() {
        let mut d = doc(&["w1", "w2", "w3", "w4"]);
        CorefConverter::default()
            .annotate(
                &mut d,
                vec![
                    vec![span(&["w1", "w2", "w3"])],
                    vec![span(&["w1"]), span(&["w3", "w4"])],
                    vec![span(&["w3"])],
                ],
            )
            .unwrap();
        assert_eq!(
            corefs(&d),
            vec![Some("(0|(1)"), None, Some("0)|(1|(2)"), Some("1)")]
        );
    }

    #[test]
    fn uniqueyfy_renumbers_surviving_sets() {
        let mut d = doc(&["w1", "w2", "w3"]);
        let converter = CorefConverter::new(CorefOptions {
            uniqueyfy: true,
            ..CorefOptions::default()
        });
        let summary = converter
            .annotate(
                &mut d,
                vec![
                    vec![span(&["w1"]), span(&["w1"])],
                    vec![span(&["w1"])],
                    vec![],
                    vec![RawSpan::abbreviated("w2", "w3")],
                ],
            )
            .unwrap();
        assert_eq!(corefs(&d), vec![Some("(0)"), Some("(1"), Some("1)")]);
        assert_eq!(summary.reference_sets, 2);
        assert_eq!(summary.mentions, 2);
    }

    #[test]
    fn duplicates_survive_without_uniqueyfy() {
        let mut d = doc(&["w1", "w2"]);
        CorefConverter::default()
            .annotate(&mut d, vec![vec![span(&["w1"])], vec![span(&["w1"])]])
            .unwrap();
        assert_eq!(corefs(&d), vec![Some("(0)|(1)"), None]);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let mut d = doc(&["w1"]);
        let summary = CorefConverter::default()
            .annotate(&mut d, Vec::new())
            .unwrap();
        assert_eq!(summary, CorefSummary::default());
        assert_eq!(corefs(&d), vec![None]);
    }

    #[test]
    fn same_input_gives_same_ids() {
        let sets = vec![
            vec![span(&["w2"]), span(&["w4", "w5"])],
            vec![span(&["w1", "w2"])],
            vec![span(&["w2"]), span(&["w4", "w5"])],
        ];
        let converter = CorefConverter::new(CorefOptions {
            uniqueyfy: true,
            ..CorefOptions::default()
        });
        let mut a = doc(&["w1", "w2", "w3", "w4", "w5"]);
        let mut b = a.clone();
        converter.annotate(&mut a, sets.clone()).unwrap();
        converter.annotate(&mut b, sets).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            corefs(&a),
            vec![Some("(1"), Some("(0)|1)"), None, Some("(0"), Some("0)")]
        );
    }
}
