use anyhow::{Context, Result, bail};
use conll_coref::{MarkableFilter, WordIndex, chains_from_markables, expand_span_text};
use conll_types::{Markable, ReferenceSet, Sentence, Word};
use serde::Deserialize;
use tracing::warn;

use crate::ReaderOptions;
use crate::util::{add_word_numbers, corea_document_id, corea_part_number, sentence_position};

/// An MMAX document: a words layer, an optional sentence layer and a
/// markables layer whose `ref` pointers form coreference chains.
///
/// Without a sentence layer, sentences start at every word whose
/// `word_number` is 0, as in the COREA corpus.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MmaxDocument {
    pub words: Vec<MmaxWord>,
    #[serde(default)]
    pub sentences: Option<Vec<MmaxSentence>>,
    #[serde(default)]
    pub markables: Vec<MmaxMarkable>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MmaxWord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub word_number: Option<usize>,
    #[serde(default)]
    pub part: Option<u32>,
    #[serde(default)]
    pub pos: Option<String>,
    /// COREA sentence source, e.g. `WR-P-P-H-0000000001.p.1.s.1.xml`.
    #[serde(default)]
    pub alpsent: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MmaxSentence {
    pub id: String,
    /// Span text such as `word_1..word_5`.
    pub span: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MmaxMarkable {
    pub id: String,
    pub span: String,
    #[serde(default, rename = "ref")]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default, rename = "type")]
    pub markable_type: Option<String>,
}

impl MmaxDocument {
    /// Document ID recorded on the first COREA word, if any.
    pub fn document_id(&self) -> Option<String> {
        self.words
            .first()?
            .alpsent
            .as_deref()
            .and_then(corea_document_id)
    }

    pub fn word_index(&self) -> Result<WordIndex> {
        Ok(WordIndex::new(self.words.iter().map(|w| w.id.clone()))?)
    }

    fn word(&self, w: &MmaxWord) -> Word {
        Word {
            word_number: w.word_number,
            part_number: w.part.or_else(|| w.alpsent.as_deref().and_then(corea_part_number)),
            pos: w.pos.clone(),
            ..Word::new(&w.id, &w.text)
        }
    }

    pub fn sentences(&self, index: &WordIndex, options: &ReaderOptions) -> Result<Vec<Sentence>> {
        let mut sentences = match &self.sentences {
            Some(layer) => self.sentences_from_layer(index, layer, options.validate)?,
            None => self.sentences_from_word_numbers(options.validate)?,
        };
        add_word_numbers(&mut sentences);
        Ok(sentences)
    }

    fn sentences_from_layer(
        &self,
        index: &WordIndex,
        layer: &[MmaxSentence],
        validate: bool,
    ) -> Result<Vec<Sentence>> {
        let mut items = Vec::with_capacity(layer.len());
        for item in layer {
            let position = sentence_position(&item.id)
                .with_context(|| format!("sentence ID {:?} does not end in a number", item.id))?;
            let span = expand_span_text(index, &item.span)
                .with_context(|| format!("span of sentence {:?}", item.id))?;
            items.push((position, &item.id, span));
        }
        items.sort_by_key(|(position, _, _)| *position);

        if validate {
            validate_tiling(index, &items)?;
        }

        Ok(items
            .into_iter()
            .map(|(_, _, span)| {
                span.iter()
                    .filter_map(|id| index.get(id))
                    .map(|i| self.word(&self.words[i]))
                    .collect()
            })
            .collect())
    }

    fn sentences_from_word_numbers(&self, validate: bool) -> Result<Vec<Sentence>> {
        let mut sentences: Vec<Sentence> = Vec::new();
        for w in &self.words {
            let starts_sentence = w.word_number == Some(0);
            match sentences.last_mut() {
                Some(sentence) if !starts_sentence => sentence.push(self.word(w)),
                None if !starts_sentence && validate => bail!(
                    "the first word ({:?}) does not have word number 0, found: {:?}",
                    w.text,
                    w.word_number
                ),
                _ => sentences.push(vec![self.word(w)]),
            }
        }
        if validate {
            validate_word_numbers(&sentences)?;
            validate_part_numbers(&sentences)?;
        }
        Ok(sentences)
    }

    /// Markables with their span text expanded to word IDs.
    pub fn markables(&self, index: &WordIndex) -> Result<Vec<Markable>> {
        self.markables
            .iter()
            .map(|m| {
                Ok(Markable {
                    id: m.id.clone(),
                    span: expand_span_text(index, &m.span)
                        .with_context(|| format!("span of markable {:?}", m.id))?,
                    ref_id: m.ref_id.clone(),
                    level: m.level.clone(),
                    markable_type: m.markable_type.clone(),
                })
            })
            .collect()
    }

    pub fn reference_sets(
        &self,
        index: &WordIndex,
        filter: &MarkableFilter,
        validate: bool,
    ) -> Result<Vec<ReferenceSet>> {
        let markables = self.markables(index)?;
        Ok(chains_from_markables(&markables, filter, validate)?)
    }
}

/// Sentences must run back to back from the first word, each over a
/// consecutive stretch of words.
fn validate_tiling(index: &WordIndex, items: &[(u32, &String, Vec<String>)]) -> Result<()> {
    let mut next = 0;
    for (_, id, span) in items {
        let (Some(first), Some(last)) = (span.first(), span.last()) else {
            continue;
        };
        let start = index.position(first)?;
        let end = index.position(last)?;
        if start > end {
            bail!("sentence {id:?} ends before it starts: {span:?}");
        }
        let correct = index.slice(start, end);
        if span.as_slice() != correct {
            bail!("the span of sentence {id:?} should be {correct:?}, found {span:?}");
        }
        if start != next {
            let expected = index.ids().get(next).map_or("<end>", String::as_str);
            bail!("sentence {id:?} starts at {first:?}, but the next word is {expected:?}");
        }
        next = end + 1;
    }
    Ok(())
}

fn validate_word_numbers(sentences: &[Sentence]) -> Result<()> {
    for (n, sentence) in sentences.iter().enumerate() {
        for (expected, word) in sentence.iter().enumerate() {
            if word.word_number != Some(expected) {
                bail!(
                    "word {:?} in sentence #{n} should have word number {expected}, found: {:?}",
                    word.text,
                    word.word_number
                );
            }
        }
    }
    Ok(())
}

/// Part numbers are either absent everywhere or present on every word, the
/// same within a sentence and never decreasing.
fn validate_part_numbers(sentences: &[Sentence]) -> Result<()> {
    let words = sentences.iter().flatten();
    let numbered = words.clone().filter(|w| w.part_number.is_some()).count();
    if numbered == 0 {
        return Ok(());
    }
    if numbered != words.count() {
        bail!("some words are missing a part number");
    }

    let mut prev = 0;
    for (n, sentence) in sentences.iter().enumerate() {
        let Some(first) = sentence.first() else {
            warn!("sentence #{n} is empty");
            continue;
        };
        let part = first.part_number.unwrap_or_default();
        if let Some(other) = sentence.iter().find(|w| w.part_number != Some(part)) {
            bail!(
                "word {:?} in sentence #{n} has part number {:?}, expected {part}",
                other.text,
                other.part_number
            );
        }
        if part < prev {
            bail!("the part number of sentence #{n} should be at least {prev}, found: {part}");
        }
        prev = part;
    }
    Ok(())
}
