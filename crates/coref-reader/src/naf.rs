use std::collections::HashMap;

use anyhow::{Result, bail};
use conll_types::{RawSpan, ReferenceSet, Sentence, Word};
use serde::Deserialize;

use crate::ReaderOptions;
use crate::util::{add_word_numbers, split_on_numbering};

/// A NAF document: tokens with sentence numbers, optional terms grouping
/// tokens, and coreference sets whose spans list term IDs.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NafDocument {
    #[serde(default)]
    pub public_id: Option<String>,
    pub tokens: Vec<NafToken>,
    #[serde(default)]
    pub terms: Vec<NafTerm>,
    /// Reference sets, each a list of spans, each a list of term IDs (or
    /// token IDs when the document has no terms).
    #[serde(default)]
    pub corefs: Vec<Vec<Vec<String>>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NafToken {
    pub id: String,
    pub text: String,
    pub sentence: u32,
    #[serde(default)]
    pub part: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NafTerm {
    pub id: String,
    pub span: Vec<String>,
    #[serde(default)]
    pub pos: Option<String>,
}

impl NafDocument {
    /// Split the tokens into numbered sentences.
    pub fn sentences(&self, options: &ReaderOptions) -> Result<Vec<Sentence>> {
        let pos_by_token: HashMap<&str, &str> = self
            .terms
            .iter()
            .filter_map(|t| Some((t, t.pos.as_deref()?)))
            .flat_map(|(t, pos)| t.span.iter().map(move |id| (id.as_str(), pos)))
            .collect();

        let mut sentences = split_on_numbering(
            self.tokens.iter(),
            |t| t.sentence,
            options.validate,
            options.sentence_start_number,
        )?
        .into_iter()
        .map(|tokens| {
            tokens
                .into_iter()
                .map(|t| Word {
                    part_number: t.part,
                    pos: pos_by_token.get(t.id.as_str()).map(|p| p.to_string()),
                    ..Word::new(&t.id, &t.text)
                })
                .collect::<Sentence>()
        })
        .collect::<Vec<_>>();
        add_word_numbers(&mut sentences);
        Ok(sentences)
    }

    /// Coreference sets with every term ID replaced by the token IDs it covers.
    pub fn reference_sets(&self) -> Result<Vec<ReferenceSet>> {
        if self.terms.is_empty() {
            return Ok(self
                .corefs
                .iter()
                .map(|set| set.iter().map(|span| RawSpan::Ids(span.clone())).collect())
                .collect());
        }

        let terms: HashMap<&str, &[String]> = self
            .terms
            .iter()
            .map(|t| (t.id.as_str(), t.span.as_slice()))
            .collect();
        let mut sets = Vec::with_capacity(self.corefs.len());
        for set in &self.corefs {
            let mut spans = Vec::with_capacity(set.len());
            for term_ids in set {
                let mut ids = Vec::new();
                for term_id in term_ids {
                    let Some(tokens) = terms.get(term_id.as_str()) else {
                        bail!("coreference span refers to unknown term {term_id:?}");
                    };
                    ids.extend(tokens.iter().cloned());
                }
                spans.push(RawSpan::Ids(ids));
            }
            sets.push(spans);
        }
        Ok(sets)
    }
}
