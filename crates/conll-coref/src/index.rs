use std::collections::HashMap;
use std::collections::hash_map::Entry;

use conll_types::Document;

use crate::error::{CorefError, Result};

/// Word IDs of one document in reading order, with an ID to position lookup.
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl WordIndex {
    /// Index IDs in the order given. Fails on repeated IDs.
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for id in ids {
            let id = id.into();
            match index.positions.entry(id.clone()) {
                Entry::Occupied(_) => return Err(CorefError::DuplicateWordId(id)),
                Entry::Vacant(slot) => {
                    slot.insert(index.ids.len());
                }
            }
            index.ids.push(id);
        }
        Ok(index)
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        Self::new(doc.words().map(|w| w.id.as_str()))
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn position(&self, id: &str) -> Result<usize> {
        self.get(id)
            .ok_or_else(|| CorefError::UnknownWordId(id.to_string()))
    }

    /// IDs from `first` to `last` inclusive. Panics when out of range, like slicing.
    pub fn slice(&self, first: usize, last: usize) -> &[String] {
        &self.ids[first..=last]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conll_types::Word;

    #[test]
    fn positions_follow_document_order() {
        let doc = Document::new(
            None,
            vec![
                vec![Word::new("w1", "a"), Word::new("w2", "b")],
                vec![Word::new("w3", "c")],
            ],
        );
        let index = WordIndex::from_document(&doc).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.position("w3"), Ok(2));
        assert_eq!(index.slice(0, 1), &["w1".to_string(), "w2".to_string()]);
        assert_eq!(
            index.position("w9"),
            Err(CorefError::UnknownWordId("w9".into()))
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = WordIndex::new(["a", "b", "a"]).unwrap_err();
        assert_eq!(err, CorefError::DuplicateWordId("a".into()));
    }
}
