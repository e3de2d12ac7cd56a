use std::collections::{HashMap, HashSet};

use conll_types::{Markable, RawSpan, ReferenceSet};
use tracing::warn;

use crate::error::{CorefError, Result};

/// Selects which markables take part in coreference chains.
///
/// An empty list accepts every value, including a missing one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MarkableFilter {
    pub levels: Vec<String>,
    pub types: Vec<String>,
}

impl MarkableFilter {
    pub fn keeps(&self, markable: &Markable) -> bool {
        accepts(&self.levels, markable.level.as_deref())
            && accepts(&self.types, markable.markable_type.as_deref())
    }
}

fn accepts(allowed: &[String], value: Option<&str>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.iter().any(|a| a == v))
}

/// Group markables into reference sets by following their `ref` pointers.
///
/// A markable without `ref`, or whose `ref` points at a filtered-out
/// markable, starts a chain; every markable referring to a chain member
/// joins that chain. With `validate`, pointers to unknown markables and
/// markables that no chain reaches (reference cycles) are errors.
pub fn chains_from_markables(
    markables: &[Markable],
    filter: &MarkableFilter,
    validate: bool,
) -> Result<Vec<ReferenceSet>> {
    let all_ids: HashSet<&str> = markables.iter().map(|m| m.id.as_str()).collect();
    let kept: Vec<&Markable> = markables.iter().filter(|m| filter.keeps(m)).collect();
    let by_id: HashMap<&str, &Markable> = kept.iter().map(|m| (m.id.as_str(), *m)).collect();

    let mut referring: HashMap<&str, Vec<&str>> = HashMap::new();
    for markable in &kept {
        let Some(reference) = markable.ref_id.as_deref() else {
            continue;
        };
        if validate && !all_ids.contains(reference) {
            return Err(CorefError::UnknownMarkableReference {
                markable: markable.id.clone(),
                reference: reference.to_string(),
            });
        }
        referring
            .entry(reference)
            .or_default()
            .push(markable.id.as_str());
    }

    let mut chains = Vec::new();
    let mut reached: HashSet<&str> = HashSet::new();
    for root in &kept {
        let is_root = root
            .ref_id
            .as_deref()
            .is_none_or(|r| !by_id.contains_key(r));
        if !is_root {
            continue;
        }

        let mut chain = Vec::new();
        let mut stack = vec![root.id.as_str()];
        while let Some(id) = stack.pop() {
            if !reached.insert(id) {
                continue;
            }
            chain.push(RawSpan::Ids(by_id[id].span.clone()));
            if let Some(children) = referring.get(id) {
                stack.extend(children.iter().copied());
            }
        }
        chains.push(chain);
    }

    let expected = by_id.len();
    if reached.len() != expected {
        let mut missing: Vec<String> = by_id
            .keys()
            .filter(|id| !reached.contains(*id))
            .map(|id| id.to_string())
            .collect();
        missing.sort();
        if validate {
            return Err(CorefError::UnreachableMarkables {
                expected,
                found: reached.len(),
                missing,
            });
        }
        warn!("markables not reachable from any chain root: {:?}", missing);
    }

    Ok(chains)
}
