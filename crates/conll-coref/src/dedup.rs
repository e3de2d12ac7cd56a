use std::collections::BTreeSet;
use std::fmt::Debug;

use tracing::{Level, debug, enabled};

/// Remove duplicate spans within each reference set and duplicate sets overall.
///
/// Two sets are duplicates when their spans, compared by `key` and ignoring
/// order and repetition, are the same; the first one seen survives whole.
/// Empty sets are dropped. Order of sets and of spans within a set is kept.
pub fn uniqueyfy<S, K, F>(sets: impl IntoIterator<Item = Vec<S>>, key: F) -> Vec<Vec<S>>
where
    F: Fn(&S) -> K,
    K: Ord + Debug,
{
    let mut seen_sets: BTreeSet<BTreeSet<K>> = BTreeSet::new();
    let mut unique_sets = Vec::new();

    for refset in sets {
        let keys: BTreeSet<K> = refset.iter().map(&key).collect();
        if seen_sets.contains(&keys) {
            debug!("discarding reference set: {:?}", keys);
            continue;
        }
        seen_sets.insert(keys);

        let mut seen_spans = BTreeSet::new();
        let mut kept = Vec::with_capacity(refset.len());
        for span in refset {
            let k = key(&span);
            if seen_spans.contains(&k) {
                debug!("discarding reference: {:?}", k);
            } else {
                seen_spans.insert(k);
                kept.push(span);
            }
        }

        if kept.is_empty() {
            debug!("discarding empty reference set");
        } else {
            unique_sets.push(kept);
        }
    }

    if enabled!(Level::DEBUG) {
        debug!(
            "kept {} reference sets with {} references",
            unique_sets.len(),
            unique_sets.iter().map(Vec::len).sum::<usize>()
        );
    }
    unique_sets
}
