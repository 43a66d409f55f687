//! Two-way merge and duplicate reconciliation.

use std::collections::BTreeSet;

use crate::record::Record;

/// Merge two key-ordered runs into one.
///
/// Both inputs must be non-decreasing by key. On equal keys the element from
/// `older` is emitted first, so the `newer` element always follows it.
pub fn merge<K: Ord, V>(older: Vec<Record<K, V>>, newer: Vec<Record<K, V>>) -> Vec<Record<K, V>> {
    let mut merged = Vec::with_capacity(older.len() + newer.len());
    let mut older = older.into_iter().peekable();
    let mut newer = newer.into_iter().peekable();

    loop {
        // Compare the current heads of both runs
        let take_older = match (older.peek(), newer.peek()) {
            (Some(o), Some(n)) => o.key <= n.key,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        let next = if take_older { older.next() } else { newer.next() };
        merged.extend(next);
    }

    merged
}

/// Collapse each run of adjacent equal keys to its last element.
///
/// Applied to the output of [`merge`], this keeps only the newest version of
/// every key.
pub fn dedup_keep_newest<K: PartialEq, V>(records: Vec<Record<K, V>>) -> Vec<Record<K, V>> {
    let mut deduped: Vec<Record<K, V>> = Vec::with_capacity(records.len());

    for record in records {
        match deduped.last_mut() {
            Some(last) if last.key == record.key => *last = record,
            _ => deduped.push(record),
        }
    }

    deduped
}

/// Concatenate `older ++ newer`, keeping only the last occurrence of each key.
///
/// Used when the segment is not kept sorted: surviving records stay in
/// append order.
pub fn append_keep_newest<K: Ord, V>(
    older: Vec<Record<K, V>>,
    newer: Vec<Record<K, V>>,
) -> Vec<Record<K, V>> {
    let mut all = older;
    all.extend(newer);

    // Walk back to front: the first sighting of a key is its newest version
    let keep = {
        let mut seen = BTreeSet::new();
        let mut keep: Vec<bool> = all.iter().rev().map(|r| seen.insert(&r.key)).collect();
        keep.reverse();
        keep
    };

    all.into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}
