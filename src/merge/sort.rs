//! Recursive merge sort over records.

use crate::record::Record;

use super::combine::merge;

/// Sort records by key (non-decreasing, stable).
///
/// Splits at the midpoint, sorts each half, then merges them with the left
/// half treated as the older run so equal keys keep their input order.
pub fn merge_sort<K: Ord, V>(mut records: Vec<Record<K, V>>) -> Vec<Record<K, V>> {
    if records.len() < 2 {
        return records;
    }

    let right = records.split_off(records.len() / 2);
    merge(merge_sort(records), merge_sort(right))
}

/// True if keys are non-decreasing.
pub fn is_sorted_by_key<K: Ord, V>(records: &[Record<K, V>]) -> bool {
    records.windows(2).all(|pair| pair[0].key <= pair[1].key)
}
