//! Keyed index construction.
//!
//! Maps an identity key to the position it was found at. When two
//! positions share a key the later one wins.

use std::collections::HashMap;
use std::hash::Hash;

/// Index every item of `items` by `key`.
pub fn index<T, K, F>(items: &[T], mut key: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut idx = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        idx.insert(key(item), i);
    }
    idx
}

/// Index only the items for which `key` returns a value.
pub fn index_some<T, K, F>(items: &[T], mut key: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: FnMut(&T) -> Option<K>,
{
    let mut idx = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if let Some(k) = key(item) {
            idx.insert(k, i);
        }
    }
    idx
}
