//! Record type shared by every tier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Record<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<(K, V)> for Record<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Record<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key:{} Val:{}", self.key, self.value)
    }
}
