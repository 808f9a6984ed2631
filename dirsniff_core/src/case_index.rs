use std::collections::HashMap;

/// Map keyed by relative path where keys differing only in letter case are
/// the same entry.
///
/// The spelling of the first insert is kept for the lifetime of the entry.
/// Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveIndex<V> {
    folded: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for CaseInsensitiveIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CaseInsensitiveIndex<V> {
    pub fn new() -> Self {
        Self {
            folded: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Insert or replace the value for `key`. Returns the previous value if
    /// the logical key was already present; its original spelling is kept.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let folded = fold(&key);
        match self.folded.get(&folded) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, value)),
            None => {
                self.folded.insert(folded, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.folded.contains_key(&fold(key))
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.slot(key).map(|slot| &self.entries[slot].1)
    }

    /// The spelling under which `key` was first inserted
    pub fn get_original_case(&self, key: &str) -> Option<&str> {
        self.slot(key).map(|slot| self.entries[slot].0.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    fn slot(&self, key: &str) -> Option<usize> {
        self.folded.get(&fold(key)).copied()
    }
}

impl<V> IntoIterator for CaseInsensitiveIndex<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}
