use ahash::AHashSet;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A commit and the distinct files it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub files: Vec<String>,
}

/// Distinct file paths in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: Vec<String>,
    seen: AHashSet<String>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless already present. Returns `true` if it was new.
    pub fn insert(&mut self, path: &str) -> bool {
        if self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.to_string());
        self.files.push(path.to_string());
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.files
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }
}

impl PartialEq for FileRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.files == other.files
    }
}

impl Eq for FileRegistry {}

impl Serialize for FileRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.files.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FileRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let files = Vec::<String>::deserialize(deserializer)?;
        let mut registry = FileRegistry::new();
        for file in &files {
            if !registry.insert(file) {
                return Err(D::Error::custom(format!(
                    "duplicate file in registry: {file}"
                )));
            }
        }
        Ok(registry)
    }
}

/// Symmetric co-occurrence counts between distinct files.
///
/// Each unordered pair is stored once, under its lexicographically smaller
/// path and then the larger one; lookups and iteration present both
/// orderings. Lookups borrow, so keys are only allocated for new pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationTable {
    pairs: BTreeMap<String, BTreeMap<String, u64>>,
    pair_count: usize,
}

fn canonical<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `by` to the count of `{a, b}`, creating the entry if needed.
    /// Returns `true` if the entry was created. Self-pairs are ignored.
    pub fn record(&mut self, a: &str, b: &str, by: u64) -> bool {
        if a == b {
            return false;
        }
        let (lo, hi) = canonical(a, b);
        if !self.pairs.contains_key(lo) {
            self.pairs.insert(lo.to_string(), BTreeMap::new());
        }
        let Some(row) = self.pairs.get_mut(lo) else {
            return false;
        };
        match row.get_mut(hi) {
            Some(count) => {
                *count += by;
                false
            }
            None => {
                row.insert(hi.to_string(), by);
                self.pair_count += 1;
                true
            }
        }
    }

    /// Count for `(a, b)`; identical to the count for `(b, a)`.
    pub fn count(&self, a: &str, b: &str) -> Option<u64> {
        if a == b {
            return None;
        }
        let (lo, hi) = canonical(a, b);
        self.pairs.get(lo)?.get(hi).copied()
    }

    /// Number of unordered pairs.
    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// Number of ordered entries, i.e. both orderings of every pair.
    pub fn len(&self) -> usize {
        self.pair_count * 2
    }

    pub fn is_empty(&self) -> bool {
        self.pair_count == 0
    }

    /// Unordered pairs as `(lo, hi, count)` with `lo < hi`.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.pairs.iter().flat_map(|(a, row)| {
            row.iter()
                .map(move |(b, count)| (a.as_str(), b.as_str(), *count))
        })
    }

    /// Every ordered entry, both `(a, b)` and `(b, a)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.pairs().flat_map(|(a, b, count)| [(a, b, count), (b, a, count)])
    }
}

impl Serialize for CorrelationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (a, b, count) in self.iter() {
            map.serialize_entry(&(a, b), &count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CorrelationTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<(String, String), u64>::deserialize(deserializer)?;
        let mut table = CorrelationTable::new();
        for ((a, b), count) in &entries {
            if a == b {
                return Err(D::Error::custom(format!("self-pair in table: {a}")));
            }
            match entries.get(&(b.clone(), a.clone())) {
                Some(mirror) if mirror == count => {}
                _ => {
                    return Err(D::Error::custom(format!(
                        "asymmetric entry in table: ({a}, {b})"
                    )));
                }
            }
            if a < b {
                table.record(a, b, *count);
            }
        }
        Ok(table)
    }
}
