// ============================================================
// Layer 3 — Vocabulary
// ============================================================
// Bidirectional token <-> id mapping, split into namespaces:
//
//   "tokens" — padded: id 0 = @@PADDING@@, id 1 = @@UNKNOWN@@
//   "labels" — not padded: ids start at 0, no OOV entry
//
// A namespace is non-padded when it matches one of the
// non-padded patterns. "*labels" matches any namespace that
// ends in "labels"; a pattern without '*' must match exactly.
//
// On disk a vocabulary is a directory:
//
//   vocabulary/
//     non_padded_namespaces.txt   ← one pattern per line
//     tokens.txt                  ← ids 1.. (padding is implicit)
//     labels.txt                  ← ids 0..
//
// Reference: Rust Book §8 (HashMap), §9 (Error Handling)

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::instance::Instance;
use crate::domain::traits::TokenIndexer;

pub const DEFAULT_PADDING_TOKEN: &str = "@@PADDING@@";
pub const DEFAULT_OOV_TOKEN:     &str = "@@UNKNOWN@@";
pub const TOKENS_NAMESPACE:      &str = "tokens";
pub const LABELS_NAMESPACE:      &str = "labels";

pub const PADDING_INDEX: u32 = 0;
pub const OOV_INDEX:     u32 = 1;

const NON_PADDED_FILENAME: &str = "non_padded_namespaces.txt";

fn default_non_padded_namespaces() -> Vec<String> {
    vec!["*tags".to_string(), "*labels".to_string()]
}

// ─── Counting ─────────────────────────────────────────────────────────────────
/// Occurrence counts for one namespace, remembering first-seen order
/// so that equal counts keep a stable order in the final vocabulary.
#[derive(Debug, Default, Clone)]
struct NamespaceCounter {
    order:  Vec<String>,
    counts: HashMap<String, usize>,
}

impl NamespaceCounter {
    fn add(&mut self, item: String) {
        match self.counts.get_mut(&item) {
            Some(count) => *count += 1,
            None => {
                self.order.push(item.clone());
                self.counts.insert(item, 1);
            }
        }
    }

    /// Items by descending count; ties keep first-seen order.
    fn by_frequency(&self) -> Vec<(&str, usize)> {
        let mut items: Vec<(&str, usize)> = self
            .order
            .iter()
            .map(|item| (item.as_str(), self.counts.get(item).copied().unwrap_or(0)))
            .collect();
        // sort_by is stable
        items.sort_by(|a, b| b.1.cmp(&a.1));
        items
    }
}

/// Per-namespace item counts gathered from instances.
#[derive(Debug, Default, Clone)]
pub struct VocabCounter {
    namespaces: BTreeMap<String, NamespaceCounter>,
}

impl VocabCounter {
    pub fn add(&mut self, namespace: &str, item: impl Into<String>) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .add(item.into());
    }

    pub fn count(&self, namespace: &str, item: &str) -> usize {
        self.namespaces
            .get(namespace)
            .and_then(|ns| ns.counts.get(item))
            .copied()
            .unwrap_or(0)
    }
}

// ─── Params ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyParams {
    /// Items seen fewer times than this (per namespace) are dropped
    #[serde(default)]
    pub min_count: BTreeMap<String, usize>,

    /// Upper bound on non-special items per namespace
    #[serde(default)]
    pub max_vocab_size: Option<usize>,

    #[serde(default = "default_non_padded_namespaces")]
    pub non_padded_namespaces: Vec<String>,
}

impl Default for VocabularyParams {
    fn default() -> Self {
        Self {
            min_count:             BTreeMap::new(),
            max_vocab_size:        None,
            non_padded_namespaces: default_non_padded_namespaces(),
        }
    }
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq)]
struct Namespace {
    padded:         bool,
    token_to_index: HashMap<String, u32>,
    index_to_token: Vec<String>,
}

impl Namespace {
    fn new(padded: bool) -> Self {
        let mut ns = Self { padded, ..Self::default() };
        if padded {
            ns.add(DEFAULT_PADDING_TOKEN);
            ns.add(DEFAULT_OOV_TOKEN);
        }
        ns
    }

    fn add(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.token_to_index.get(token) {
            return id;
        }
        let id = self.index_to_token.len() as u32;
        self.token_to_index.insert(token.to_string(), id);
        self.index_to_token.push(token.to_string());
        id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    non_padded_namespaces: Vec<String>,
    namespaces:            BTreeMap<String, Namespace>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(default_non_padded_namespaces())
    }
}

impl Vocabulary {
    pub fn new(non_padded_namespaces: Vec<String>) -> Self {
        Self { non_padded_namespaces, namespaces: BTreeMap::new() }
    }

    /// Count every instance and build a vocabulary from the counts.
    pub fn from_instances(
        instances: &[Instance],
        indexer:   &dyn TokenIndexer,
        params:    &VocabularyParams,
    ) -> Self {
        let mut counter = VocabCounter::default();
        for instance in instances {
            instance.count_vocab_items(indexer, &mut counter);
        }
        let vocab = Self::from_counter(&counter, params);
        tracing::info!(
            "Built vocabulary from {} instances: {} tokens, {} labels",
            instances.len(),
            vocab.get_vocab_size(indexer.namespace()),
            vocab.get_vocab_size(LABELS_NAMESPACE),
        );
        vocab
    }

    pub fn from_counter(counter: &VocabCounter, params: &VocabularyParams) -> Self {
        let mut vocab = Self::new(params.non_padded_namespaces.clone());

        for (name, ns_counter) in &counter.namespaces {
            let min_count = params.min_count.get(name).copied().unwrap_or(1);
            let kept = ns_counter
                .by_frequency()
                .into_iter()
                .filter(|&(_, count)| count >= min_count)
                .take(params.max_vocab_size.unwrap_or(usize::MAX));

            for (item, _) in kept {
                vocab.add_token_to_namespace(item, name);
            }
        }
        vocab
    }

    pub fn is_padded(&self, namespace: &str) -> bool {
        !self.non_padded_namespaces.iter().any(|pattern| match pattern.strip_prefix('*') {
            Some(suffix) => namespace.ends_with(suffix),
            None => namespace == pattern,
        })
    }

    fn namespace_mut(&mut self, namespace: &str) -> &mut Namespace {
        let padded = self.is_padded(namespace);
        self.namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Namespace::new(padded))
    }

    /// Add `token` if missing and return its id.
    pub fn add_token_to_namespace(&mut self, token: &str, namespace: &str) -> u32 {
        self.namespace_mut(namespace).add(token)
    }

    /// Id of `token`. Unknown tokens fall back to the OOV id in padded
    /// namespaces and return None in non-padded ones.
    pub fn get_token_index(&self, token: &str, namespace: &str) -> Option<u32> {
        let ns = self.namespaces.get(namespace)?;
        match ns.token_to_index.get(token) {
            Some(&id) => Some(id),
            None if ns.padded => Some(OOV_INDEX),
            None => None,
        }
    }

    pub fn get_token_from_index(&self, index: u32, namespace: &str) -> Option<&str> {
        self.namespaces
            .get(namespace)?
            .index_to_token
            .get(index as usize)
            .map(String::as_str)
    }

    /// Number of ids in the namespace, padding and OOV included.
    pub fn get_vocab_size(&self, namespace: &str) -> usize {
        self.namespaces
            .get(namespace)
            .map_or(0, |ns| ns.index_to_token.len())
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Write one text file per namespace plus the non-padded patterns.
    pub fn save_to_files(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create vocabulary directory '{}'", dir.display()))?;

        let patterns = self.non_padded_namespaces.join("\n");
        fs::write(dir.join(NON_PADDED_FILENAME), patterns)
            .with_context(|| format!("Cannot write '{}'", NON_PADDED_FILENAME))?;

        for (name, ns) in &self.namespaces {
            // Padding is always id 0 and is recreated on load
            let start = if ns.padded { 1 } else { 0 };
            let lines = ns.index_to_token[start..].join("\n");
            let path = dir.join(format!("{name}.txt"));
            fs::write(&path, lines)
                .with_context(|| format!("Cannot write '{}'", path.display()))?;
        }

        tracing::debug!("Saved vocabulary to '{}'", dir.display());
        Ok(())
    }

    pub fn from_files(dir: &Path) -> Result<Self> {
        let patterns_path = dir.join(NON_PADDED_FILENAME);
        let patterns = fs::read_to_string(&patterns_path)
            .with_context(|| format!("Cannot read '{}'", patterns_path.display()))?;
        let mut vocab = Self::new(
            patterns
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        );

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read vocabulary directory '{}'", dir.display()))?
        {
            let path = entry?.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".txt"))
            else {
                continue;
            };
            if path.file_name().and_then(|n| n.to_str()) == Some(NON_PADDED_FILENAME) {
                continue;
            }

            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            let ns = vocab.namespace_mut(name);
            for token in contents.lines() {
                ns.add(token);
            }
        }

        tracing::debug!("Loaded vocabulary from '{}'", dir.display());
        Ok(vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(tokens: &[&str], labels: &[&str]) -> VocabCounter {
        let mut c = VocabCounter::default();
        for t in tokens {
            c.add(TOKENS_NAMESPACE, *t);
        }
        for l in labels {
            c.add(LABELS_NAMESPACE, *l);
        }
        c
    }

    #[test]
    fn test_padded_namespace_reserves_padding_and_oov() {
        let vocab = Vocabulary::from_counter(&counter(&["a"], &[]), &VocabularyParams::default());
        assert_eq!(vocab.get_token_from_index(0, "tokens"), Some(DEFAULT_PADDING_TOKEN));
        assert_eq!(vocab.get_token_from_index(1, "tokens"), Some(DEFAULT_OOV_TOKEN));
        assert_eq!(vocab.get_token_index("a", "tokens"), Some(2));
        assert_eq!(vocab.get_token_index("zzz", "tokens"), Some(OOV_INDEX));
        assert_eq!(vocab.get_vocab_size("tokens"), 3);
    }

    #[test]
    fn test_namespaces_lists_every_counted_namespace() {
        let vocab = Vocabulary::from_counter(&counter(&["a"], &["pos"]), &VocabularyParams::default());
        let names: Vec<&str> = vocab.namespaces().collect();
        assert_eq!(names, vec!["labels", "tokens"]);
        assert_eq!(Vocabulary::default().namespaces().count(), 0);
    }

    #[test]
    fn test_labels_are_not_padded() {
        let vocab = Vocabulary::from_counter(
            &counter(&[], &["neg", "pos", "pos"]),
            &VocabularyParams::default(),
        );
        assert!(!vocab.is_padded("labels"));
        assert_eq!(vocab.get_token_index("pos", "labels"), Some(0));
        assert_eq!(vocab.get_token_index("neg", "labels"), Some(1));
        assert_eq!(vocab.get_token_index("other", "labels"), None);
        assert_eq!(vocab.get_vocab_size("labels"), 2);
    }

    #[test]
    fn test_frequency_order_with_stable_ties() {
        let vocab = Vocabulary::from_counter(
            &counter(&["b", "a", "c", "c"], &[]),
            &VocabularyParams::default(),
        );
        assert_eq!(vocab.get_token_index("c", "tokens"), Some(2));
        assert_eq!(vocab.get_token_index("b", "tokens"), Some(3));
        assert_eq!(vocab.get_token_index("a", "tokens"), Some(4));
    }

    #[test]
    fn test_min_count_and_max_size() {
        let mut params = VocabularyParams::default();
        params.min_count.insert("tokens".to_string(), 2);
        let vocab = Vocabulary::from_counter(&counter(&["a", "a", "b"], &[]), &params);
        assert_eq!(vocab.get_token_index("b", "tokens"), Some(OOV_INDEX));
        assert_eq!(vocab.get_vocab_size("tokens"), 3);

        let params = VocabularyParams { max_vocab_size: Some(1), ..VocabularyParams::default() };
        let vocab = Vocabulary::from_counter(&counter(&["a", "b", "b"], &[]), &params);
        assert_eq!(vocab.get_token_index("b", "tokens"), Some(2));
        assert_eq!(vocab.get_vocab_size("tokens"), 3);
    }

    #[test]
    fn test_wildcard_pattern_matching() {
        let vocab = Vocabulary::new(vec!["*tags".to_string(), "exact".to_string()]);
        assert!(!vocab.is_padded("pos_tags"));
        assert!(!vocab.is_padded("exact"));
        assert!(vocab.is_padded("exactly"));
        assert!(vocab.is_padded("tokens"));
    }

    #[test]
    fn test_save_and_load_preserves_ids() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = Vocabulary::from_counter(
            &counter(&["the", "movie", "the"], &["pos", "neg"]),
            &VocabularyParams::default(),
        );
        vocab.save_to_files(dir.path()).unwrap();

        let loaded = Vocabulary::from_files(dir.path()).unwrap();
        assert_eq!(loaded, vocab);
        assert_eq!(loaded.get_token_index("movie", "tokens"), Some(3));
        assert_eq!(loaded.get_token_index("neg", "labels"), Some(1));
    }
}
