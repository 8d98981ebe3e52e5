//! Run-scoped reference cache.
//!
//! One bulk listing per category at the start of the run replaces a remote
//! round trip per record: thousands of records resolve against a few dozen
//! to a few thousand cached entries by local code/label lookup.
//!
//! The cache is built once and never mutated afterwards; shared behind an
//! `Arc` it needs no locking. A failed build is fatal to the run, since
//! every dependent resolution would silently miss.

use crate::error::{ResolveError, Result};
use crate::kb::{ExternalId, KnowledgeBase, ReferenceCategory, ReferenceEntry};
use rustc_hash::FxHashMap;
use tracing::info;

/// Immutable reference-entity cache for one pipeline run.
#[derive(Debug)]
pub struct ReferenceCache {
    entries: Vec<ReferenceEntry>,
    /// Code lookup spans categories: source-native codes are already
    /// namespaced by their identifier scheme.
    by_code: FxHashMap<String, usize>,
    by_label: FxHashMap<(ReferenceCategory, String), usize>,
}

impl ReferenceCache {
    /// Bulk-fetch every candidate entity for the given categories.
    ///
    /// Any failure here is a [`ResolveError::PrefetchFailure`]: the run
    /// must abort rather than proceed with an incomplete reference set.
    pub async fn build(
        kb: &dyn KnowledgeBase,
        categories: &[ReferenceCategory],
    ) -> Result<Self> {
        let mut entries = Vec::new();
        for &category in categories {
            let mut listed = kb.list_references(category).await.map_err(|e| {
                ResolveError::PrefetchFailure(format!(
                    "listing {} references: {}",
                    category.as_str(),
                    e
                ))
            })?;
            info!(
                category = category.as_str(),
                entries = listed.len(),
                "prefetched reference entities"
            );
            entries.append(&mut listed);
        }
        Ok(Self::from_entries(entries))
    }

    /// Build directly from entries (tests, replay).
    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Self {
        let mut by_code = FxHashMap::default();
        let mut by_label = FxHashMap::default();
        for (i, entry) in entries.iter().enumerate() {
            if let Some(code) = &entry.code {
                by_code.entry(code.clone()).or_insert(i);
            }
            by_label
                .entry((entry.category, entry.label.clone()))
                .or_insert(i);
        }
        Self {
            entries,
            by_code,
            by_label,
        }
    }

    /// Resolve by source-native code.
    pub fn lookup_code(&self, code: &str) -> Option<&ExternalId> {
        self.by_code
            .get(code)
            .map(|&i| &self.entries[i].external_id)
    }

    /// Resolve by display label within a category.
    pub fn lookup_label(&self, category: ReferenceCategory, label: &str) -> Option<&ExternalId> {
        self.by_label
            .get(&(category, label.to_string()))
            .map(|&i| &self.entries[i].external_id)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        category: ReferenceCategory,
        code: Option<&str>,
        label: &str,
        id: &str,
    ) -> ReferenceEntry {
        ReferenceEntry {
            category,
            code: code.map(|c| c.to_string()),
            label: label.to_string(),
            external_id: ExternalId::new(id),
        }
    }

    #[test]
    fn test_code_and_label_lookup() {
        let cache = ReferenceCache::from_entries(vec![
            entry(ReferenceCategory::Us, Some("06"), "California", "Q99"),
            entry(ReferenceCategory::Ca, None, "Yukon", "Q2009"),
        ]);

        assert_eq!(cache.lookup_code("06").unwrap().as_str(), "Q99");
        assert!(cache.lookup_code("07").is_none());
        assert_eq!(
            cache
                .lookup_label(ReferenceCategory::Ca, "Yukon")
                .unwrap()
                .as_str(),
            "Q2009"
        );
        // Label lookup is category-scoped.
        assert!(cache
            .lookup_label(ReferenceCategory::Us, "Yukon")
            .is_none());
    }

    #[test]
    fn test_first_entry_wins_on_duplicate_code() {
        let cache = ReferenceCache::from_entries(vec![
            entry(ReferenceCategory::Us, Some("06"), "California", "Q99"),
            entry(ReferenceCategory::Mx, Some("06"), "Colima", "Q7271"),
        ]);
        assert_eq!(cache.lookup_code("06").unwrap().as_str(), "Q99");
        assert_eq!(cache.len(), 2);
    }
}
