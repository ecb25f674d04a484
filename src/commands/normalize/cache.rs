use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::warn;

use crate::util::write_json_pretty;

pub(crate) const CACHE_FILENAME: &str = "normalization_cache.json";

/// Anchor-id → payload-hash memo that makes re-normalization incremental.
/// Loaded once at the start of a batch and saved once at the end; the cache
/// is always an explicitly passed object, never process-wide state.
#[derive(Debug, Default)]
pub(crate) struct NormalizationCache {
    entries: BTreeMap<String, String>,
}

impl NormalizationCache {
    pub(crate) fn load(base: &Path) -> Self {
        let path = base.join(CACHE_FILENAME);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_slice::<BTreeMap<String, String>>(&raw) {
            Ok(entries) => Self { entries },
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "invalid normalization cache, starting empty"
                );
                Self::default()
            }
        }
    }

    pub(crate) fn save(&self, base: &Path) -> Result<()> {
        write_json_pretty(&base.join(CACHE_FILENAME), &self.entries)
    }

    pub(crate) fn is_unchanged(&self, anchor_id: &str, payload_hash: &str) -> bool {
        self.entries
            .get(anchor_id)
            .is_some_and(|stored| stored == payload_hash)
    }

    pub(crate) fn record(&mut self, anchor_id: String, payload_hash: String) {
        self.entries.insert(anchor_id, payload_hash);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
