//! Where raw battle logs come from.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use usage_protocol::to_id;

/// One log available from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: String,
    /// Tier suggested by where the log lives; a `tier` line in the log wins
    pub tier_hint: Option<String>,
}

impl LogEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tier_hint: None,
        }
    }

    pub fn with_tier_hint(mut self, tier: &str) -> Self {
        self.tier_hint = Some(to_id(tier));
        self
    }
}

/// Enumerable store of raw logs keyed by identifier
pub trait LogSource: Send + Sync + 'static {
    /// Every log currently available
    fn list(&self) -> impl Future<Output = Result<Vec<LogEntry>>> + Send;

    /// Raw text of one log
    fn fetch(&self, id: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Logs stored as `*.log` files under a root directory
///
/// Ids are paths relative to the root, `/`-separated. A log nested under a
/// directory takes that top-level directory name as its tier hint, so the
/// usual `<tier>/<date>/<battle>.log` layout needs no tier lines.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_for(&self, path: &Path) -> Option<LogEntry> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;

        let entry = LogEntry::new(parts.join("/"));
        if parts.len() > 1 {
            Some(entry.with_tier_hint(parts[0]))
        } else {
            Some(entry)
        }
    }
}

impl LogSource for DirectorySource {
    async fn list(&self) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut read = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to list {}", dir.display()))?;

            while let Some(item) = read.next_entry().await? {
                let path = item.path();
                let file_type = item.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file()
                    && path.extension().is_some_and(|ext| ext == "log")
                {
                    match self.entry_for(&path) {
                        Some(entry) => entries.push(entry),
                        None => {
                            tracing::warn!(path = %path.display(), "skipping log with non-UTF-8 path")
                        }
                    }
                }
            }
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::debug!(root = %self.root.display(), count = entries.len(), "listed logs");
        Ok(entries)
    }

    async fn fetch(&self, id: &str) -> Result<String> {
        if id.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(anyhow!("invalid log id {id:?}"));
        }

        let path = self.root.join(id);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Logs held in memory, in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    order: Vec<LogEntry>,
    logs: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(self, id: &str, text: &str) -> Self {
        self.with_entry(LogEntry::new(id), text)
    }

    pub fn with_tier_log(self, id: &str, tier: &str, text: &str) -> Self {
        self.with_entry(LogEntry::new(id).with_tier_hint(tier), text)
    }

    fn with_entry(mut self, entry: LogEntry, text: &str) -> Self {
        self.logs.insert(entry.id.clone(), text.to_string());
        self.order.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl LogSource for MemorySource {
    async fn list(&self) -> Result<Vec<LogEntry>> {
        Ok(self.order.clone())
    }

    async fn fetch(&self, id: &str) -> Result<String> {
        self.logs
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("no log with id {id:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new()
            .with_log("b", "|win|Alice")
            .with_tier_log("a", "[Gen 7] OU", "|tie");

        assert_eq!(source.len(), 2);

        let entries = source.list().await.unwrap();
        assert_eq!(entries[0], LogEntry::new("b"));
        assert_eq!(entries[1].id, "a");
        assert_eq!(entries[1].tier_hint.as_deref(), Some("gen7ou"));

        assert_eq!(source.fetch("a").await.unwrap(), "|tie");
        assert!(source.fetch("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_directory_source_lists_nested_logs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("gen7ou/2024-01-01")).unwrap();
        std::fs::write(root.join("gen7ou/2024-01-01/battle-1.log"), "|win|Alice").unwrap();
        std::fs::write(root.join("gen7ou/battle-2.log"), "|tie").unwrap();
        std::fs::write(root.join("loose.log"), "|tie").unwrap();
        std::fs::write(root.join("gen7ou/notes.txt"), "ignored").unwrap();

        let source = DirectorySource::new(root);
        let entries = source.list().await.unwrap();

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "gen7ou/2024-01-01/battle-1.log",
                "gen7ou/battle-2.log",
                "loose.log"
            ]
        );
        assert_eq!(entries[0].tier_hint.as_deref(), Some("gen7ou"));
        assert_eq!(entries[1].tier_hint.as_deref(), Some("gen7ou"));
        assert_eq!(entries[2].tier_hint, None);

        assert_eq!(source.fetch(&entries[0].id).await.unwrap(), "|win|Alice");
    }

    #[tokio::test]
    async fn test_directory_source_rejects_escaping_ids() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());

        assert!(source.fetch("../secret.log").await.is_err());
        assert!(source.fetch("gen7ou//battle.log").await.is_err());
    }

    #[tokio::test]
    async fn test_directory_source_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path().join("nope"));

        assert!(source.list().await.is_err());
    }
}
