use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snip_core::error::{Result, StorageError};
use snip_core::{Backend, Change, Entry, Link, Relation, ShortCode};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A stored link as found on disk.
///
/// Older snapshots map codes straight to URL strings and carry no delete
/// flag; they load as live links.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredLink {
    Url(String),
    Link(Link),
}

impl From<StoredLink> for Link {
    fn from(value: StoredLink) -> Self {
        match value {
            StoredLink::Url(url) => Link::new(url),
            StoredLink::Link(link) => link,
        }
    }
}

type Snapshot = BTreeMap<String, BTreeMap<String, StoredLink>>;

#[derive(Serialize)]
#[serde(transparent)]
struct SnapshotRef<'a>(BTreeMap<&'a str, BTreeMap<&'a ShortCode, &'a Link>>);

impl<'a> SnapshotRef<'a> {
    fn new(relation: &'a Relation) -> Self {
        let mut owners: BTreeMap<&str, BTreeMap<&ShortCode, &Link>> = BTreeMap::new();
        for (owner, code, link) in relation.iter() {
            owners.entry(owner).or_default().insert(code, link);
        }
        Self(owners)
    }
}

/// Full-snapshot JSON file backend.
///
/// The file holds one object `{ owner: { code: { "url": .., "deleted": .. } } }`.
/// Every commit rewrites the whole file. A crash during the write can leave a
/// truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(bytes: &[u8]) -> Result<Relation> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)
            .map_err(|e| StorageError::Serialization(format!("invalid snapshot: {e}")))?;

        let mut entries = Vec::new();
        for (owner, links) in snapshot {
            for (code, stored) in links {
                let code = ShortCode::parse(&code)
                    .map_err(|e| StorageError::InvalidData(e.to_string()))?;
                let link = Link::from(stored);
                entries.push(Entry {
                    owner: owner.clone(),
                    code,
                    url: link.url,
                    deleted: link.deleted,
                });
            }
        }

        Relation::from_entries(entries)
    }

    fn encode(relation: &Relation) -> Result<Vec<u8>> {
        serde_json::to_vec(&SnapshotRef::new(relation))
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<Relation> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "snapshot file not found, starting empty");
                return Ok(Relation::new());
            }
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let relation = Self::decode(&bytes)?;
        info!(
            path = %self.path.display(),
            links = relation.len(),
            "loaded snapshot"
        );
        Ok(relation)
    }

    async fn commit(&self, change: &Change, relation: &Relation) -> Result<()> {
        let bytes = Self::encode(relation)?;
        tokio::fs::write(&self.path, &bytes)
            .await
            .map_err(|e| StorageError::Io(format!("write {}: {e}", self.path.display())))?;

        debug!(
            code = %change.code(),
            bytes = bytes.len(),
            "rewrote snapshot"
        );
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(owner: &str, code: &str, url: &str) -> Entry {
        Entry::new(owner, ShortCode::new_unchecked(code), url)
    }

    fn backend_in(dir: &TempDir) -> FileBackend {
        FileBackend::new(dir.path().join("links.json"))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);

        assert!(backend.load().await.unwrap().is_empty());
        assert!(!backend.path().exists());
    }

    #[tokio::test]
    async fn commit_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);

        let mut relation = Relation::new();
        let first = entry("u1", "abc", "https://one.example");
        relation.insert(first.clone());
        relation.insert(entry("u2", "def", "https://two.example"));
        relation.set_deleted("u2", "def", true);

        backend
            .commit(&Change::Insert(first), &relation)
            .await
            .unwrap();

        let loaded = backend.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.get("abc"),
            Some(("u1", &Link::new("https://one.example")))
        );
        let (owner, link) = loaded.get("def").unwrap();
        assert_eq!(owner, "u2");
        assert!(link.deleted);
    }

    #[tokio::test]
    async fn commit_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);

        let mut big = Relation::new();
        for i in 0..50 {
            big.insert(entry("u1", &format!("code{i}"), "https://example.com/long/path"));
        }
        let change = Change::Insert(entry("u1", "code0", "https://example.com/long/path"));
        backend.commit(&change, &big).await.unwrap();

        let mut small = Relation::new();
        small.insert(entry("u1", "only", "https://a.example"));
        backend.commit(&change, &small).await.unwrap();

        let loaded = backend.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("only").is_some());
    }

    #[tokio::test]
    async fn writes_widened_layout() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);

        let mut relation = Relation::new();
        let e = entry("u1", "abc", "https://example.com");
        relation.insert(e.clone());
        backend.commit(&Change::Insert(e), &relation).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(backend.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "u1": { "abc": { "url": "https://example.com", "deleted": false } }
            })
        );
    }

    #[tokio::test]
    async fn loads_legacy_layout() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);
        std::fs::write(
            backend.path(),
            r#"{"u1":{"abc":"https://example.com/a"},"u2":{"def":{"url":"https://example.com/b","deleted":true}}}"#,
        )
        .unwrap();

        let loaded = backend.load().await.unwrap();

        let (owner, link) = loaded.get("abc").unwrap();
        assert_eq!(owner, "u1");
        assert_eq!(link, &Link::new("https://example.com/a"));
        assert!(loaded.get("def").unwrap().1.deleted);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);
        std::fs::write(backend.path(), b"{\"u1\": {\"abc\": ").unwrap();

        let err = backend.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn duplicate_code_across_owners_is_invalid() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);
        std::fs::write(
            backend.path(),
            r#"{"u1":{"abc":"https://one.example"},"u2":{"abc":"https://two.example"}}"#,
        )
        .unwrap();

        let err = backend.load().await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[tokio::test]
    async fn write_failure_is_io_error() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("missing-dir").join("links.json"));

        let mut relation = Relation::new();
        let e = entry("u1", "abc", "https://example.com");
        relation.insert(e.clone());

        let err = backend
            .commit(&Change::Insert(e), &relation)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
