use crate::error::{Result, StorageError};
use crate::shortcode::ShortCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The stored side of a mapping: the original URL and its soft-delete flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The original URL that was shortened.
    pub url: String,
    /// Whether the owner has deleted this link.
    #[serde(default)]
    pub deleted: bool,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            deleted: false,
        }
    }
}

/// A flattened (owner, code, url, deleted) row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub owner: String,
    pub code: ShortCode,
    pub url: String,
    pub deleted: bool,
}

impl Entry {
    pub fn new(owner: impl Into<String>, code: ShortCode, url: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            code,
            url: url.into(),
            deleted: false,
        }
    }

    fn from_parts(owner: &str, code: &ShortCode, link: &Link) -> Self {
        Self {
            owner: owner.to_owned(),
            code: code.clone(),
            url: link.url.clone(),
            deleted: link.deleted,
        }
    }
}

/// The owner → code → link relation with a store-wide code index.
///
/// Every code appears under exactly one owner. The index is kept in step
/// with the owner partitions by every mutating method.
#[derive(Debug, Clone, Default)]
pub struct Relation {
    owners: HashMap<String, BTreeMap<ShortCode, Link>>,
    index: HashMap<ShortCode, String>,
}

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a relation from stored rows.
    ///
    /// Fails with [`StorageError::InvalidData`] when two rows share a code.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Result<Self> {
        let mut relation = Self::new();
        for entry in entries {
            let code = entry.code.clone();
            if !relation.insert(entry) {
                return Err(StorageError::InvalidData(format!(
                    "short code '{code}' is stored more than once"
                )));
            }
        }
        Ok(relation)
    }

    /// Inserts an entry. Returns `false` and leaves the relation untouched if
    /// the code is already bound, whoever owns it.
    pub fn insert(&mut self, entry: Entry) -> bool {
        if self.index.contains_key(&entry.code) {
            return false;
        }

        self.index.insert(entry.code.clone(), entry.owner.clone());
        self.owners.entry(entry.owner).or_default().insert(
            entry.code,
            Link {
                url: entry.url,
                deleted: entry.deleted,
            },
        );
        true
    }

    /// Removes a code entirely.
    ///
    /// Links are never deleted through the store's public surface; this only
    /// undoes an insert that could not be written through.
    pub fn remove(&mut self, code: &str) -> Option<Entry> {
        let owner = self.index.remove(code)?;
        let partition = self.owners.get_mut(&owner)?;
        let (code, link) = partition.remove_entry(code)?;
        if partition.is_empty() {
            self.owners.remove(&owner);
        }

        Some(Entry {
            owner,
            code,
            url: link.url,
            deleted: link.deleted,
        })
    }

    /// Looks a code up regardless of owner.
    pub fn get(&self, code: &str) -> Option<(&str, &Link)> {
        let owner = self.index.get(code)?;
        let link = self.owners.get(owner)?.get(code)?;
        Some((owner.as_str(), link))
    }

    /// Looks a code up inside one owner's partition.
    pub fn get_owned(&self, owner: &str, code: &str) -> Option<&Link> {
        self.owners.get(owner)?.get(code)
    }

    /// Sets the delete flag on a code held by `owner`.
    ///
    /// Returns the previous flag, or `None` when `owner` does not hold `code`.
    pub fn set_deleted(&mut self, owner: &str, code: &str, deleted: bool) -> Option<bool> {
        let link = self.owners.get_mut(owner)?.get_mut(code)?;
        Some(std::mem::replace(&mut link.deleted, deleted))
    }

    /// Returns a copy of every entry held by `owner`, ordered by code.
    ///
    /// `None` when the owner holds nothing.
    pub fn entries_of(&self, owner: &str) -> Option<Vec<Entry>> {
        let partition = self.owners.get(owner)?;
        Some(
            partition
                .iter()
                .map(|(code, link)| Entry::from_parts(owner, code, link))
                .collect(),
        )
    }

    /// Iterates over all (owner, code, link) triples in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShortCode, &Link)> {
        self.owners.iter().flat_map(|(owner, partition)| {
            partition
                .iter()
                .map(move |(code, link)| (owner.as_str(), code, link))
        })
    }

    /// Number of codes in the relation.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of owners holding at least one code.
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }
}
