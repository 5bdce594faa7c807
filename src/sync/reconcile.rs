//! Merge the local and remote inventories into one per-key view

use std::collections::HashMap;

use crate::types::{
    DeleteRequest, FileEntry, LocalFileRecord, RemoteFileRecord, SyncAction, SyncReport,
};

/// Key → [`FileEntry`] mapping for a single sync pass.
///
/// Local keys come first in discovery order; remote-only keys follow in
/// listing order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entries: Vec<FileEntry>,
    index: HashMap<String, usize>,
}

impl Inventory {
    /// Build the unified view. A key is an orphan only when it is missing
    /// locally; remote metadata never influences that decision.
    pub fn reconcile(local: Vec<LocalFileRecord>, remote: Vec<RemoteFileRecord>) -> Self {
        let mut inventory = Self {
            entries: Vec::with_capacity(local.len() + remote.len()),
            index: HashMap::with_capacity(local.len() + remote.len()),
        };

        for record in local {
            if inventory.index.contains_key(&record.key) {
                continue;
            }
            inventory.push(FileEntry::local(record));
        }

        for record in remote {
            match inventory.index.get(&record.key).copied() {
                Some(i) => inventory.entries[i].attach_remote(record),
                None => inventory.push(FileEntry::orphan(record)),
            }
        }

        inventory
    }

    fn push(&mut self, entry: FileEntry) {
        self.index.insert(entry.key().to_string(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn get(&self, key: &str) -> Option<&FileEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One deletion request per remote-only key, in listing order
    pub fn delete_set(&self) -> Vec<DeleteRequest> {
        self.entries
            .iter()
            .filter(|e| e.is_orphan())
            .map(|e| DeleteRequest {
                key: e.key().to_string(),
            })
            .collect()
    }

    /// Entries backed by a local file, i.e. everything that gets uploaded
    pub fn uploads(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter(|e| !e.is_orphan())
    }

    /// Counts a sync of this inventory will report
    pub fn planned_report(&self) -> SyncReport {
        let mut report = SyncReport::default();
        for entry in &self.entries {
            report.record(entry.action());
        }
        report
    }

    /// Each key with the action it will receive
    pub fn actions(&self) -> impl Iterator<Item = (&str, SyncAction)> {
        self.entries.iter().map(|e| (e.key(), e.action()))
    }
}
