//! In-memory store using DashMap (used when no database is configured)
//!
//! Mimics the relational backend without persistence: foreign keys are
//! checked explicitly and cascades are walked by hand. Each collection is a
//! DashMap keyed by id; a store-wide write gate serializes mutations that
//! touch more than one collection so every call stays atomic.

mod cases;
mod clients;
mod items;
mod timing;

use async_trait::async_trait;
use casebook_core::ports::{Backend, EntityStore};
use casebook_core::{BusinessCase, Client, ItemKind, LineItem, Result, Tag, Timing};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A record plus its insertion sequence, used to order records created
/// within the same clock tick
struct Stored<T> {
    seq: u64,
    record: T,
}

trait Created {
    fn created_at(&self) -> DateTime<Utc>;
}

impl Created for Client {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Created for BusinessCase {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Created for LineItem {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Created for Timing {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

pub struct MemoryStore {
    clients: DashMap<String, Stored<Client>>,
    /// Stored without enrichment; client_name and tags are filled on read
    cases: DashMap<String, Stored<BusinessCase>>,
    cost_items: DashMap<String, Stored<LineItem>>,
    revenue_items: DashMap<String, Stored<LineItem>>,
    cost_timing: DashMap<String, Stored<Timing>>,
    revenue_timing: DashMap<String, Stored<Timing>>,
    /// Tag registry by id
    tags: DashMap<String, Tag>,
    /// Tag name to tag id
    tag_names: DashMap<String, String>,
    /// (case_id, tag_id)
    case_tags: DashSet<(String, String)>,
    seq: AtomicU64,
    write_gate: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            cases: DashMap::new(),
            cost_items: DashMap::new(),
            revenue_items: DashMap::new(),
            cost_timing: DashMap::new(),
            revenue_timing: DashMap::new(),
            tags: DashMap::new(),
            tag_names: DashMap::new(),
            case_tags: DashSet::new(),
            seq: AtomicU64::new(0),
            write_gate: Mutex::new(()),
        }
    }

    fn stored<T>(&self, record: T) -> Stored<T> {
        Stored {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            record,
        }
    }

    /// Hold for the whole of a mutation
    fn write_guard(&self) -> MutexGuard<'_, ()> {
        // Nothing guarded by the mutex itself can be left half-written
        self.write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn items(&self, kind: ItemKind) -> &DashMap<String, Stored<LineItem>> {
        match kind {
            ItemKind::Cost => &self.cost_items,
            ItemKind::Revenue => &self.revenue_items,
        }
    }

    fn timing(&self, kind: ItemKind) -> &DashMap<String, Stored<Timing>> {
        match kind {
            ItemKind::Cost => &self.cost_timing,
            ItemKind::Revenue => &self.revenue_timing,
        }
    }

    /// Remove an item and its timing records
    fn purge_item(&self, kind: ItemKind, item_id: &str) -> bool {
        let removed = self.items(kind).remove(item_id).is_some();
        self.timing(kind).retain(|_, t| t.record.item_id != item_id);
        removed
    }

    /// Remove a case with its items, their timing and its tag links
    fn purge_case(&self, case_id: &str) -> bool {
        let removed = self.cases.remove(case_id).is_some();
        for kind in [ItemKind::Cost, ItemKind::Revenue] {
            let item_ids: Vec<String> = self
                .items(kind)
                .iter()
                .filter(|entry| entry.record.case_id == case_id)
                .map(|entry| entry.key().clone())
                .collect();
            for item_id in item_ids {
                self.purge_item(kind, &item_id);
            }
        }
        self.case_tags.retain(|(linked_case, _)| linked_case != case_id);
        removed
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Clone the matching records, newest first
fn newest_first<T, F>(map: &DashMap<String, Stored<T>>, keep: F) -> Vec<T>
where
    T: Clone + Created,
    F: Fn(&T) -> bool,
{
    let mut rows: Vec<(DateTime<Utc>, u64, T)> = map
        .iter()
        .filter(|entry| keep(&entry.record))
        .map(|entry| (entry.record.created_at(), entry.seq, entry.record.clone()))
        .collect();
    rows.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    rows.into_iter().map(|(_, _, record)| record).collect()
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::InMemory
    }

    async fn ping(&self) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Total rows across every collection, for orphan checks
    pub(crate) fn row_count(&self) -> usize {
        self.clients.len()
            + self.cases.len()
            + self.cost_items.len()
            + self.revenue_items.len()
            + self.cost_timing.len()
            + self.revenue_timing.len()
            + self.case_tags.len()
    }

    pub(crate) fn link_count(&self) -> usize {
        self.case_tags.len()
    }
}
