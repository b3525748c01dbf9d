//! Cost and revenue timing service

use casebook_core::ports::EntityStore;
use casebook_core::{validate, ItemKind, Result, Timing, TimingPatch, TimingSchedule};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TimingService {
    store: Arc<dyn EntityStore>,
    kind: ItemKind,
}

impl TimingService {
    pub fn new(store: Arc<dyn EntityStore>, kind: ItemKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub async fn list(&self, item_id: Option<&str>) -> Result<Vec<Timing>> {
        let timing = self.store.list_timing(self.kind, item_id).await?;
        debug!(
            "Listed {} {} timing records (item filter: {:?})",
            timing.len(),
            self.kind,
            item_id
        );
        Ok(timing)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Timing>> {
        let timing = self.store.get_timing(self.kind, id).await?;
        if timing.is_none() {
            debug!("{} timing not found: {}", self.kind, id);
        }
        Ok(timing)
    }

    /// `item_id` is the parent reference taken from `cost_item_id` or
    /// `revenue_item_id`
    pub async fn create(&self, item_id: Option<String>, schedule: TimingSchedule) -> Result<Timing> {
        let timing = validate::new_timing(self.kind, item_id, schedule)?;
        let created = self.store.create_timing(self.kind, timing).await?;
        info!(
            "Created {} timing: id={}, item={}",
            self.kind, created.id, created.item_id
        );
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: TimingPatch) -> Result<Option<Timing>> {
        let patch = validate::timing_patch(patch)?;
        let updated = self.store.update_timing(self.kind, id, patch).await?;
        match &updated {
            Some(timing) => info!("Updated {} timing: id={}", self.kind, timing.id),
            None => debug!("{} timing not found for update: {}", self.kind, id),
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_timing(self.kind, id).await?;
        if deleted {
            info!("Deleted {} timing: id={}", self.kind, id);
        } else {
            debug!("{} timing not found for delete: {}", self.kind, id);
        }
        Ok(deleted)
    }
}
