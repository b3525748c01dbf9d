use super::{newest_first, MemoryStore};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::TimingStore;
use casebook_core::validate::check_date_order;
use casebook_core::{CasebookError, ItemKind, NewTiming, Result, Timing, TimingPatch};

impl MemoryStore {
    fn insert_timing(&self, kind: ItemKind, timing: NewTiming) -> Result<Timing> {
        let _guard = self.write_guard();
        if !self.items(kind).contains_key(&timing.item_id) {
            return Err(CasebookError::Integrity(format!(
                "{} does not reference an existing {}",
                kind.parent_key(),
                kind
            )));
        }

        let stamp = now();
        let created = Timing {
            id: new_id(),
            kind,
            item_id: timing.item_id,
            start_date: timing.schedule.start_date,
            end_date: timing.schedule.end_date,
            recurrence_interval_months: timing.schedule.recurrence_interval_months,
            notes: timing.schedule.notes,
            created_at: stamp,
            updated_at: stamp,
        };
        self.timing(kind)
            .insert(created.id.clone(), self.stored(created.clone()));
        Ok(created)
    }

    fn patch_timing(&self, kind: ItemKind, id: &str, patch: TimingPatch) -> Result<Option<Timing>> {
        let _guard = self.write_guard();
        let Some(mut entry) = self.timing(kind).get_mut(id) else {
            return Ok(None);
        };
        check_date_order(
            *patch.start_date.resolve(&entry.record.start_date),
            *patch.end_date.resolve(&entry.record.end_date),
        )?;
        patch.apply_to(&mut entry.record);
        entry.record.updated_at = now();
        Ok(Some(entry.record.clone()))
    }

    fn remove_timing(&self, kind: ItemKind, id: &str) -> bool {
        let _guard = self.write_guard();
        self.timing(kind).remove(id).is_some()
    }
}

#[async_trait]
impl TimingStore for MemoryStore {
    async fn list_timing(&self, kind: ItemKind, item_id: Option<&str>) -> Result<Vec<Timing>> {
        Ok(newest_first(self.timing(kind), |timing| {
            item_id.map_or(true, |wanted| timing.item_id == wanted)
        }))
    }

    async fn get_timing(&self, kind: ItemKind, id: &str) -> Result<Option<Timing>> {
        Ok(self.timing(kind).get(id).map(|entry| entry.record.clone()))
    }

    async fn create_timing(&self, kind: ItemKind, timing: NewTiming) -> Result<Timing> {
        self.insert_timing(kind, timing)
    }

    async fn update_timing(
        &self,
        kind: ItemKind,
        id: &str,
        patch: TimingPatch,
    ) -> Result<Option<Timing>> {
        if patch.is_empty() {
            return self.get_timing(kind, id).await;
        }
        self.patch_timing(kind, id, patch)
    }

    async fn delete_timing(&self, kind: ItemKind, id: &str) -> Result<bool> {
        Ok(self.remove_timing(kind, id))
    }
}
