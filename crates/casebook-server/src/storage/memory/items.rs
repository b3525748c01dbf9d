use super::{newest_first, MemoryStore};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::ItemStore;
use casebook_core::{CasebookError, ItemKind, LineItem, LineItemPatch, NewLineItem, Patch, Result};

impl MemoryStore {
    fn require_case(&self, case_id: &str) -> Result<()> {
        if self.cases.contains_key(case_id) {
            Ok(())
        } else {
            Err(CasebookError::Integrity(
                "case_id does not reference an existing business case".to_string(),
            ))
        }
    }

    fn insert_item(&self, kind: ItemKind, item: NewLineItem) -> Result<LineItem> {
        let _guard = self.write_guard();
        self.require_case(&item.case_id)?;

        let stamp = now();
        let created = LineItem {
            id: new_id(),
            case_id: item.case_id,
            name: item.name,
            category: item.category,
            amount: item.amount,
            notes: item.notes,
            created_at: stamp,
            updated_at: stamp,
        };
        self.items(kind)
            .insert(created.id.clone(), self.stored(created.clone()));
        Ok(created)
    }

    fn patch_item(
        &self,
        kind: ItemKind,
        id: &str,
        patch: LineItemPatch,
    ) -> Result<Option<LineItem>> {
        let _guard = self.write_guard();
        if !self.items(kind).contains_key(id) {
            return Ok(None);
        }
        if let Patch::Set(case_id) = &patch.case_id {
            self.require_case(case_id)?;
        }

        let Some(mut entry) = self.items(kind).get_mut(id) else {
            return Ok(None);
        };
        patch.apply_to(&mut entry.record);
        entry.record.updated_at = now();
        Ok(Some(entry.record.clone()))
    }

    fn remove_item(&self, kind: ItemKind, id: &str) -> bool {
        let _guard = self.write_guard();
        self.purge_item(kind, id)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list_items(&self, kind: ItemKind, case_id: Option<&str>) -> Result<Vec<LineItem>> {
        Ok(newest_first(self.items(kind), |item| {
            case_id.map_or(true, |wanted| item.case_id == wanted)
        }))
    }

    async fn get_item(&self, kind: ItemKind, id: &str) -> Result<Option<LineItem>> {
        Ok(self.items(kind).get(id).map(|entry| entry.record.clone()))
    }

    async fn create_item(&self, kind: ItemKind, item: NewLineItem) -> Result<LineItem> {
        self.insert_item(kind, item)
    }

    async fn update_item(
        &self,
        kind: ItemKind,
        id: &str,
        patch: LineItemPatch,
    ) -> Result<Option<LineItem>> {
        if patch.is_empty() {
            return self.get_item(kind, id).await;
        }
        self.patch_item(kind, id, patch)
    }

    async fn delete_item(&self, kind: ItemKind, id: &str) -> Result<bool> {
        Ok(self.remove_item(kind, id))
    }
}
