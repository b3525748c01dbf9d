//! Cost and revenue item service

use casebook_core::ports::EntityStore;
use casebook_core::{validate, ItemKind, LineItem, LineItemPatch, NewLineItemInput, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Serves one item kind; the app holds one instance per kind
pub struct ItemService {
    store: Arc<dyn EntityStore>,
    kind: ItemKind,
}

impl ItemService {
    pub fn new(store: Arc<dyn EntityStore>, kind: ItemKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub async fn list(&self, case_id: Option<&str>) -> Result<Vec<LineItem>> {
        let items = self.store.list_items(self.kind, case_id).await?;
        debug!("Listed {} {}s (case filter: {:?})", items.len(), self.kind, case_id);
        Ok(items)
    }

    pub async fn get(&self, id: &str) -> Result<Option<LineItem>> {
        let item = self.store.get_item(self.kind, id).await?;
        if item.is_none() {
            debug!("{} not found: {}", self.kind, id);
        }
        Ok(item)
    }

    pub async fn create(&self, input: NewLineItemInput) -> Result<LineItem> {
        let item = validate::new_item(input)?;
        let created = self.store.create_item(self.kind, item).await?;
        info!(
            "Created {}: id={}, case={}, amount={}",
            self.kind, created.id, created.case_id, created.amount
        );
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: LineItemPatch) -> Result<Option<LineItem>> {
        let patch = validate::item_patch(patch)?;
        let updated = self.store.update_item(self.kind, id, patch).await?;
        match &updated {
            Some(item) => info!("Updated {}: id={}", self.kind, item.id),
            None => debug!("{} not found for update: {}", self.kind, id),
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_item(self.kind, id).await?;
        if deleted {
            info!("Deleted {}: id={}", self.kind, id);
        } else {
            debug!("{} not found for delete: {}", self.kind, id);
        }
        Ok(deleted)
    }
}
