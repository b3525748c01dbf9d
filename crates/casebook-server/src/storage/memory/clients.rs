use super::{newest_first, MemoryStore};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::ClientStore;
use casebook_core::{Client, ClientPatch, NewClient, Result};

impl MemoryStore {
    fn insert_client(&self, client: NewClient) -> Client {
        let _guard = self.write_guard();
        let stamp = now();
        let created = Client {
            id: new_id(),
            name: client.name,
            notes: client.notes,
            created_at: stamp,
            updated_at: stamp,
        };
        self.clients
            .insert(created.id.clone(), self.stored(created.clone()));
        created
    }

    fn patch_client(&self, id: &str, patch: ClientPatch) -> Option<Client> {
        let _guard = self.write_guard();
        let mut entry = self.clients.get_mut(id)?;
        if patch.apply_to(&mut entry.record) {
            entry.record.updated_at = now();
        }
        Some(entry.record.clone())
    }

    fn remove_client(&self, id: &str) -> bool {
        let _guard = self.write_guard();
        if self.clients.remove(id).is_none() {
            return false;
        }
        let case_ids: Vec<String> = self
            .cases
            .iter()
            .filter(|entry| entry.record.client_id == id)
            .map(|entry| entry.key().clone())
            .collect();
        for case_id in case_ids {
            self.purge_case(&case_id);
        }
        true
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn list_clients(&self) -> Result<Vec<Client>> {
        Ok(newest_first(&self.clients, |_| true))
    }

    async fn get_client(&self, id: &str) -> Result<Option<Client>> {
        Ok(self.clients.get(id).map(|entry| entry.record.clone()))
    }

    async fn create_client(&self, client: NewClient) -> Result<Client> {
        Ok(self.insert_client(client))
    }

    async fn update_client(&self, id: &str, patch: ClientPatch) -> Result<Option<Client>> {
        Ok(self.patch_client(id, patch))
    }

    async fn delete_client(&self, id: &str) -> Result<bool> {
        Ok(self.remove_client(id))
    }
}
