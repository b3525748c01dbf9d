//! Client service

use casebook_core::ports::EntityStore;
use casebook_core::{validate, Client, ClientPatch, NewClientInput, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ClientService {
    store: Arc<dyn EntityStore>,
}

impl ClientService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Client>> {
        let clients = self.store.list_clients().await?;
        debug!("Listed {} clients", clients.len());
        Ok(clients)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Client>> {
        let client = self.store.get_client(id).await?;
        if client.is_none() {
            debug!("Client not found: {}", id);
        }
        Ok(client)
    }

    pub async fn create(&self, input: NewClientInput) -> Result<Client> {
        let client = validate::new_client(input)?;
        let created = self.store.create_client(client).await?;
        info!("Created client: id={}, name={}", created.id, created.name);
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: ClientPatch) -> Result<Option<Client>> {
        let patch = validate::client_patch(patch)?;
        let updated = self.store.update_client(id, patch).await?;
        match &updated {
            Some(client) => info!("Updated client: id={}", client.id),
            None => debug!("Client not found for update: {}", id),
        }
        Ok(updated)
    }

    /// Also removes the client's cases and everything under them
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_client(id).await?;
        if deleted {
            info!("Deleted client: id={}", id);
        } else {
            debug!("Client not found for delete: {}", id);
        }
        Ok(deleted)
    }
}
