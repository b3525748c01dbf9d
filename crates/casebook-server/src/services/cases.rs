//! Business case service

use casebook_core::ports::EntityStore;
use casebook_core::{validate, BusinessCase, CaseUpdateInput, NewCaseInput, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CaseService {
    store: Arc<dyn EntityStore>,
}

impl CaseService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, client_id: Option<&str>) -> Result<Vec<BusinessCase>> {
        let cases = self.store.list_cases(client_id).await?;
        debug!("Listed {} cases (client filter: {:?})", cases.len(), client_id);
        Ok(cases)
    }

    pub async fn get(&self, id: &str) -> Result<Option<BusinessCase>> {
        let case = self.store.get_case(id).await?;
        if case.is_none() {
            debug!("Case not found: {}", id);
        }
        Ok(case)
    }

    pub async fn create(&self, input: NewCaseInput) -> Result<BusinessCase> {
        let case = validate::new_case(input)?;
        let created = self.store.create_case(case).await?;
        info!(
            "Created case: id={}, client={}, status={}, tags={}",
            created.id,
            created.client_id,
            created.status,
            created.tags.len()
        );
        Ok(created)
    }

    /// A set `tags` replaces every link of the case; an empty list clears them
    pub async fn update(&self, id: &str, input: CaseUpdateInput) -> Result<Option<BusinessCase>> {
        let patch = validate::case_patch(input)?;
        let updated = self.store.update_case(id, patch).await?;
        match &updated {
            Some(case) => info!("Updated case: id={}, status={}", case.id, case.status),
            None => debug!("Case not found for update: {}", id),
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_case(id).await?;
        if deleted {
            info!("Deleted case: id={}", id);
        } else {
            debug!("Case not found for delete: {}", id);
        }
        Ok(deleted)
    }
}
