use super::{newest_first, MemoryStore};
use crate::storage::{new_id, now};
use async_trait::async_trait;
use casebook_core::ports::CaseStore;
use casebook_core::{BusinessCase, CasePatch, CasebookError, NewCase, Patch, Result, Tag};
use chrono::{DateTime, Utc};

impl MemoryStore {
    fn require_client(&self, client_id: &str) -> Result<()> {
        if self.clients.contains_key(client_id) {
            Ok(())
        } else {
            Err(CasebookError::Integrity(
                "client_id does not reference an existing client".to_string(),
            ))
        }
    }

    /// Fill in the client name and the sorted tag names
    fn enrich(&self, mut case: BusinessCase) -> BusinessCase {
        case.client_name = self
            .clients
            .get(&case.client_id)
            .map(|entry| entry.record.name.clone());
        let mut tags: Vec<String> = self
            .case_tags
            .iter()
            .filter(|link| link.0 == case.id)
            .filter_map(|link| self.tags.get(&link.1).map(|tag| tag.name.clone()))
            .collect();
        tags.sort();
        case.tags = tags;
        case
    }

    /// Reuse the registry entry for `name` or register a new one
    fn upsert_tag(&self, name: &str, stamp: DateTime<Utc>) -> String {
        self.tag_names
            .entry(name.to_string())
            .or_insert_with(|| {
                let tag = Tag {
                    id: new_id(),
                    name: name.to_string(),
                    created_at: stamp,
                    updated_at: stamp,
                };
                let id = tag.id.clone();
                self.tags.insert(id.clone(), tag);
                id
            })
            .clone()
    }

    fn replace_tags(&self, case_id: &str, tags: &[String], stamp: DateTime<Utc>) {
        self.case_tags.retain(|(linked_case, _)| linked_case != case_id);
        for name in tags {
            let tag_id = self.upsert_tag(name, stamp);
            self.case_tags.insert((case_id.to_string(), tag_id));
        }
    }

    fn insert_case(&self, case: NewCase) -> Result<BusinessCase> {
        let _guard = self.write_guard();
        self.require_client(&case.client_id)?;

        let stamp = now();
        let created = BusinessCase {
            id: new_id(),
            client_id: case.client_id,
            client_name: None,
            title: case.title,
            description: case.description,
            status: case.status,
            category: case.category,
            time_basis: case.time_basis,
            duration_value: case.duration_value,
            duration_unit: case.duration_unit,
            currency_code: case.currency_code,
            tags: Vec::new(),
            created_at: stamp,
            updated_at: stamp,
        };
        self.replace_tags(&created.id, &case.tags, stamp);
        self.cases
            .insert(created.id.clone(), self.stored(created.clone()));
        Ok(self.enrich(created))
    }

    fn patch_case(&self, id: &str, patch: CasePatch) -> Result<Option<BusinessCase>> {
        let _guard = self.write_guard();
        let Some(mut current) = self.cases.get(id).map(|entry| entry.record.clone()) else {
            return Ok(None);
        };
        if let Patch::Set(client_id) = &patch.client_id {
            self.require_client(client_id)?;
        }

        let stamp = now();
        if let Patch::Set(tags) = patch.apply_columns(&mut current) {
            self.replace_tags(id, &tags, stamp);
        }
        current.updated_at = stamp;

        if let Some(mut entry) = self.cases.get_mut(id) {
            entry.record = current.clone();
        }
        Ok(Some(self.enrich(current)))
    }

    fn remove_case(&self, id: &str) -> bool {
        let _guard = self.write_guard();
        self.purge_case(id)
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn list_cases(&self, client_id: Option<&str>) -> Result<Vec<BusinessCase>> {
        let cases = newest_first(&self.cases, |case| {
            client_id.map_or(true, |wanted| case.client_id == wanted)
        });
        Ok(cases.into_iter().map(|case| self.enrich(case)).collect())
    }

    async fn get_case(&self, id: &str) -> Result<Option<BusinessCase>> {
        let case = self.cases.get(id).map(|entry| entry.record.clone());
        Ok(case.map(|case| self.enrich(case)))
    }

    async fn create_case(&self, case: NewCase) -> Result<BusinessCase> {
        self.insert_case(case)
    }

    async fn update_case(&self, id: &str, patch: CasePatch) -> Result<Option<BusinessCase>> {
        if patch.is_empty() {
            return self.get_case(id).await;
        }
        self.patch_case(id, patch)
    }

    async fn delete_case(&self, id: &str) -> Result<bool> {
        Ok(self.remove_case(id))
    }
}
