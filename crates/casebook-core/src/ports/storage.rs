//! Storage traits for persistence
//!
//! Implemented by the relational backend and the in-memory backend with
//! identical contracts. Inputs reaching these traits are already validated;
//! the store is responsible for identifiers, timestamps, referential
//! integrity, cascades and atomicity.
//!
//! Lists are ordered most-recently-created first.

use crate::Result;
use async_trait::async_trait;
use casebook_types::{
    BusinessCase, CasePatch, Client, ClientPatch, ItemKind, LineItem, LineItemPatch, NewCase,
    NewClient, NewLineItem, NewTiming, Timing, TimingPatch,
};

/// Which backend a store is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Relational,
    InMemory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Relational => write!(f, "relational"),
            Backend::InMemory => write!(f, "in-memory"),
        }
    }
}

/// Client store. Deleting a client removes its cases and everything below.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<Client>>;
    async fn get_client(&self, id: &str) -> Result<Option<Client>>;
    async fn create_client(&self, client: NewClient) -> Result<Client>;
    async fn update_client(&self, id: &str, patch: ClientPatch) -> Result<Option<Client>>;
    async fn delete_client(&self, id: &str) -> Result<bool>;
}

/// Business case store, including the case-tag relation
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn list_cases(&self, client_id: Option<&str>) -> Result<Vec<BusinessCase>>;
    async fn get_case(&self, id: &str) -> Result<Option<BusinessCase>>;
    async fn create_case(&self, case: NewCase) -> Result<BusinessCase>;
    async fn update_case(&self, id: &str, patch: CasePatch) -> Result<Option<BusinessCase>>;
    async fn delete_case(&self, id: &str) -> Result<bool>;
}

/// Cost and revenue item store
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list_items(&self, kind: ItemKind, case_id: Option<&str>) -> Result<Vec<LineItem>>;
    async fn get_item(&self, kind: ItemKind, id: &str) -> Result<Option<LineItem>>;
    async fn create_item(&self, kind: ItemKind, item: NewLineItem) -> Result<LineItem>;
    async fn update_item(
        &self,
        kind: ItemKind,
        id: &str,
        patch: LineItemPatch,
    ) -> Result<Option<LineItem>>;
    async fn delete_item(&self, kind: ItemKind, id: &str) -> Result<bool>;
}

/// Cost and revenue timing store.
///
/// `update_timing` must reject a result whose start date falls after its
/// end date, judged on the merged record.
#[async_trait]
pub trait TimingStore: Send + Sync {
    async fn list_timing(&self, kind: ItemKind, item_id: Option<&str>) -> Result<Vec<Timing>>;
    async fn get_timing(&self, kind: ItemKind, id: &str) -> Result<Option<Timing>>;
    async fn create_timing(&self, kind: ItemKind, timing: NewTiming) -> Result<Timing>;
    async fn update_timing(
        &self,
        kind: ItemKind,
        id: &str,
        patch: TimingPatch,
    ) -> Result<Option<Timing>>;
    async fn delete_timing(&self, kind: ItemKind, id: &str) -> Result<bool>;
}

/// Everything a backend must provide
#[async_trait]
pub trait EntityStore: ClientStore + CaseStore + ItemStore + TimingStore {
    fn backend(&self) -> Backend;

    /// Whether a database answered. Always false for the in-memory backend.
    async fn ping(&self) -> Result<bool>;
}
