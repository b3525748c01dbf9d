//! Port traits (interfaces) for dependency injection

pub mod storage;

pub use storage::{Backend, CaseStore, ClientStore, EntityStore, ItemStore, TimingStore};
