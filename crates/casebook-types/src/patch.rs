//! Partial update fields
//!
//! A `Patch<T>` distinguishes "field not supplied" from "field supplied".
//! For nullable columns use `Patch<Option<T>>`: a JSON `null` becomes
//! `Set(None)` and clears the value, while an absent key stays `Unchanged`.
//! Struct fields must carry `#[serde(default)]` for the absent case.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unchanged,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unchanged
    }
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Unchanged => None,
        }
    }

    /// Value after the patch is applied on top of `current`.
    pub fn resolve<'a>(&'a self, current: &'a T) -> &'a T {
        self.as_set().unwrap_or(current)
    }

    /// Write the new value into `target`. Returns whether anything was written.
    pub fn apply(self, target: &mut T) -> bool {
        match self {
            Patch::Set(value) => {
                *target = value;
                true
            }
            Patch::Unchanged => false,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Set(value) => Patch::Set(f(value)),
            Patch::Unchanged => Patch::Unchanged,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        match self {
            Patch::Set(value) => f(value).map(Patch::Set),
            Patch::Unchanged => Ok(Patch::Unchanged),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the key is present; absent keys use Default
        T::deserialize(deserializer).map(Patch::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Probe {
        name: Patch<String>,
        notes: Patch<Option<String>>,
    }

    #[test]
    fn test_absent_null_and_value() {
        let probe: Probe = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(probe.name, Patch::Unchanged);
        assert_eq!(probe.notes, Patch::Set(None));

        let probe: Probe = serde_json::from_str(r#"{"name": "Acme", "notes": "vip"}"#).unwrap();
        assert_eq!(probe.name, Patch::Set("Acme".to_string()));
        assert_eq!(probe.notes, Patch::Set(Some("vip".to_string())));
    }

    #[test]
    fn test_null_rejected_for_required_field() {
        let result: Result<Probe, _> = serde_json::from_str(r#"{"name": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_and_resolve() {
        let mut current = "old".to_string();
        assert!(!Patch::<String>::Unchanged.apply(&mut current));
        assert_eq!(current, "old");

        let patch = Patch::Set("new".to_string());
        assert_eq!(patch.resolve(&current), "new");
        assert!(patch.apply(&mut current));
        assert_eq!(current, "new");
    }
}
