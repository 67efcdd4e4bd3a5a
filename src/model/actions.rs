//! Allowable actions reported for an object.

use std::collections::HashMap;

use super::extension::ExtensionBlob;

/// Action name → permitted flag, as reported by the repository for the
/// current caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowableActions {
    actions: HashMap<String, bool>,
    /// Id of the object these actions belong to. A reference, not ownership.
    pub object_id: Option<String>,
    pub extensions: ExtensionBlob,
}

impl AllowableActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, action: impl Into<String>, allowed: bool) {
        self.actions.insert(action.into(), allowed);
    }

    /// Reported flag for `action`, `None` when the repository did not mention it.
    pub fn get(&self, action: &str) -> Option<bool> {
        self.actions.get(action).copied()
    }

    /// Whether `action` is explicitly allowed.
    pub fn is_allowed(&self, action: &str) -> bool {
        self.get(action).unwrap_or(false)
    }

    pub fn actions(&self) -> &HashMap<String, bool> {
        &self.actions
    }

    /// Names of all allowed actions.
    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(name, _)| name.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
