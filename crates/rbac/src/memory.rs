//! In-memory store.

use std::collections::BTreeMap;

use crate::item::{Item, ItemKind};
use crate::store::{ItemStore, SubjectId};
use crate::Result;

/// BTreeMap-backed [`ItemStore`].
///
/// The reference implementation of the storage contract: everything is
/// kept sorted, so reads are deterministic. Useful for tests and for
/// hosts that load their item graph at startup.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, Item>,
    children: BTreeMap<String, Vec<String>>,
    assignments: BTreeMap<SubjectId, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemStore for MemoryStore {
    fn items(&self, kind: Option<ItemKind>) -> Result<Vec<Item>> {
        Ok(self
            .items
            .values()
            .filter(|item| kind.map_or(true, |k| item.kind == k))
            .cloned()
            .collect())
    }

    fn item(&self, name: &str) -> Result<Option<Item>> {
        Ok(self.items.get(name).cloned())
    }

    fn save_item(&mut self, item: &Item) -> Result<()> {
        self.items.insert(item.name.clone(), item.clone());
        Ok(())
    }

    fn remove_item(&mut self, name: &str) -> Result<()> {
        self.items.remove(name);
        self.children.remove(name);
        for kids in self.children.values_mut() {
            kids.retain(|child| child != name);
        }
        for assigned in self.assignments.values_mut() {
            assigned.retain(|assigned_name| assigned_name != name);
        }
        Ok(())
    }

    fn add_child(&mut self, parent: &str, child: &str) -> Result<bool> {
        let kids = self.children.entry(parent.to_string()).or_default();
        if kids.iter().any(|c| c == child) {
            return Ok(false);
        }
        kids.push(child.to_string());
        kids.sort();
        Ok(true)
    }

    fn remove_child(&mut self, parent: &str, child: &str) -> Result<()> {
        if let Some(kids) = self.children.get_mut(parent) {
            kids.retain(|c| c != child);
        }
        Ok(())
    }

    fn remove_children(&mut self, parent: &str) -> Result<()> {
        self.children.remove(parent);
        Ok(())
    }

    fn child_edges(&self) -> Result<BTreeMap<String, Vec<String>>> {
        Ok(self.children.clone())
    }

    fn assignments(&self, subject: SubjectId) -> Result<Vec<String>> {
        Ok(self.assignments.get(&subject).cloned().unwrap_or_default())
    }

    fn add_assignment(&mut self, subject: SubjectId, name: &str) -> Result<bool> {
        let assigned = self.assignments.entry(subject).or_default();
        if assigned.iter().any(|a| a == name) {
            return Ok(false);
        }
        assigned.push(name.to_string());
        assigned.sort();
        Ok(true)
    }

    fn remove_assignment(&mut self, subject: SubjectId, name: &str) -> Result<()> {
        if let Some(assigned) = self.assignments.get_mut(&subject) {
            assigned.retain(|a| a != name);
        }
        Ok(())
    }

    fn remove_assignments(&mut self, subject: SubjectId) -> Result<()> {
        self.assignments.remove(&subject);
        Ok(())
    }
}
