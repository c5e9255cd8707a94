//! Flat-file item store backed by a pair of TOML documents.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use rbac::{Item, ItemKind, ItemStore, RawItem, SubjectId};

use crate::{Error, Result};

/// TOML-file-backed [`ItemStore`].
///
/// Items (with their child lists) live in one document, assignments in
/// another:
///
/// ```toml
/// # items.toml
/// [Manager]
/// kind = "role"
/// children = ["articles.create"]
///
/// ["articles.create"]
/// kind = "permission"
/// ```
///
/// ```toml
/// # assigns.toml
/// 2 = ["Manager"]
/// ```
///
/// Documents are loaded lazily and cached; every mutation rewrites the
/// affected document wholesale and drops the cache. Missing files read as
/// empty. Unlike the SQLite backend, the item document is also the edge
/// set, so attaching a child requires the parent to exist.
pub struct FileStore {
    items_path: PathBuf,
    assigns_path: PathBuf,
    items: RefCell<Option<BTreeMap<String, RawItem>>>,
    assigns: RefCell<Option<BTreeMap<SubjectId, Vec<String>>>>,
}

impl FileStore {
    pub fn new(items_path: impl Into<PathBuf>, assigns_path: impl Into<PathBuf>) -> Self {
        Self {
            items_path: items_path.into(),
            assigns_path: assigns_path.into(),
            items: RefCell::new(None),
            assigns: RefCell::new(None),
        }
    }

    /// Create empty documents for any file that does not exist yet.
    pub fn init(&self) -> Result<()> {
        if !self.items_path.exists() {
            write_doc(&self.items_path, &BTreeMap::<String, RawItem>::new())?;
        }
        if !self.assigns_path.exists() {
            write_doc(&self.assigns_path, &BTreeMap::<String, Vec<String>>::new())?;
        }
        Ok(())
    }

    fn load_items(&self) -> Result<BTreeMap<String, RawItem>> {
        if let Some(items) = self.items.borrow().as_ref() {
            return Ok(items.clone());
        }
        let loaded: BTreeMap<String, RawItem> = read_doc(&self.items_path)?;
        *self.items.borrow_mut() = Some(loaded.clone());
        Ok(loaded)
    }

    fn load_assigns(&self) -> Result<BTreeMap<SubjectId, Vec<String>>> {
        if let Some(assigns) = self.assigns.borrow().as_ref() {
            return Ok(assigns.clone());
        }
        let raw: BTreeMap<String, Vec<String>> = read_doc(&self.assigns_path)?;
        let mut parsed = BTreeMap::new();
        for (key, names) in raw {
            let subject: SubjectId = key
                .parse()
                .map_err(|_| Error::Parse(format!("invalid subject id key: {key}")))?;
            parsed.insert(subject, names);
        }
        *self.assigns.borrow_mut() = Some(parsed.clone());
        Ok(parsed)
    }

    fn store_items(&self, items: &BTreeMap<String, RawItem>) -> Result<()> {
        write_doc(&self.items_path, items)?;
        self.reset();
        Ok(())
    }

    fn store_assigns(&self, assigns: &BTreeMap<SubjectId, Vec<String>>) -> Result<()> {
        let raw: BTreeMap<String, Vec<String>> = assigns
            .iter()
            .map(|(subject, names)| (subject.to_string(), names.clone()))
            .collect();
        write_doc(&self.assigns_path, &raw)?;
        self.reset();
        Ok(())
    }

    fn reset(&self) {
        *self.items.borrow_mut() = None;
        *self.assigns.borrow_mut() = None;
    }
}

impl ItemStore for FileStore {
    fn items(&self, kind: Option<ItemKind>) -> rbac::Result<Vec<Item>> {
        let items = self.load_items()?;
        Ok(items
            .into_iter()
            .filter(|(_, raw)| kind.is_none_or(|k| raw.kind == k))
            .map(|(name, raw)| raw.into_item(name))
            .collect())
    }

    fn item(&self, name: &str) -> rbac::Result<Option<Item>> {
        let items = self.load_items()?;
        Ok(items.get(name).cloned().map(|raw| raw.into_item(name)))
    }

    fn save_item(&mut self, item: &Item) -> rbac::Result<()> {
        let mut items = self.load_items()?;
        let children = items
            .get(&item.name)
            .map(|raw| raw.children.clone())
            .unwrap_or_default();
        items.insert(item.name.clone(), RawItem::from_item(item, children));
        self.store_items(&items)?;
        Ok(())
    }

    fn remove_item(&mut self, name: &str) -> rbac::Result<()> {
        let mut items = self.load_items()?;
        let mut assigns = self.load_assigns()?;

        items.remove(name);
        for raw in items.values_mut() {
            raw.children.retain(|child| child != name);
        }
        for names in assigns.values_mut() {
            names.retain(|assigned| assigned != name);
        }

        self.store_items(&items)?;
        self.store_assigns(&assigns)?;
        Ok(())
    }

    fn add_child(&mut self, parent: &str, child: &str) -> rbac::Result<bool> {
        let mut items = self.load_items()?;
        let Some(raw) = items.get_mut(parent) else {
            return Err(rbac::Error::UnknownItem(parent.to_string()));
        };
        if raw.children.iter().any(|c| c == child) {
            return Ok(false);
        }
        raw.children.push(child.to_string());
        raw.children.sort();
        self.store_items(&items)?;
        Ok(true)
    }

    fn remove_child(&mut self, parent: &str, child: &str) -> rbac::Result<()> {
        let mut items = self.load_items()?;
        if let Some(raw) = items.get_mut(parent) {
            let before = raw.children.len();
            raw.children.retain(|c| c != child);
            if raw.children.len() != before {
                self.store_items(&items)?;
            }
        }
        Ok(())
    }

    fn remove_children(&mut self, parent: &str) -> rbac::Result<()> {
        let mut items = self.load_items()?;
        if let Some(raw) = items.get_mut(parent) {
            if !raw.children.is_empty() {
                raw.children.clear();
                self.store_items(&items)?;
            }
        }
        Ok(())
    }

    fn child_edges(&self) -> rbac::Result<BTreeMap<String, Vec<String>>> {
        let items = self.load_items()?;
        Ok(items
            .into_iter()
            .map(|(name, raw)| (name, raw.children))
            .collect())
    }

    fn assignments(&self, subject: SubjectId) -> rbac::Result<Vec<String>> {
        let assigns = self.load_assigns()?;
        let mut names = assigns.get(&subject).cloned().unwrap_or_default();
        names.sort();
        Ok(names)
    }

    fn add_assignment(&mut self, subject: SubjectId, name: &str) -> rbac::Result<bool> {
        let mut assigns = self.load_assigns()?;
        let names = assigns.entry(subject).or_default();
        if names.iter().any(|n| n == name) {
            return Ok(false);
        }
        names.push(name.to_string());
        names.sort();
        self.store_assigns(&assigns)?;
        Ok(true)
    }

    fn remove_assignment(&mut self, subject: SubjectId, name: &str) -> rbac::Result<()> {
        let mut assigns = self.load_assigns()?;
        if let Some(names) = assigns.get_mut(&subject) {
            let before = names.len();
            names.retain(|n| n != name);
            if names.len() != before {
                self.store_assigns(&assigns)?;
            }
        }
        Ok(())
    }

    fn remove_assignments(&mut self, subject: SubjectId) -> rbac::Result<()> {
        let mut assigns = self.load_assigns()?;
        if assigns.remove(&subject).is_some() {
            self.store_assigns(&assigns)?;
        }
        Ok(())
    }
}

fn read_doc<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Parse(e.to_string()))
}

fn write_doc<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = toml::to_string_pretty(value).map_err(|e| Error::Serialize(e.to_string()))?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbac::RbacManager;
    use tempfile::TempDir;

    fn empty_store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("items.toml"), dir.path().join("assigns.toml"));
        (dir, store)
    }

    fn seeded() -> (TempDir, FileStore) {
        let (dir, mut store) = empty_store();
        store.save_item(&Item::role("Admin")).unwrap();
        store.save_item(&Item::role("Manager")).unwrap();
        store.save_item(&Item::permission("articles.create")).unwrap();
        store.add_child("Admin", "Manager").unwrap();
        store.add_child("Manager", "articles.create").unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let (_dir, store) = empty_store();
        assert!(store.items(None).unwrap().is_empty());
        assert!(store.assignments(1).unwrap().is_empty());
        assert!(store.child_edges().unwrap().is_empty());
    }

    #[test]
    fn test_init_creates_documents() {
        let (dir, store) = empty_store();
        store.init().unwrap();
        assert!(dir.path().join("items.toml").exists());
        assert!(dir.path().join("assigns.toml").exists());
    }

    #[test]
    fn test_save_preserves_children() {
        let (_dir, mut store) = seeded();
        store
            .save_item(&Item::role("Manager").with_title("Managers"))
            .unwrap();
        let edges = store.child_edges().unwrap();
        assert_eq!(edges["Manager"], ["articles.create"]);
        assert_eq!(store.item("Manager").unwrap().unwrap().title, "Managers");
    }

    #[test]
    fn test_add_child_requires_parent() {
        let (_dir, mut store) = seeded();
        assert!(matches!(
            store.add_child("ghost", "Manager"),
            Err(rbac::Error::UnknownItem(_))
        ));
        assert!(!store.add_child("Admin", "Manager").unwrap());
    }

    #[test]
    fn test_state_survives_reopen() {
        let (dir, mut store) = seeded();
        store.add_assignment(2, "Manager").unwrap();
        drop(store);

        let reopened = FileStore::new(
            dir.path().join("items.toml"),
            dir.path().join("assigns.toml"),
        );
        assert_eq!(reopened.assignments(2).unwrap(), ["Manager"]);
        assert_eq!(reopened.items(None).unwrap().len(), 3);
        assert_eq!(reopened.child_edges().unwrap()["Admin"], ["Manager"]);
    }

    #[test]
    fn test_remove_item_scrubs_documents() {
        let (_dir, mut store) = seeded();
        store.add_assignment(2, "Manager").unwrap();
        store.remove_item("Manager").unwrap();

        assert!(store.item("Manager").unwrap().is_none());
        assert!(store.child_edges().unwrap()["Admin"].is_empty());
        assert!(store.assignments(2).unwrap().is_empty());
    }

    #[test]
    fn test_wildcard_child_round_trips() {
        let (_dir, mut store) = seeded();
        store.add_child("Admin", "*").unwrap();
        let edges = store.child_edges().unwrap();
        assert_eq!(edges["Admin"], ["*", "Manager"]);
    }

    #[test]
    fn test_invalid_subject_key_is_parse_error() {
        let (dir, store) = empty_store();
        std::fs::write(dir.path().join("assigns.toml"), "abc = [\"Manager\"]\n").unwrap();
        assert!(store.assignments(1).is_err());
    }

    #[test]
    fn test_checks_through_manager() {
        let (_dir, store) = seeded();
        let mut manager = RbacManager::new(store);
        manager.assign(2, "Manager").unwrap();

        assert!(manager.has(&["articles.create"], Some(2)).unwrap());
        assert!(!manager.has(&["Admin"], Some(2)).unwrap());
    }
}
