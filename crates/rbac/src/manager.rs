//! High-level facade over a store and a checker.

use std::time::Duration;

use crate::cache::CachingChecker;
use crate::checker::AccessChecker;
use crate::config::RbacConfig;
use crate::item::{Item, ItemKind, WILDCARD};
use crate::store::{ItemStore, SubjectId};
use crate::{Error, Result};

/// Owns a store and a checker and keeps them consistent.
///
/// Queries go through the checker; mutations go to the store and discard
/// the checker's derived state before the next query, so facade users
/// always see live answers. The shared decision cache (when enabled) is
/// deliberately not flushed on mutation; it expires by TTL.
pub struct RbacManager<S: ItemStore> {
    store: S,
    checker: CachingChecker,
    admin_roles: Vec<String>,
}

impl<S: ItemStore> RbacManager<S> {
    /// Manager with caching disabled and no admin bypass.
    pub fn new(store: S) -> Self {
        Self {
            store,
            checker: CachingChecker::new(AccessChecker::new(), false, Duration::ZERO),
            admin_roles: Vec::new(),
        }
    }

    /// Manager configured from [`RbacConfig`]: cache settings and admin
    /// bypass roles.
    pub fn from_config(store: S, config: &RbacConfig) -> Self {
        Self {
            store,
            checker: CachingChecker::from_config(AccessChecker::new(), config),
            admin_roles: config.admin_roles.clone(),
        }
    }

    /// Replace the checker, e.g. to wire in a subject source or share a
    /// decision cache across managers.
    pub fn with_checker(mut self, checker: CachingChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Enable blanket bypass for subjects holding any of `roles`.
    ///
    /// Bypass is an explicit policy layer: it is never active unless
    /// configured here or via [`from_config`].
    ///
    /// [`from_config`]: RbacManager::from_config
    pub fn with_admin_roles(mut self, roles: Vec<String>) -> Self {
        self.admin_roles = roles;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// True if the subject holds at least one of `names` (or any
    /// configured admin role).
    pub fn has(&mut self, names: &[&str], subject: Option<SubjectId>) -> Result<bool> {
        if !self.admin_roles.is_empty() {
            let admin: Vec<&str> = self.admin_roles.iter().map(String::as_str).collect();
            if self.checker.has(&self.store, &admin, subject)? {
                return Ok(true);
            }
        }
        self.checker.has(&self.store, names, subject)
    }

    /// True if the subject holds none of `names`.
    pub fn has_none(&mut self, names: &[&str], subject: Option<SubjectId>) -> Result<bool> {
        Ok(!self.has(names, subject)?)
    }

    /// Get an item by name.
    pub fn item(&self, name: &str) -> Result<Option<Item>> {
        self.store.item(name)
    }

    /// Get a permission by name.
    pub fn permission(&self, name: &str) -> Result<Option<Item>> {
        Ok(self
            .store
            .item(name)?
            .filter(|item| item.kind == ItemKind::Permission))
    }

    /// Get a role by name.
    pub fn role(&self, name: &str) -> Result<Option<Item>> {
        Ok(self
            .store
            .item(name)?
            .filter(|item| item.kind == ItemKind::Role))
    }

    /// All items, optionally restricted to one kind.
    pub fn items(&self, kind: Option<ItemKind>) -> Result<Vec<Item>> {
        self.store.items(kind)
    }

    /// Create or update an item.
    pub fn save(&mut self, item: &Item) -> Result<()> {
        self.store.save_item(item)?;
        self.invalidate();
        Ok(())
    }

    /// Remove an item with its edges and assignments. Unknown names are a
    /// no-op.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.store.remove_item(name)?;
        self.invalidate();
        Ok(())
    }

    /// Attach `child` under `parent`. Both must exist, except the wildcard
    /// sentinel which is attachable without being an item. Returns `false`
    /// if the edge already exists.
    pub fn attach(&mut self, parent: &str, child: &str) -> Result<bool> {
        self.require_item(parent)?;
        if child != WILDCARD {
            self.require_item(child)?;
        }
        let added = self.store.add_child(parent, child)?;
        self.invalidate();
        Ok(added)
    }

    /// Detach `child` from `parent`.
    pub fn detach(&mut self, parent: &str, child: &str) -> Result<()> {
        self.store.remove_child(parent, child)?;
        self.invalidate();
        Ok(())
    }

    /// Detach every child of `parent`.
    pub fn detach_all(&mut self, parent: &str) -> Result<()> {
        self.store.remove_children(parent)?;
        self.invalidate();
        Ok(())
    }

    /// Assign an item to a subject. Returns `false` if already assigned.
    pub fn assign(&mut self, subject: SubjectId, name: &str) -> Result<bool> {
        self.require_item(name)?;
        let added = self.store.add_assignment(subject, name)?;
        self.checker.reset();
        Ok(added)
    }

    /// Revoke one assignment from a subject.
    pub fn revoke(&mut self, subject: SubjectId, name: &str) -> Result<()> {
        self.store.remove_assignment(subject, name)?;
        self.checker.reset();
        Ok(())
    }

    /// Revoke every assignment held by a subject.
    pub fn revoke_all(&mut self, subject: SubjectId) -> Result<()> {
        self.store.remove_assignments(subject)?;
        self.checker.reset();
        Ok(())
    }

    fn require_item(&self, name: &str) -> Result<()> {
        match self.store.item(name)? {
            Some(_) => Ok(()),
            None => Err(Error::UnknownItem(name.to_string())),
        }
    }

    fn invalidate(&mut self) {
        self.checker.invalidate_items();
        self.checker.reset();
    }
}
