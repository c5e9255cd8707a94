//! SQLite item store implementation.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use rbac::{Item, ItemKind, ItemStore, SubjectId};

use crate::Result;

/// SQLite-backed [`ItemStore`].
///
/// Items, child edges, and assignments each live in their own table.
/// Edges and assignments reference items by name, so removing an item
/// scrubs both tables; edges whose child has no item row are kept as
/// dangling, per the storage contract.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create an item store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory item store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rbac_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                kind TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rbac_children (
                parent TEXT NOT NULL,
                child TEXT NOT NULL,
                UNIQUE (parent, child)
            );
            CREATE TABLE IF NOT EXISTS rbac_assigns (
                user_id INTEGER NOT NULL,
                item_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, item_name)
            );
            CREATE INDEX IF NOT EXISTS idx_assigns_user
                ON rbac_assigns (user_id);
            "#,
        )?;
        Ok(())
    }

    fn query_items(&self, kind: Option<ItemKind>) -> Result<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, title, description, kind FROM rbac_items ORDER BY name",
        )?;
        let items = stmt
            .query_map([], map_item_row)?
            .filter_map(|row| row.ok().flatten())
            .filter(|item| kind.is_none_or(|k| item.kind == k))
            .collect();
        Ok(items)
    }

    fn query_item(&self, name: &str) -> Result<Option<Item>> {
        let item = self
            .conn
            .query_row(
                "SELECT id, name, title, description, kind FROM rbac_items WHERE name = ?1",
                params![name],
                map_item_row,
            )
            .optional()?;
        Ok(item.flatten())
    }

    fn upsert_item(&self, item: &Item) -> Result<()> {
        self.conn.execute(
            "INSERT INTO rbac_items (name, title, description, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (name) DO UPDATE SET
                 title = excluded.title,
                 description = excluded.description,
                 kind = excluded.kind",
            params![
                item.name,
                item.title,
                item.description,
                kind_name(item.kind),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_item(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM rbac_items WHERE name = ?1", params![name])?;
        self.conn.execute(
            "DELETE FROM rbac_children WHERE parent = ?1 OR child = ?1",
            params![name],
        )?;
        self.conn.execute(
            "DELETE FROM rbac_assigns WHERE item_name = ?1",
            params![name],
        )?;
        Ok(())
    }

    fn insert_child(&self, parent: &str, child: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM rbac_children WHERE parent = ?1 AND child = ?2)",
            params![parent, child],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(false);
        }
        self.conn.execute(
            "INSERT INTO rbac_children (parent, child) VALUES (?1, ?2)",
            params![parent, child],
        )?;
        Ok(true)
    }

    fn query_child_edges(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT parent, child FROM rbac_children ORDER BY parent, child")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let (parent, child) = row?;
            edges.entry(parent).or_default().push(child);
        }
        Ok(edges)
    }

    fn query_assignments(&self, subject: SubjectId) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_name FROM rbac_assigns WHERE user_id = ?1 ORDER BY item_name",
        )?;
        let names = stmt
            .query_map(params![subject], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn insert_assignment(&self, subject: SubjectId, name: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM rbac_assigns WHERE user_id = ?1 AND item_name = ?2)",
            params![subject, name],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(false);
        }
        self.conn.execute(
            "INSERT INTO rbac_assigns (user_id, item_name, created_at) VALUES (?1, ?2, ?3)",
            params![subject, name, Utc::now().to_rfc3339()],
        )?;
        Ok(true)
    }
}

impl ItemStore for SqliteStore {
    fn items(&self, kind: Option<ItemKind>) -> rbac::Result<Vec<Item>> {
        Ok(self.query_items(kind)?)
    }

    fn item(&self, name: &str) -> rbac::Result<Option<Item>> {
        Ok(self.query_item(name)?)
    }

    fn save_item(&mut self, item: &Item) -> rbac::Result<()> {
        Ok(self.upsert_item(item)?)
    }

    fn remove_item(&mut self, name: &str) -> rbac::Result<()> {
        Ok(self.delete_item(name)?)
    }

    fn add_child(&mut self, parent: &str, child: &str) -> rbac::Result<bool> {
        Ok(self.insert_child(parent, child)?)
    }

    fn remove_child(&mut self, parent: &str, child: &str) -> rbac::Result<()> {
        self.conn
            .execute(
                "DELETE FROM rbac_children WHERE parent = ?1 AND child = ?2",
                params![parent, child],
            )
            .map_err(crate::Error::from)?;
        Ok(())
    }

    fn remove_children(&mut self, parent: &str) -> rbac::Result<()> {
        self.conn
            .execute(
                "DELETE FROM rbac_children WHERE parent = ?1",
                params![parent],
            )
            .map_err(crate::Error::from)?;
        Ok(())
    }

    fn child_edges(&self) -> rbac::Result<BTreeMap<String, Vec<String>>> {
        Ok(self.query_child_edges()?)
    }

    fn assignments(&self, subject: SubjectId) -> rbac::Result<Vec<String>> {
        Ok(self.query_assignments(subject)?)
    }

    fn add_assignment(&mut self, subject: SubjectId, name: &str) -> rbac::Result<bool> {
        Ok(self.insert_assignment(subject, name)?)
    }

    fn remove_assignment(&mut self, subject: SubjectId, name: &str) -> rbac::Result<()> {
        self.conn
            .execute(
                "DELETE FROM rbac_assigns WHERE user_id = ?1 AND item_name = ?2",
                params![subject, name],
            )
            .map_err(crate::Error::from)?;
        Ok(())
    }

    fn remove_assignments(&mut self, subject: SubjectId) -> rbac::Result<()> {
        self.conn
            .execute(
                "DELETE FROM rbac_assigns WHERE user_id = ?1",
                params![subject],
            )
            .map_err(crate::Error::from)?;
        Ok(())
    }
}

fn kind_name(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Permission => "permission",
        ItemKind::Role => "role",
    }
}

fn kind_from_name(name: &str) -> Option<ItemKind> {
    match name {
        "permission" => Some(ItemKind::Permission),
        "role" => Some(ItemKind::Role),
        _ => None,
    }
}

/// Map an item row; rows with an unrecognized kind are dropped.
fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Option<Item>> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let title: String = row.get(2)?;
    let description: String = row.get(3)?;
    let kind: String = row.get(4)?;
    Ok(kind_from_name(&kind).map(|kind| Item {
        name,
        kind,
        title,
        description,
        id: Some(id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbac::RbacManager;

    fn seeded() -> SqliteStore {
        let mut store = SqliteStore::in_memory().unwrap();
        store.save_item(&Item::role("Admin")).unwrap();
        store.save_item(&Item::role("Manager")).unwrap();
        store
            .save_item(&Item::permission("articles.create").with_title("Create articles"))
            .unwrap();
        store.add_child("Admin", "Manager").unwrap();
        store.add_child("Manager", "articles.create").unwrap();
        store
    }

    #[test]
    fn test_items_sorted_and_filtered() {
        let store = seeded();
        let all = store.items(None).unwrap();
        let names: Vec<_> = all.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Admin", "Manager", "articles.create"]);

        let permissions = store.items(Some(ItemKind::Permission)).unwrap();
        assert_eq!(permissions.len(), 1);
        assert_eq!(permissions[0].title, "Create articles");
        assert!(permissions[0].id.is_some());
    }

    #[test]
    fn test_item_lookup() {
        let store = seeded();
        let item = store.item("Manager").unwrap().unwrap();
        assert_eq!(item.kind, ItemKind::Role);
        assert!(store.item("missing").unwrap().is_none());
    }

    #[test]
    fn test_save_updates_in_place() {
        let mut store = seeded();
        let before = store.item("Manager").unwrap().unwrap();
        store
            .save_item(&Item::role("Manager").with_title("Managers"))
            .unwrap();
        let after = store.item("Manager").unwrap().unwrap();
        assert_eq!(after.title, "Managers");
        assert_eq!(after.id, before.id);
    }

    #[test]
    fn test_duplicate_adds_return_false() {
        let mut store = seeded();
        assert!(!store.add_child("Admin", "Manager").unwrap());
        assert!(store.add_assignment(1, "Admin").unwrap());
        assert!(!store.add_assignment(1, "Admin").unwrap());
    }

    #[test]
    fn test_remove_item_scrubs_edges_and_assignments() {
        let mut store = seeded();
        store.add_assignment(1, "Manager").unwrap();

        store.remove_item("Manager").unwrap();

        assert!(store.item("Manager").unwrap().is_none());
        let edges = store.child_edges().unwrap();
        assert!(!edges.contains_key("Manager"));
        assert!(!edges.get("Admin").is_some_and(|kids| kids.iter().any(|c| c == "Manager")));
        assert!(store.assignments(1).unwrap().is_empty());
    }

    #[test]
    fn test_child_edges_shape() {
        let store = seeded();
        let edges = store.child_edges().unwrap();
        assert_eq!(edges["Admin"], ["Manager"]);
        assert_eq!(edges["Manager"], ["articles.create"]);
    }

    #[test]
    fn test_assignment_lifecycle() {
        let mut store = seeded();
        store.add_assignment(2, "Manager").unwrap();
        store.add_assignment(2, "Admin").unwrap();
        assert_eq!(store.assignments(2).unwrap(), ["Admin", "Manager"]);

        store.remove_assignment(2, "Admin").unwrap();
        assert_eq!(store.assignments(2).unwrap(), ["Manager"]);

        store.remove_assignments(2).unwrap();
        assert!(store.assignments(2).unwrap().is_empty());
    }

    #[test]
    fn test_checks_through_manager() {
        let mut manager = RbacManager::new(seeded());
        manager.assign(2, "Manager").unwrap();

        assert!(manager.has(&["articles.create"], Some(2)).unwrap());
        assert!(!manager.has(&["Admin"], Some(2)).unwrap());

        manager.revoke_all(2).unwrap();
        assert!(!manager.has(&["articles.create"], Some(2)).unwrap());
    }
}
