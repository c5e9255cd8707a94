//! Storage contract for items, child edges, and assignments.

use std::collections::BTreeMap;

use crate::item::{Item, ItemKind};
use crate::Result;

/// Identifier of the subject (user) being checked.
pub type SubjectId = i64;

/// Read/write contract the engine consumes persistence through.
///
/// Calls are treated as opaque synchronous operations; the engine imposes
/// no timeout or retry policy of its own. Backend failures cross the seam
/// boxed in [`Error::Store`] and are not retried. Duplicate child or
/// assignment adds are idempotent no-ops reported as `Ok(false)`. Child
/// names without a matching item are tolerated as dangling edges.
///
/// [`Error::Store`]: crate::Error::Store
pub trait ItemStore {
    /// All items, optionally restricted to one kind, ordered by name.
    fn items(&self, kind: Option<ItemKind>) -> Result<Vec<Item>>;

    /// Look up a single item by name.
    fn item(&self, name: &str) -> Result<Option<Item>>;

    /// Insert or update an item keyed by its name. Child edges are
    /// unaffected.
    fn save_item(&mut self, item: &Item) -> Result<()>;

    /// Remove an item together with its child edges (in both directions)
    /// and its assignments. Unknown names are a no-op.
    fn remove_item(&mut self, name: &str) -> Result<()>;

    /// Attach `child` under `parent`. Returns `false` if the edge already
    /// exists.
    fn add_child(&mut self, parent: &str, child: &str) -> Result<bool>;

    /// Detach `child` from `parent`. Unknown edges are a no-op.
    fn remove_child(&mut self, parent: &str, child: &str) -> Result<()>;

    /// Detach every child of `parent`.
    fn remove_children(&mut self, parent: &str) -> Result<()>;

    /// The full `name -> direct child names` edge map, used to build the
    /// hierarchy index.
    fn child_edges(&self) -> Result<BTreeMap<String, Vec<String>>>;

    /// Names directly assigned to a subject, sorted.
    fn assignments(&self, subject: SubjectId) -> Result<Vec<String>>;

    /// Assign an item to a subject. Returns `false` if already assigned.
    fn add_assignment(&mut self, subject: SubjectId, name: &str) -> Result<bool>;

    /// Revoke one assignment. Unknown pairs are a no-op.
    fn remove_assignment(&mut self, subject: SubjectId, name: &str) -> Result<()>;

    /// Revoke every assignment held by a subject.
    fn remove_assignments(&mut self, subject: SubjectId) -> Result<()>;
}
