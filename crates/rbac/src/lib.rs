//! Role/permission authorization engine.
//!
//! Items (permissions and roles) form a directed acyclic graph through
//! "children" edges. A role grants everything in its descendant closure,
//! so checking a permission succeeds when the permission itself, or any
//! role that transitively contains it, is directly assigned to the
//! subject. Unknown names and unresolvable subjects are denials, never
//! errors.
//!
//! # Core Concepts
//!
//! - [`Item`] / [`ItemKind`] — a named permission or role. The child-edge
//!   value `*` ([`WILDCARD`]) means "applies to everything" and is never
//!   an item.
//! - [`ItemStore`] — the narrow read/write contract persistence backends
//!   implement. [`MemoryStore`] is the in-crate reference backend.
//! - [`HierarchyIndex`] — memoized descendant/ancestor closures over the
//!   raw edge map.
//! - [`AccessChecker`] — per-context evaluation with assignment and
//!   decision memoization; [`CachingChecker`] layers a shared TTL cache
//!   across contexts.
//! - [`RbacManager`] — facade tying a store and a checker together, with
//!   mutation entry points that keep derived state consistent.
//!
//! # Example
//!
//! ```
//! use rbac::{Item, MemoryStore, RbacManager};
//!
//! let mut manager = RbacManager::new(MemoryStore::new());
//! manager.save(&Item::role("Manager"))?;
//! manager.save(&Item::permission("articles.create"))?;
//! manager.attach("Manager", "articles.create")?;
//! manager.assign(2, "Manager")?;
//!
//! assert!(manager.has(&["articles.create"], Some(2))?);
//! assert!(!manager.has(&["Admin"], Some(2))?);
//! # Ok::<(), rbac::Error>(())
//! ```

mod cache;
mod checker;
mod config;
mod error;
mod hierarchy;
mod item;
mod manager;
mod memory;
mod store;

pub use cache::{CachingChecker, DecisionCache};
pub use checker::{AccessChecker, SubjectSource};
pub use config::RbacConfig;
pub use error::{Error, Result};
pub use hierarchy::HierarchyIndex;
pub use item::{Item, ItemKind, RawItem, WILDCARD};
pub use manager::RbacManager;
pub use memory::MemoryStore;
pub use store::{ItemStore, SubjectId};
