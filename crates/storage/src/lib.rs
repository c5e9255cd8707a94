//! Persistence backends for the RBAC engine.
//!
//! This crate provides the concrete [`ItemStore`] implementations the
//! engine consumes through its storage contract: items, their child
//! edges, and subject assignments.
//!
//! # Backends
//!
//! ## SqliteStore
//!
//! [`SqliteStore`] keeps everything in a single SQLite database with one
//! table per concern (`rbac_items`, `rbac_children`, `rbac_assigns`).
//! This is the default backend: concurrent-reader friendly, durable, and
//! queryable with ordinary SQL.
//!
//! ## FileStore
//!
//! [`FileStore`] keeps items and assignments in a pair of TOML documents
//! that can be reviewed and edited by hand, trading write throughput for
//! transparency. Mutations rewrite the affected document wholesale.
//!
//! Both backends implement the same contract and pass the same behavioral
//! tests; which one to use is a deployment decision.
//!
//! # Example
//!
//! ```no_run
//! use rbac::{Item, ItemStore};
//! use storage::SqliteStore;
//!
//! let mut store = SqliteStore::open("warden.db")?;
//! store.save_item(&Item::role("Manager"))?;
//! store.add_assignment(2, "Manager")?;
//! # Ok::<(), rbac::Error>(())
//! ```
//!
//! [`ItemStore`]: rbac::ItemStore

mod error;
mod file;
mod sqlite;

pub use error::{Error, Result};
pub use file::FileStore;
pub use sqlite::SqliteStore;
