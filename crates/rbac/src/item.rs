//! Item model: named permissions and roles.

use serde::{Deserialize, Serialize};

/// Reserved child-edge value meaning "applies to everything".
///
/// The wildcard may appear in a child list but is never an [`Item`]: it is
/// excluded from closure expansion and never surfaces in query results.
pub const WILDCARD: &str = "*";

/// The two kinds of grantable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Permission,
    Role,
}

/// A named permission or role.
///
/// The name is the stable identity. `id` is only meaningful to a
/// persistence backend (e.g. a SQLite row id); memory and file backends
/// leave it unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl Item {
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            title: String::new(),
            description: String::new(),
            id: None,
        }
    }

    pub fn permission(name: impl Into<String>) -> Self {
        Self::new(ItemKind::Permission, name)
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::new(ItemKind::Role, name)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Raw item definition as it appears in a backend document, keyed by name:
/// `name -> { kind, title?, description?, children? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl RawItem {
    /// Materialize the item stored under the document key `name`.
    /// Child edges are carried separately and do not appear on the item.
    pub fn into_item(self, name: impl Into<String>) -> Item {
        Item {
            name: name.into(),
            kind: self.kind,
            title: self.title,
            description: self.description,
            id: None,
        }
    }

    /// Document form of `item`, keeping an existing child list.
    pub fn from_item(item: &Item, children: Vec<String>) -> Self {
        Self {
            kind: item.kind,
            title: item.title.clone(),
            description: item.description.clone(),
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ItemKind::Permission).unwrap(),
            "\"permission\""
        );
        assert_eq!(serde_json::to_string(&ItemKind::Role).unwrap(), "\"role\"");
    }

    #[test]
    fn test_raw_item_round_trip() {
        let raw: RawItem = serde_json::from_str(
            r#"{"kind": "role", "title": "Admins", "children": ["Manager", "*"]}"#,
        )
        .unwrap();
        assert_eq!(raw.kind, ItemKind::Role);
        assert_eq!(raw.children, vec!["Manager", "*"]);
        assert!(raw.description.is_empty());

        let item = raw.into_item("Admin");
        assert_eq!(item.name, "Admin");
        assert_eq!(item.title, "Admins");
        assert_eq!(item.id, None);
    }

    #[test]
    fn test_builders() {
        let item = Item::permission("articles.create").with_title("Create articles");
        assert_eq!(item.kind, ItemKind::Permission);
        assert_eq!(item.to_string(), "articles.create");
    }
}
