//! Transitive closure index over the item graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::item::WILDCARD;

/// Memoizing index of descendant and ancestor closures.
///
/// Built from the raw `name -> direct children` map reported by a store.
/// Each closure is computed once with a depth-first walk and served from
/// the memo afterwards, sorted, so repeated queries and comparisons are
/// stable. The index is pure derived data: when the edge set changes, the
/// owner drops it and builds a fresh one.
#[derive(Debug, Default)]
pub struct HierarchyIndex {
    children: BTreeMap<String, Vec<String>>,
    parents: BTreeMap<String, Vec<String>>,
    descendants: HashMap<String, Vec<String>>,
    ancestors: HashMap<String, Vec<String>>,
}

impl HierarchyIndex {
    /// Build an index over the given edge map.
    pub fn new(children: BTreeMap<String, Vec<String>>) -> Self {
        let parents = invert(&children);
        Self {
            children,
            parents,
            descendants: HashMap::new(),
            ancestors: HashMap::new(),
        }
    }

    /// All names transitively reachable from `name` through child edges,
    /// sorted. Excludes `name` itself unless the graph reaches it through
    /// a cycle. The wildcard sentinel never appears in the result.
    pub fn descendants(&mut self, name: &str) -> &[String] {
        if !self.descendants.contains_key(name) {
            let mut active = Vec::new();
            let result = expand(&self.children, &mut self.descendants, &mut active, name);
            self.descendants.entry(name.to_string()).or_insert(result);
        }
        &self.descendants[name]
    }

    /// Inverse of [`descendants`]: all names from which `name` is
    /// transitively reachable, sorted.
    ///
    /// [`descendants`]: HierarchyIndex::descendants
    pub fn ancestors(&mut self, name: &str) -> &[String] {
        if !self.ancestors.contains_key(name) {
            let mut active = Vec::new();
            let result = expand(&self.parents, &mut self.ancestors, &mut active, name);
            self.ancestors.entry(name.to_string()).or_insert(result);
        }
        &self.ancestors[name]
    }
}

/// Invert the edge map. Wildcard entries produce no inverse edge on
/// either side.
fn invert(children: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    let mut parents: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (parent, kids) in children {
        if parent == WILDCARD {
            continue;
        }
        for child in kids {
            if child == WILDCARD {
                continue;
            }
            let entry = parents.entry(child.clone()).or_default();
            if !entry.contains(parent) {
                entry.push(parent.clone());
            }
        }
    }
    parents
}

/// Memoized depth-first expansion.
///
/// `active` tracks the current call path: a node revisited while still on
/// the path contributes nothing, which keeps the walk total on cyclic
/// input. Every finished node is memoized, so each is expanded at most
/// once across all queries.
fn expand(
    edges: &BTreeMap<String, Vec<String>>,
    memo: &mut HashMap<String, Vec<String>>,
    active: &mut Vec<String>,
    name: &str,
) -> Vec<String> {
    if name == WILDCARD {
        return Vec::new();
    }
    if let Some(done) = memo.get(name) {
        return done.clone();
    }
    if active.iter().any(|n| n == name) {
        return Vec::new();
    }
    active.push(name.to_string());

    let mut reached = BTreeSet::new();
    for child in edges.get(name).map(Vec::as_slice).unwrap_or_default() {
        if child == WILDCARD {
            continue;
        }
        reached.insert(child.clone());
        for transitive in expand(edges, memo, active, child) {
            reached.insert(transitive);
        }
    }

    active.pop();
    let result: Vec<String> = reached.into_iter().collect();
    memo.insert(name.to_string(), result.clone());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(parent, kids)| {
                (
                    parent.to_string(),
                    kids.iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_descendants_transitive() {
        let mut index = HierarchyIndex::new(edges(&[
            ("Admin", &["Manager"]),
            ("Manager", &["articles.create", "articles.edit"]),
        ]));
        assert_eq!(
            index.descendants("Admin"),
            ["Manager", "articles.create", "articles.edit"]
        );
        assert_eq!(
            index.descendants("Manager"),
            ["articles.create", "articles.edit"]
        );
        assert!(index.descendants("articles.create").is_empty());
    }

    #[test]
    fn test_ancestors_inverse_of_descendants() {
        let mut index = HierarchyIndex::new(edges(&[
            ("Admin", &["Manager", "users.manage"]),
            ("Manager", &["articles.create"]),
        ]));
        assert_eq!(index.ancestors("articles.create"), ["Admin", "Manager"]);
        assert_eq!(index.ancestors("Manager"), ["Admin"]);
        assert!(index.ancestors("Admin").is_empty());

        // B in descendants(A) iff A in ancestors(B), over every pair.
        let names = ["Admin", "Manager", "articles.create", "users.manage"];
        for a in names {
            for b in names {
                let forward = index.descendants(a).contains(&b.to_string());
                let backward = index.ancestors(b).contains(&a.to_string());
                assert_eq!(forward, backward, "mismatch for {a} -> {b}");
            }
        }
    }

    #[test]
    fn test_repeated_queries_identical() {
        let mut index =
            HierarchyIndex::new(edges(&[("Admin", &["Manager"]), ("Manager", &["a", "b"])]));
        let first = index.descendants("Admin").to_vec();
        let second = index.descendants("Admin").to_vec();
        assert_eq!(first, second);
        assert_eq!(first, ["Manager", "a", "b"]);
    }

    #[test]
    fn test_wildcard_never_in_closures() {
        let mut index = HierarchyIndex::new(edges(&[
            ("Admin", &["*", "Manager"]),
            ("Manager", &["*"]),
        ]));
        assert_eq!(index.descendants("Admin"), ["Manager"]);
        assert!(index.descendants("Manager").is_empty());
        // The sentinel itself is a terminal: no closure in either direction.
        assert!(index.descendants("*").is_empty());
        assert!(index.ancestors("*").is_empty());
    }

    #[test]
    fn test_dangling_child_traversed() {
        // "ghost" has no item definition and no own edges; it still shows
        // up in closures of its parents.
        let mut index = HierarchyIndex::new(edges(&[("Admin", &["ghost"])]));
        assert_eq!(index.descendants("Admin"), ["ghost"]);
        assert_eq!(index.ancestors("ghost"), ["Admin"]);
    }

    #[test]
    fn test_cycle_does_not_recurse_forever() {
        let mut index = HierarchyIndex::new(edges(&[
            ("a", &["b"]),
            ("b", &["c"]),
            ("c", &["a"]),
        ]));
        // Totality is the contract here, exact contents are unspecified.
        let reached = index.descendants("a").to_vec();
        assert!(reached.contains(&"b".to_string()));
        assert!(reached.contains(&"c".to_string()));
    }

    #[test]
    fn test_self_cycle() {
        let mut index = HierarchyIndex::new(edges(&[("a", &["a", "b"])]));
        let reached = index.descendants("a").to_vec();
        assert!(reached.contains(&"b".to_string()));
    }

    #[test]
    fn test_diamond_deduplicated() {
        let mut index = HierarchyIndex::new(edges(&[
            ("top", &["left", "right"]),
            ("left", &["leaf"]),
            ("right", &["leaf"]),
        ]));
        assert_eq!(index.descendants("top"), ["leaf", "left", "right"]);
    }
}
