//! Access evaluation against a subject's direct assignments.

use std::collections::HashMap;

use crate::Result;
use crate::hierarchy::HierarchyIndex;
use crate::store::{ItemStore, SubjectId};

/// Ambient-subject collaborator.
///
/// Resolves the subject for checks that do not name one explicitly, e.g.
/// the authenticated user of the current request. When no source is wired
/// in, or the source has no current subject, checks fail closed.
pub trait SubjectSource {
    fn current(&self) -> Option<SubjectId>;
}

/// Evaluates whether a subject holds at least one of the requested names.
///
/// A name is granted if it is directly assigned to the subject, or if any
/// of its ancestors (a role that transitively contains it) is. Grants only
/// expand downward from an assignment, never upward.
///
/// An instance is scoped to one evaluation context (e.g. one inbound
/// request): the subject's assignment list and every (subject, name)
/// decision are cached for the life of the instance, and [`reset`] must be
/// called when it is rebound to a new context. Instance state is not safe
/// for concurrent use; wrap decisions in a [`CachingChecker`] where
/// cross-context sharing is intended.
///
/// [`reset`]: AccessChecker::reset
/// [`CachingChecker`]: crate::CachingChecker
#[derive(Default)]
pub struct AccessChecker {
    subject_source: Option<Box<dyn SubjectSource>>,
    index: Option<HierarchyIndex>,
    assignments: HashMap<SubjectId, Vec<String>>,
    checks: HashMap<(SubjectId, String), bool>,
}

impl AccessChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire in the ambient-subject collaborator.
    pub fn with_subject_source(mut self, source: Box<dyn SubjectSource>) -> Self {
        self.subject_source = Some(source);
        self
    }

    /// The effective subject: the explicit one if given, otherwise the
    /// ambient source's current subject.
    pub fn resolve_subject(&self, explicit: Option<SubjectId>) -> Option<SubjectId> {
        explicit.or_else(|| self.subject_source.as_ref().and_then(|s| s.current()))
    }

    /// True if the subject holds at least one of `names`.
    ///
    /// An unresolvable subject is a denial, never an error. Evaluation
    /// short-circuits on the first granted name.
    pub fn has<S: ItemStore>(
        &mut self,
        store: &S,
        names: &[&str],
        subject: Option<SubjectId>,
    ) -> Result<bool> {
        let Some(subject) = self.resolve_subject(subject) else {
            return Ok(false);
        };
        for name in names {
            if self.check_one(store, subject, name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if the subject holds none of `names`.
    pub fn has_none<S: ItemStore>(
        &mut self,
        store: &S,
        names: &[&str],
        subject: Option<SubjectId>,
    ) -> Result<bool> {
        Ok(!self.has(store, names, subject)?)
    }

    /// Clear the per-context caches. Must be called when the checker is
    /// rebound to a new evaluation context, so answers computed under the
    /// previous context cannot leak into the new one.
    pub fn reset(&mut self) {
        self.checks.clear();
        self.assignments.clear();
    }

    /// Discard the memoized hierarchy closures. Must be called after any
    /// mutation of items or child edges.
    pub fn invalidate_items(&mut self) {
        self.index = None;
    }

    fn check_one<S: ItemStore>(
        &mut self,
        store: &S,
        subject: SubjectId,
        name: &str,
    ) -> Result<bool> {
        if let Some(&cached) = self.checks.get(&(subject, name.to_string())) {
            return Ok(cached);
        }
        let granted = self.check_assignments(store, subject, name)?;
        self.checks.insert((subject, name.to_string()), granted);
        Ok(granted)
    }

    fn check_assignments<S: ItemStore>(
        &mut self,
        store: &S,
        subject: SubjectId,
        name: &str,
    ) -> Result<bool> {
        let assigned = self.assignments_for(store, subject)?.to_vec();
        if assigned.iter().any(|a| a == name) {
            return Ok(true);
        }
        if assigned.is_empty() {
            return Ok(false);
        }
        let index = self.index_for(store)?;
        Ok(index.ancestors(name).iter().any(|a| assigned.contains(a)))
    }

    fn assignments_for<S: ItemStore>(
        &mut self,
        store: &S,
        subject: SubjectId,
    ) -> Result<&[String]> {
        if !self.assignments.contains_key(&subject) {
            let assigned = store.assignments(subject)?;
            self.assignments.insert(subject, assigned);
        }
        Ok(self.assignments.entry(subject).or_default())
    }

    fn index_for<S: ItemStore>(&mut self, store: &S) -> Result<&mut HierarchyIndex> {
        if self.index.is_none() {
            self.index = Some(HierarchyIndex::new(store.child_edges()?));
        }
        Ok(self.index.get_or_insert_default())
    }
}
