use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Namespaced cell type identifier (e.g. `"grove:oak_trunk"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellTypeId(Cow<'static, str>);

impl CellTypeId {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for CellTypeId {
    fn from(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }
}

impl From<String> for CellTypeId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl fmt::Display for CellTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a world reports for one loaded cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellSnapshot {
    pub type_id: CellTypeId,
    pub tags: Vec<String>,
}

impl CellSnapshot {
    pub fn new(type_id: impl Into<CellTypeId>) -> Self {
        Self {
            type_id: type_id.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Search-relevant classification of a cell.
///
/// Derived per-call from the filter sets; never cached beyond one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Satisfies the search predicate (by type or by tag).
    Target,
    /// Search and path expansion may traverse this cell.
    Passable,
    /// Neither; expansion dead-ends here.
    Blocking,
}

/// Type and tag sets that classify cells for one search or path query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellFilter {
    pub target_types: BTreeSet<CellTypeId>,
    pub target_tags: BTreeSet<String>,
    pub passable_types: BTreeSet<CellTypeId>,
    /// Blocking types that additionally may not be climbed over.
    pub unjumpable_types: BTreeSet<CellTypeId>,
}

impl CellFilter {
    /// Target classification wins over passable, so a filter may list a type
    /// in both sets without hiding it from searches.
    pub fn classify(&self, cell: &CellSnapshot) -> CellKind {
        if self.target_types.contains(&cell.type_id)
            || cell.tags.iter().any(|tag| self.target_tags.contains(tag))
        {
            return CellKind::Target;
        }
        if self.passable_types.contains(&cell.type_id) {
            return CellKind::Passable;
        }
        CellKind::Blocking
    }

    pub fn is_unjumpable(&self, cell: &CellSnapshot) -> bool {
        self.unjumpable_types.contains(&cell.type_id)
    }
}
