use std::fmt;

use crate::ids::{known, Id};
use crate::repo::RepoId;

/// Index of a solvable in the pool.
///
/// Id 0 is a sentinel (it also terminates provider lists), id 1 is the
/// [`SolvableId::SYSTEM`] pseudo package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SolvableId(pub u32);

impl SolvableId {
    pub const NULL: SolvableId = SolvableId(0);
    pub const SYSTEM: SolvableId = SolvableId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SolvableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The dependency lists a solvable carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepKind {
    Provides,
    Obsoletes,
    Conflicts,
    Requires,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
}

impl DepKind {
    pub const ALL: [DepKind; 8] = [
        DepKind::Provides,
        DepKind::Obsoletes,
        DepKind::Conflicts,
        DepKind::Requires,
        DepKind::Recommends,
        DepKind::Suggests,
        DepKind::Supplements,
        DepKind::Enhances,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DepKind::Provides => "provides",
            DepKind::Obsoletes => "obsoletes",
            DepKind::Conflicts => "conflicts",
            DepKind::Requires => "requires",
            DepKind::Recommends => "recommends",
            DepKind::Suggests => "suggests",
            DepKind::Supplements => "supplements",
            DepKind::Enhances => "enhances",
        }
    }
}

/// Offset of a zero-terminated list in the owning repo's id array; 0 is the empty list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepOffset(pub u32);

impl DepOffset {
    pub const EMPTY: DepOffset = DepOffset(0);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A package in the pool
#[derive(Debug, Clone, Default)]
pub struct Solvable {
    pub name: Id,
    pub evr: Id,
    pub arch: Id,
    pub repo: Option<RepoId>,
    pub provides: DepOffset,
    pub obsoletes: DepOffset,
    pub conflicts: DepOffset,
    pub requires: DepOffset,
    pub recommends: DepOffset,
    pub suggests: DepOffset,
    pub supplements: DepOffset,
    pub enhances: DepOffset,
}

impl Solvable {
    /// The pseudo package satisfying system capabilities
    pub(crate) fn system(noarch: Id) -> Self {
        Self {
            name: known::SYSTEM_SYSTEM,
            evr: known::EMPTY,
            arch: noarch,
            ..Self::default()
        }
    }

    pub fn deps(&self, kind: DepKind) -> DepOffset {
        match kind {
            DepKind::Provides => self.provides,
            DepKind::Obsoletes => self.obsoletes,
            DepKind::Conflicts => self.conflicts,
            DepKind::Requires => self.requires,
            DepKind::Recommends => self.recommends,
            DepKind::Suggests => self.suggests,
            DepKind::Supplements => self.supplements,
            DepKind::Enhances => self.enhances,
        }
    }

    pub fn deps_mut(&mut self, kind: DepKind) -> &mut DepOffset {
        match kind {
            DepKind::Provides => &mut self.provides,
            DepKind::Obsoletes => &mut self.obsoletes,
            DepKind::Conflicts => &mut self.conflicts,
            DepKind::Requires => &mut self.requires,
            DepKind::Recommends => &mut self.recommends,
            DepKind::Suggests => &mut self.suggests,
            DepKind::Supplements => &mut self.supplements,
            DepKind::Enhances => &mut self.enhances,
        }
    }
}
