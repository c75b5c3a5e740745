//! Interned identifiers for strings and dependency relations
//!
//! Every name, version, architecture and dependency expression in the pool
//! is represented by a small integer [`Id`]. Plain ids refer to interned
//! strings, relational ids refer to interned `(name, evr, op)` triples such
//! as `foo >= 1.0`. The packed integer form is only a storage detail; code
//! that needs to distinguish the two cases goes through [`Id::kind`].

use std::fmt;

use bitflags::bitflags;
use indexmap::IndexSet;

const REL_BIT: u32 = 0x8000_0000;

/// Packed identifier; the high bit marks relational ids
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id(u32);

/// Index into the string table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrId(u32);

/// Index into the relation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelId(u32);

/// Unpacked view of an [`Id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Str(StrId),
    Rel(RelId),
}

impl Id {
    pub const NULL: Id = Id(0);

    pub const fn from_raw(raw: u32) -> Self {
        Id(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn is_rel(self) -> bool {
        self.0 & REL_BIT != 0
    }

    pub fn kind(self) -> IdKind {
        if self.is_rel() {
            IdKind::Rel(RelId(self.0 & !REL_BIT))
        } else {
            IdKind::Str(StrId(self.0))
        }
    }

    /// The string id, if this is a plain id
    pub fn as_str_id(self) -> Option<StrId> {
        match self.kind() {
            IdKind::Str(sid) => Some(sid),
            IdKind::Rel(_) => None,
        }
    }

    /// The relation id, if this is a relational id
    pub fn as_rel_id(self) -> Option<RelId> {
        match self.kind() {
            IdKind::Rel(rid) => Some(rid),
            IdKind::Str(_) => None,
        }
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            IdKind::Str(sid) => write!(f, "Id({})", sid.0),
            IdKind::Rel(rid) => write!(f, "Id(rel {})", rid.0),
        }
    }
}

impl StrId {
    pub fn from_index(index: usize) -> Self {
        StrId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RelId {
    pub fn from_index(index: usize) -> Self {
        RelId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<StrId> for Id {
    fn from(sid: StrId) -> Self {
        Id(sid.0)
    }
}

impl From<RelId> for Id {
    fn from(rid: RelId) -> Self {
        Id(rid.0 | REL_BIT)
    }
}

/// Ids interned by every [`IdPool`] at fixed positions
pub mod known {
    use super::Id;

    pub const NULL: Id = Id::from_raw(0);
    pub const EMPTY: Id = Id::from_raw(1);
    pub const SYSTEM_SYSTEM: Id = Id::from_raw(2);
    pub const NAMESPACE_OTHERPROVIDERS: Id = Id::from_raw(3);
    pub const NAMESPACE_SPLITPROVIDES: Id = Id::from_raw(4);
    pub const NAMESPACE_INSTALLED: Id = Id::from_raw(5);
    pub const ARCH_SRC: Id = Id::from_raw(6);
    pub const ARCH_NOSRC: Id = Id::from_raw(7);
    pub const ARCH_NOARCH: Id = Id::from_raw(8);
    pub const ARCH_ALL: Id = Id::from_raw(9);
    pub const ARCH_ANY: Id = Id::from_raw(10);
    pub const SOLVABLE_PREREQMARKER: Id = Id::from_raw(11);
    pub const SOLVABLE_FILEMARKER: Id = Id::from_raw(12);

    pub(super) const STRINGS: [&str; 13] = [
        "<NULL>",
        "",
        "system:system",
        "namespace:otherproviders",
        "namespace:splitprovides",
        "namespace:installed",
        "src",
        "nosrc",
        "noarch",
        "all",
        "any",
        "solvable:prereqmarker",
        "solvable:filemarker",
    ];
}

bitflags! {
    /// Version comparison bits of a relation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VersionFlags: u32 {
        const GT = 1;
        const EQ = 2;
        const LT = 4;
    }
}

impl VersionFlags {
    pub const GE: VersionFlags = VersionFlags::GT.union(VersionFlags::EQ);
    pub const LE: VersionFlags = VersionFlags::LT.union(VersionFlags::EQ);
}

/// Relation operator of a [`Reldep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    /// Version range; an empty flag set matches nothing, all three match everything
    Version(VersionFlags),
    And,
    Or,
    With,
    Namespace,
    Arch,
    FileConflict,
    Cond,
    /// `(actual, compat)` version pair used as a provided evr
    Compat,
    Kind,
    Multiarch,
    /// Raw value without a known meaning
    Unknown(u32),
}

impl RelOp {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0..=7 => RelOp::Version(VersionFlags::from_bits_truncate(raw)),
            16 => RelOp::And,
            17 => RelOp::Or,
            18 => RelOp::With,
            19 => RelOp::Namespace,
            20 => RelOp::Arch,
            21 => RelOp::FileConflict,
            22 => RelOp::Cond,
            23 => RelOp::Compat,
            24 => RelOp::Kind,
            25 => RelOp::Multiarch,
            other => RelOp::Unknown(other),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            RelOp::Version(flags) => flags.bits(),
            RelOp::And => 16,
            RelOp::Or => 17,
            RelOp::With => 18,
            RelOp::Namespace => 19,
            RelOp::Arch => 20,
            RelOp::FileConflict => 21,
            RelOp::Cond => 22,
            RelOp::Compat => 23,
            RelOp::Kind => 24,
            RelOp::Multiarch => 25,
            RelOp::Unknown(raw) => raw,
        }
    }

    pub fn version_flags(self) -> Option<VersionFlags> {
        match self {
            RelOp::Version(flags) => Some(flags),
            _ => None,
        }
    }

    /// Whether this operator selects a special relation rather than a version range
    pub fn is_special(self) -> bool {
        !matches!(self, RelOp::Version(_))
    }
}

/// Interned relation triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reldep {
    pub name: Id,
    pub evr: Id,
    pub op: RelOp,
}

/// String and relation interner
#[derive(Debug, Clone)]
pub struct IdPool {
    strings: IndexSet<String>,
    rels: IndexSet<Reldep>,
}

impl Default for IdPool {
    fn default() -> Self {
        Self::new()
    }
}

impl IdPool {
    pub fn new() -> Self {
        let mut strings = IndexSet::with_capacity(known::STRINGS.len());
        for s in known::STRINGS {
            strings.insert(s.to_string());
        }
        Self {
            strings,
            rels: IndexSet::new(),
        }
    }

    /// Intern a string
    pub fn intern(&mut self, s: &str) -> Id {
        if let Some(index) = self.strings.get_index_of(s) {
            return Id(index as u32);
        }
        let (index, _) = self.strings.insert_full(s.to_string());
        Id(index as u32)
    }

    /// Look up a string without interning it
    pub fn lookup(&self, s: &str) -> Option<Id> {
        self.strings.get_index_of(s).map(|index| Id(index as u32))
    }

    /// Intern a relation; the operator is normalised through its raw value
    pub fn intern_rel(&mut self, name: Id, evr: Id, op: RelOp) -> Id {
        let reldep = Reldep {
            name,
            evr,
            op: RelOp::from_raw(op.to_raw()),
        };
        let (index, _) = self.rels.insert_full(reldep);
        RelId(index as u32).into()
    }

    /// Look up a relation without interning it
    pub fn lookup_rel(&self, name: Id, evr: Id, op: RelOp) -> Option<Id> {
        let reldep = Reldep {
            name,
            evr,
            op: RelOp::from_raw(op.to_raw()),
        };
        self.rels
            .get_index_of(&reldep)
            .map(|index| RelId(index as u32).into())
    }

    pub fn is_rel(&self, id: Id) -> bool {
        id.is_rel()
    }

    pub fn reldep(&self, id: Id) -> Option<&Reldep> {
        id.as_rel_id().and_then(|rid| self.rels.get_index(rid.index()))
    }

    /// Strip relational wrapping down to the base name
    pub fn dep_name(&self, mut id: Id) -> Id {
        while let Some(rd) = self.reldep(id) {
            id = rd.name;
        }
        id
    }

    /// Resolve an id to its string; relational ids resolve to their base name
    pub fn resolve(&self, id: Id) -> &str {
        let base = self.dep_name(id);
        self.strings
            .get_index(base.0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn rel_count(&self) -> usize {
        self.rels.len()
    }

    /// Iterate all relations with their ids
    pub fn rels(&self) -> impl Iterator<Item = (Id, &Reldep)> {
        self.rels
            .iter()
            .enumerate()
            .map(|(index, rd)| (RelId(index as u32).into(), rd))
    }

    /// Human readable form of a dependency
    pub fn dep2str(&self, id: Id) -> String {
        let Some(rd) = self.reldep(id) else {
            return self.resolve(id).to_string();
        };
        // combinators parenthesize themselves, so operands nest without extra grouping
        let name = self.dep2str(rd.name);
        let evr = self.dep2str(rd.evr);
        match rd.op {
            RelOp::Version(flags) => {
                let op = match flags.bits() {
                    1 => ">",
                    2 => "=",
                    3 => ">=",
                    4 => "<",
                    5 => "<>",
                    6 => "<=",
                    7 => "<=>",
                    _ => "?",
                };
                format!("{} {} {}", name, op, evr)
            }
            RelOp::And => format!("({} and {})", name, evr),
            RelOp::Or => format!("({} or {})", name, evr),
            RelOp::With => format!("({} with {})", name, evr),
            RelOp::Cond => format!("({} if {})", name, evr),
            RelOp::Namespace => format!("{}({})", name, evr),
            RelOp::Arch => format!("{}.{}", name, evr),
            RelOp::Multiarch => format!("{}:{}", name, evr),
            RelOp::Kind => format!("{}:{}", evr, name),
            RelOp::FileConflict => format!("{} fileconflict {}", name, evr),
            RelOp::Compat => format!("{} compat >= {}", name, evr),
            RelOp::Unknown(raw) => format!("{} ?{}? {}", name, raw, evr),
        }
    }
}
