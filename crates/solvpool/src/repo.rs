use std::fmt;

use crate::ids::Id;
use crate::repodata::Repodata;
use crate::solvable::{DepOffset, SolvableId};

/// Index of a repository in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId(pub u32);

impl RepoId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repo #{}", self.0)
    }
}

/// Where a new dependency goes relative to a marker id in the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepMarker {
    /// Anywhere; the id is only added when not present yet
    #[default]
    None,
    /// In front of the marker, e.g. prerequisites before `SOLVABLE_PREREQMARKER`
    Before(Id),
    /// Behind the marker, adding the marker when the list lacks it
    After(Id),
}

/// A set of solvables sharing one dependency id array
#[derive(Debug, Clone)]
pub struct Repo {
    pub name: String,
    pub disabled: bool,

    /// Zero-terminated dependency lists; index 0 holds the shared empty list
    idarray: Vec<Id>,

    /// Solvables of this repo in ascending id order
    pub(crate) solvables: Vec<SolvableId>,

    pub(crate) repodata: Vec<Repodata>,
}

impl Repo {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            disabled: false,
            idarray: vec![Id::NULL],
            solvables: Vec::new(),
            repodata: Vec::new(),
        }
    }

    pub fn solvables(&self) -> &[SolvableId] {
        &self.solvables
    }

    pub fn repodata(&self) -> &[Repodata] {
        &self.repodata
    }

    pub fn repodata_mut(&mut self) -> &mut [Repodata] {
        &mut self.repodata
    }

    /// The list stored at `offset`, without its terminator
    pub fn dep_list(&self, offset: DepOffset) -> &[Id] {
        let tail = self.idarray.get(offset.0 as usize..).unwrap_or(&[]);
        let len = tail.iter().position(|id| id.is_null()).unwrap_or(tail.len());
        &tail[..len]
    }

    /// Append `id`, reusing the list in place when it sits at the end of the array
    pub(crate) fn add_id(&mut self, offset: DepOffset, id: Id) -> DepOffset {
        if offset.is_empty() {
            let start = self.idarray.len();
            self.idarray.push(id);
            self.idarray.push(Id::NULL);
            return DepOffset(start as u32);
        }
        let start = offset.0 as usize;
        let end = start + self.dep_list(offset).len();
        if end + 1 == self.idarray.len() {
            self.idarray[end] = id;
            self.idarray.push(Id::NULL);
            return offset;
        }
        let new_start = self.idarray.len();
        self.idarray.extend_from_within(start..end);
        self.idarray.push(id);
        self.idarray.push(Id::NULL);
        DepOffset(new_start as u32)
    }

    /// Add a dependency with marker placement.
    ///
    /// Ids already present on the requested side of the marker are not added
    /// again; an id found on the other side is moved.
    pub(crate) fn add_id_dep(&mut self, offset: DepOffset, id: Id, marker: DepMarker) -> DepOffset {
        let placement = match marker {
            DepMarker::Before(m) if m != id => Some((m, true)),
            DepMarker::After(m) if m != id => Some((m, false)),
            _ => None,
        };
        let list = self.dep_list(offset).to_vec();
        let Some((marker, before)) = placement else {
            if list.contains(&id) {
                return offset;
            }
            return self.add_id(offset, id);
        };

        let Some(pos) = list.iter().position(|&x| x == marker) else {
            if list.contains(&id) {
                return offset;
            }
            if before {
                return self.add_id(offset, id);
            }
            let offset = self.add_id(offset, marker);
            return self.add_id(offset, id);
        };

        let (head, tail) = (&list[..pos], &list[pos + 1..]);
        let mut new_list = Vec::with_capacity(list.len() + 1);
        if before {
            if head.contains(&id) {
                return offset;
            }
            new_list.extend_from_slice(head);
            new_list.push(id);
            new_list.push(marker);
            new_list.extend(tail.iter().copied().filter(|&x| x != id));
        } else {
            if tail.contains(&id) {
                return offset;
            }
            new_list.extend(head.iter().copied().filter(|&x| x != id));
            new_list.push(marker);
            new_list.extend_from_slice(tail);
            new_list.push(id);
        }
        self.write_list(offset, list.len(), &new_list)
    }

    fn write_list(&mut self, offset: DepOffset, old_len: usize, ids: &[Id]) -> DepOffset {
        let start = offset.0 as usize;
        if ids.len() <= old_len {
            self.idarray[start..start + ids.len()].copy_from_slice(ids);
            self.idarray[start + ids.len()] = Id::NULL;
            return offset;
        }
        if start + old_len + 1 == self.idarray.len() {
            self.idarray.truncate(start);
            self.idarray.extend_from_slice(ids);
            self.idarray.push(Id::NULL);
            return offset;
        }
        let new_start = self.idarray.len();
        self.idarray.extend_from_slice(ids);
        self.idarray.push(Id::NULL);
        DepOffset(new_start as u32)
    }
}
