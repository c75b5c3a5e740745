//! Reverse index from capabilities to the solvables providing them
//!
//! Provider lists live in one arena of zero-terminated, ascending solvable
//! id lists. Three offsets are reserved: 0 marks an unset entry that is
//! resolved on first access, 1 is the shared empty list and 2 the shared
//! `{SYSTEM}` list. Callers never see raw offsets; they get a
//! [`ProviderList`] handle tagged with the index generation it came from.

use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;

use crate::config::DistType;
use crate::error::{PoolError, Result};
use crate::fileprovides::FileProvidesMode;
use crate::ids::{Id, IdKind, RelId, StrId};
use crate::pool::Pool;
use crate::solvable::{DepKind, SolvableId};

pub(crate) const UNSET: u32 = 0;
pub(crate) const EMPTY_LIST: u32 = 1;
pub(crate) const SYSTEM_LIST: u32 = 2;
const FIRST_LIST: u32 = 4;

/// Aux slot value for a solvable declaring the same name more than once
const AUX_AMBIGUOUS: Id = Id::from_raw(1);

/// Why a built index was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaleReason {
    /// Solvables or their provides were added
    SolvablesAdded,
    InstalledChanged,
    RepoChanged,
    FileProvidesAdded,
    Explicit,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StaleReason::SolvablesAdded => "solvables added",
            StaleReason::InstalledChanged => "installed repository changed",
            StaleReason::RepoChanged => "repository changed",
            StaleReason::FileProvidesAdded => "file provides added",
            StaleReason::Explicit => "freed",
        };
        f.write_str(reason)
    }
}

/// Lifecycle of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexState {
    Unbuilt,
    Built,
    Stale(StaleReason),
}

/// Handle to a provider list of one index generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderList {
    offset: u32,
    generation: u64,
}

impl ProviderList {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty_list(&self) -> bool {
        self.offset == EMPTY_LIST
    }
}

/// Per-name lists of the ids declared by each provider, parallel to the provider lists
#[derive(Debug, Default)]
struct AuxIndex {
    offsets: Vec<u32>,
    data: Vec<Id>,
}

/// Arena and offset tables of the index
#[derive(Default)]
pub(crate) struct WhatProvides {
    state: Option<IndexState>,
    generation: u64,
    data: Vec<SolvableId>,
    base: Vec<u32>,
    rel: Vec<u32>,
    aux: Option<AuxIndex>,

    /// Offsets of `/` names reset for lazy lookup, sorted by id
    lazy_remembered: Vec<(StrId, u32)>,
}

impl fmt::Debug for WhatProvides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatProvides")
            .field("state", &self.state())
            .field("generation", &self.generation)
            .field("data", &self.data.len())
            .field("base", &self.base.len())
            .field("rel", &self.rel.len())
            .field("aux", &self.aux.is_some())
            .field("lazy", &self.lazy_remembered.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Empty,
    Canonical(u32),
    Alias(usize),
}

fn try_vec<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(PoolError::alloc(what))?;
    v.resize(len, value);
    Ok(v)
}

fn list_at(data: &[SolvableId], offset: u32) -> &[SolvableId] {
    let tail = data.get(offset as usize..).unwrap_or(&[]);
    let len = tail.iter().position(|p| p.is_null()).unwrap_or(tail.len());
    &tail[..len]
}

/// Union of two ascending lists
pub(crate) fn merge_sorted(a: &[SolvableId], b: &[SolvableId]) -> Vec<SolvableId> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                merged.push(a[i]);
                i += 1;
            }
            Ordering::Equal => {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
            Ordering::Greater => {
                merged.push(b[j]);
                j += 1;
            }
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}

impl WhatProvides {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> IndexState {
        self.state.unwrap_or(IndexState::Unbuilt)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop all index data; a built index becomes stale
    pub(crate) fn invalidate(&mut self, reason: StaleReason) {
        if self.state() == IndexState::Built {
            log::debug!("WhatProvides index invalidated: {}", reason);
            self.state = Some(IndexState::Stale(reason));
            self.clear();
        }
    }

    fn clear(&mut self) {
        self.generation += 1;
        self.data = Vec::new();
        self.base = Vec::new();
        self.rel = Vec::new();
        self.aux = None;
        self.lazy_remembered = Vec::new();
    }

    pub(crate) fn handle(&self, offset: u32) -> ProviderList {
        ProviderList {
            offset,
            generation: self.generation,
        }
    }

    pub(crate) fn list(&self, offset: u32) -> &[SolvableId] {
        list_at(&self.data, offset)
    }

    pub(crate) fn base_offset(&self, sid: StrId) -> u32 {
        self.base.get(sid.index()).copied().unwrap_or(UNSET)
    }

    pub(crate) fn set_base(&mut self, sid: StrId, offset: u32) {
        if sid.index() >= self.base.len() {
            self.base.resize(sid.index() + 1, UNSET);
        }
        self.base[sid.index()] = offset;
    }

    pub(crate) fn rel_offset(&self, rid: RelId) -> u32 {
        self.rel.get(rid.index()).copied().unwrap_or(UNSET)
    }

    pub(crate) fn set_rel(&mut self, rid: RelId, offset: u32) {
        if rid.index() >= self.rel.len() {
            self.rel.resize(rid.index() + 1, UNSET);
        }
        self.rel[rid.index()] = offset;
    }

    /// Declared ids of the providers of `sid`, parallel to its provider list
    pub(crate) fn aux_list(&self, sid: StrId) -> Option<&[Id]> {
        let aux = self.aux.as_ref()?;
        let offset = *aux.offsets.get(sid.index())?;
        if offset == UNSET {
            return None;
        }
        let tail = aux.data.get(offset as usize..)?;
        let len = tail.iter().position(|id| id.is_null()).unwrap_or(tail.len());
        Some(&tail[..len])
    }

    pub(crate) fn clear_aux(&mut self, sid: StrId) {
        if let Some(offset) = self
            .aux
            .as_mut()
            .and_then(|aux| aux.offsets.get_mut(sid.index()))
        {
            *offset = UNSET;
        }
    }

    pub(crate) fn remembered(&self, sid: StrId) -> u32 {
        self.lazy_remembered
            .binary_search_by_key(&sid, |(id, _)| *id)
            .map(|pos| self.lazy_remembered[pos].1)
            .unwrap_or(UNSET)
    }

    /// Store a list in the arena; the empty list and `{SYSTEM}` map to their reserved offsets
    pub(crate) fn intern_list(&mut self, ids: &[SolvableId]) -> Result<u32> {
        if ids.is_empty() {
            return Ok(EMPTY_LIST);
        }
        if ids == [SolvableId::SYSTEM] {
            return Ok(SYSTEM_LIST);
        }
        self.data
            .try_reserve(ids.len() + 1)
            .map_err(PoolError::alloc("provider list"))?;
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(ids);
        self.data.push(SolvableId::NULL);
        Ok(offset)
    }

    pub(crate) fn rel_entries_mut(&mut self) -> &mut [u32] {
        &mut self.rel
    }
}

impl Pool {
    /// Build the WhatProvides index over all considered solvables
    pub fn create_whatprovides(&mut self) -> Result<()> {
        let started = Instant::now();
        let nstrings = self.ids.string_count();
        log::debug!(
            "number of solvables: {}, number of ids: {} + {}",
            self.solvables.len(),
            nstrings,
            self.ids.rel_count()
        );
        self.index.clear();
        self.index.state = Some(IndexState::Unbuilt);

        let eligible: Vec<SolvableId> = (2..self.solvables.len())
            .map(|i| SolvableId(i as u32))
            .filter(|sid| {
                let s = &self.solvables[sid.index()];
                !s.provides.is_empty() && self.considered(s)
            })
            .collect();

        // count providers for each name
        let mut base = try_vec(nstrings, 0u32, "provider counts")?;
        for &sid in &eligible {
            for &id in self.deps(sid, DepKind::Provides) {
                if let Some(count) = base.get_mut(self.ids.dep_name(id).raw() as usize) {
                    *count += 1;
                }
            }
        }

        // lay out one region per provided name, each followed by a terminator
        let mut offset = FIRST_LIST;
        let mut provided_names = 0usize;
        for entry in base.iter_mut() {
            let count = *entry;
            if count == 0 {
                *entry = EMPTY_LIST;
                continue;
            }
            *entry = offset;
            offset += count + 1;
            provided_names += 1;
        }
        log::debug!("provide ids: {}", provided_names);
        log::debug!("provide space needed: {}", offset);

        let mut data = try_vec(offset as usize, SolvableId::NULL, "provider data")?;
        data[SYSTEM_LIST as usize] = SolvableId::SYSTEM;
        let use_aux = !self.config.no_whatprovides_aux;
        let mut aux_slots = if use_aux {
            try_vec(offset as usize, Id::NULL, "provider aux data")?
        } else {
            Vec::new()
        };

        // fill in ascending solvable order, so every list comes out sorted
        let mut cursor = base.clone();
        for &sid in &eligible {
            for &id in self.deps(sid, DepKind::Provides) {
                let name = self.ids.dep_name(id).raw() as usize;
                let (Some(&start), Some(&pos)) = (base.get(name), cursor.get(name)) else {
                    continue;
                };
                let pos = pos as usize;
                if pos > start as usize && data[pos - 1] == sid {
                    // same solvable provides this name twice
                    if use_aux {
                        aux_slots[pos - 1] = AUX_AMBIGUOUS;
                    }
                    continue;
                }
                data[pos] = sid;
                if use_aux {
                    aux_slots[pos] = id;
                }
                cursor[name] += 1;
            }
        }

        if use_aux {
            let mut aux = AuxIndex {
                offsets: try_vec(nstrings, UNSET, "provider aux offsets")?,
                data: vec![Id::NULL],
            };
            aux.data
                .try_reserve(offset as usize)
                .map_err(PoolError::alloc("provider aux data"))?;
            for (i, &start) in base.iter().enumerate() {
                if start < FIRST_LIST {
                    continue;
                }
                let len = list_at(&data, start).len();
                aux.offsets[i] = aux.data.len() as u32;
                aux.data
                    .extend_from_slice(&aux_slots[start as usize..start as usize + len]);
                aux.data.push(Id::NULL);
            }
            log::debug!("whatprovidesaux data: {} entries", aux.data.len());
            self.index.aux = Some(aux);
        }

        let data = Self::shrink_whatprovides(&mut base, data)?;
        self.index.data = data;
        self.index.base = base;
        self.index.rel = try_vec(self.ids.rel_count(), UNSET, "relation cache")?;
        self.setup_lazy_file_provides();

        self.index.state = Some(IndexState::Built);
        log::debug!(
            "whatprovides memory used: {} id entries, {} data entries",
            self.index.base.len() + self.index.rel.len(),
            self.index.data.len()
        );
        log::debug!("createwhatprovides took {} ms", started.elapsed().as_millis());
        Ok(())
    }

    /// Share identical provider lists and compact the arena
    fn shrink_whatprovides(base: &mut [u32], data: Vec<SolvableId>) -> Result<Vec<SolvableId>> {
        let mut names: Vec<usize> = (0..base.len()).filter(|&i| base[i] >= FIRST_LIST).collect();
        names.sort_by(|&a, &b| {
            list_at(&data, base[a])
                .cmp(list_at(&data, base[b]))
                .then(a.cmp(&b))
        });

        let mut slots = try_vec(base.len(), Slot::Empty, "shrink slots")?;
        let mut canonical: Option<usize> = None;
        for &name in &names {
            match canonical {
                Some(first) if list_at(&data, base[first]) == list_at(&data, base[name]) => {
                    slots[name] = Slot::Alias(first);
                }
                _ => {
                    slots[name] = Slot::Canonical(base[name]);
                    canonical = Some(name);
                }
            }
        }

        let mut compacted = Vec::new();
        compacted
            .try_reserve(data.len())
            .map_err(PoolError::alloc("provider data"))?;
        compacted.extend_from_slice(&[
            SolvableId::NULL,
            SolvableId::NULL,
            SolvableId::SYSTEM,
            SolvableId::NULL,
        ]);
        for name in 0..base.len() {
            match slots[name] {
                Slot::Empty => base[name] = EMPTY_LIST,
                Slot::Canonical(offset) => {
                    base[name] = compacted.len() as u32;
                    compacted.extend_from_slice(list_at(&data, offset));
                    compacted.push(SolvableId::NULL);
                }
                // runs are sorted by id, so the canonical entry is already placed
                Slot::Alias(first) => base[name] = base[first],
            }
        }
        log::debug!("shrunk whatprovidesdata from {} to {}", data.len(), compacted.len());
        Ok(compacted)
    }

    /// Reset `/` names so they are looked up in the file lists on first access
    fn setup_lazy_file_provides(&mut self) {
        let lazy_all = self.file_provides_mode == FileProvidesMode::NotAdded
            && self.config.dist_type == DistType::Rpm;
        let lazy_filtered = self.file_provides_mode == FileProvidesMode::Filtered;
        if !lazy_all && !lazy_filtered {
            return;
        }
        if self.file_provides_mode == FileProvidesMode::NotAdded {
            log::warn!("add_file_provides was not called, this may result in slow operation");
        }
        let mut remembered = Vec::new();
        for i in 1..self.index.base.len() {
            let sid = StrId::from_index(i);
            let path = self.ids.resolve(sid.into());
            if !path.starts_with('/') {
                continue;
            }
            if lazy_filtered && self.file_filter.matches(path) {
                continue;
            }
            let offset = self.index.base[i];
            if offset > EMPTY_LIST {
                remembered.push((sid, offset));
            }
            self.index.base[i] = UNSET;
            self.index.clear_aux(sid);
        }
        log::debug!("lazywhatprovidesq size: {} entries", remembered.len());
        self.index.lazy_remembered = remembered;
    }

    /// Discard the index
    pub fn free_whatprovides(&mut self) {
        self.index.invalidate(StaleReason::Explicit);
    }

    pub fn index_state(&self) -> IndexState {
        self.index.state()
    }

    pub fn index_generation(&self) -> u64 {
        self.index.generation()
    }

    pub(crate) fn ensure_index(&self) -> Result<()> {
        match self.index.state() {
            IndexState::Built => Ok(()),
            IndexState::Unbuilt => Err(PoolError::IndexNotBuilt),
            IndexState::Stale(reason) => Err(PoolError::IndexStale(reason)),
        }
    }

    /// Providers of a plain or relational dependency
    pub fn whatprovides(&mut self, dep: Id) -> Result<ProviderList> {
        self.ensure_index()?;
        let offset = self.provider_offset(dep)?;
        Ok(self.index.handle(offset))
    }

    /// Resolve a handle to its solvables
    pub fn providers(&self, list: ProviderList) -> Result<&[SolvableId]> {
        self.ensure_index()?;
        if list.generation != self.index.generation() {
            return Err(PoolError::StaleHandle {
                handle: list,
                current: self.index.generation(),
            });
        }
        Ok(self.index.list(list.offset))
    }

    /// Providers of `dep`, copied out of the index
    pub fn providers_of(&mut self, dep: Id) -> Result<Vec<SolvableId>> {
        let list = self.whatprovides(dep)?;
        Ok(self.providers(list)?.to_vec())
    }

    /// Store an arbitrary solvable list in the index arena
    pub fn ids2whatprovides(&mut self, ids: &[SolvableId]) -> Result<ProviderList> {
        self.ensure_index()?;
        let offset = self.index.intern_list(ids)?;
        Ok(self.index.handle(offset))
    }

    pub(crate) fn provider_offset(&mut self, dep: Id) -> Result<u32> {
        match dep.kind() {
            IdKind::Str(sid) => match self.index.base_offset(sid) {
                UNSET => self.add_std_providers(sid),
                offset => Ok(offset),
            },
            IdKind::Rel(rid) => match self.index.rel_offset(rid) {
                UNSET => self.add_rel_providers(rid),
                offset => Ok(offset),
            },
        }
    }

    pub(crate) fn provider_vec(&mut self, dep: Id) -> Result<Vec<SolvableId>> {
        let offset = self.provider_offset(dep)?;
        Ok(self.index.list(offset).to_vec())
    }

    /// Lazy resolution of an unset plain name through the file lists
    fn add_std_providers(&mut self, sid: StrId) -> Result<u32> {
        if self.file_provides_mode == FileProvidesMode::All {
            self.index.set_base(sid, EMPTY_LIST);
            return Ok(EMPTY_LIST);
        }
        let path = self.ids.resolve(sid.into());
        if !path.starts_with('/') {
            self.index.set_base(sid, EMPTY_LIST);
            return Ok(EMPTY_LIST);
        }
        let path = path.to_string();
        let found = self.filelist_search(&path);
        let remembered = self.index.remembered(sid);
        log::trace!(
            "lazy file provides for {}: {} filelist matches, remembered offset {}",
            path,
            found.len(),
            remembered
        );

        let offset = if found.is_empty() {
            if remembered != UNSET {
                remembered
            } else {
                EMPTY_LIST
            }
        } else if remembered != UNSET {
            let old = self.index.list(remembered);
            let merged = merge_sorted(&found, old);
            if merged.len() == old.len() {
                remembered
            } else {
                self.index.intern_list(&merged)?
            }
        } else {
            self.index.intern_list(&found)?
        };
        self.index.set_base(sid, offset);
        Ok(offset)
    }

    /// Considered solvables whose file list contains `path`, ascending
    pub(crate) fn filelist_search(&self, path: &str) -> Vec<SolvableId> {
        let mut found = Vec::new();
        for (repo_id, repo) in self.repos() {
            if repo.disabled {
                continue;
            }
            for data in &repo.repodata {
                for sid in data.solvables_with_file(path) {
                    let Some(s) = self.solvables.get(sid.index()) else {
                        continue;
                    };
                    if s.repo == Some(repo_id) && self.considered(s) {
                        found.push(sid);
                    }
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Insert `sid` into the provider list of the base name of `name`
    pub(crate) fn add_new_provider(&mut self, name: Id, sid: SolvableId) -> Result<()> {
        let name = self.ids.dep_name(name);
        let Some(str_id) = name.as_str_id() else {
            return Ok(());
        };
        let mut list = self.provider_vec(name)?;
        let Err(pos) = list.binary_search(&sid) else {
            return Ok(());
        };
        list.insert(pos, sid);
        let offset = self.index.intern_list(&list)?;
        self.index.set_base(str_id, offset);
        self.index.clear_aux(str_id);
        Ok(())
    }
}
