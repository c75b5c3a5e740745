//! Provider resolution for relational dependencies
//!
//! A relational id is resolved the first time it is queried and the result
//! is cached in the relation table of the index. Version ranges are matched
//! against the provides of every candidate of the base name; the special
//! operators combine or filter the provider lists of their operands.

use std::fmt;

use solvpool_evr::EvrOrdering;

use crate::config::DistType;
use crate::error::Result;
use crate::ids::{known, Id, IdPool, RelId, RelOp, VersionFlags};
use crate::pool::Pool;
use crate::repo::DepMarker;
use crate::solvable::{DepKind, Solvable, SolvableId};
use crate::whatprovides::{merge_sorted, ProviderList, EMPTY_LIST, SYSTEM_LIST, UNSET};

/// Answer of a [`NamespaceProvider`] for one `name(evr)` dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceAnswer {
    /// Nothing provides it
    None,
    /// The system provides it
    System,
    Solvables(Vec<SolvableId>),
    /// A list already stored in the index, e.g. with [`Pool::ids2whatprovides`]
    List(ProviderList),
}

/// Answers namespace dependencies such as `namespace:language(de)`
pub trait NamespaceProvider: fmt::Debug {
    fn providers(&self, ids: &IdPool, name: Id, evr: Id) -> NamespaceAnswer;
}

/// Whether `name` carries the package kind `kind`.
///
/// `kind` NULL matches every name, EMPTY only plain package names without a
/// `kind:` prefix.
fn is_kind(name: &str, kind: Id, kind_str: &str) -> bool {
    if kind.is_null() {
        return true;
    }
    if kind == known::EMPTY {
        if name.starts_with(':') {
            return true;
        }
        let rest = name.trim_start_matches(|c: char| c.is_ascii_lowercase());
        return !rest.starts_with(':');
    }
    name.strip_prefix(kind_str).is_some_and(|rest| rest.starts_with(':'))
}

fn is_empty_name(id: Id) -> bool {
    id.is_null() || id == known::EMPTY
}

impl Pool {
    /// Resolve and cache the providers of a relation
    pub(crate) fn add_rel_providers(&mut self, rid: RelId) -> Result<u32> {
        let id: Id = rid.into();
        let Some(rd) = self.ids.reldep(id).copied() else {
            return Ok(EMPTY_LIST);
        };
        let (name, evr) = (rd.name, rd.evr);

        let offset = match rd.op {
            RelOp::With => {
                let left = self.provider_vec(name)?;
                let right = self.provider_vec(evr)?;
                let list: Vec<SolvableId> = left
                    .into_iter()
                    .filter(|p| right.contains(p))
                    .collect();
                self.store_list(&list, &[name])?
            }
            RelOp::And | RelOp::Or => {
                let left = self.provider_vec(name)?;
                let right = self.provider_vec(evr)?;
                let list = merge_sorted(&left, &right);
                self.store_list(&list, &[name, evr])?
            }
            RelOp::Cond => self.provider_offset(name)?,
            RelOp::Namespace => self.namespace_providers(name, evr)?,
            RelOp::Arch => {
                let list = self.arch_providers(name, evr)?;
                self.store_list(&list, &[name])?
            }
            RelOp::Multiarch if evr == known::ARCH_ANY => self.provider_offset(name)?,
            RelOp::Multiarch => EMPTY_LIST,
            RelOp::Kind => {
                let list = self.kind_providers(name, evr)?;
                self.store_list(&list, &[name])?
            }
            RelOp::FileConflict => {
                let list: Vec<SolvableId> = self
                    .provider_vec(name)?
                    .into_iter()
                    .filter(|&p| self.deps(p, DepKind::Provides).contains(&id))
                    .collect();
                self.store_list(&list, &[name])?
            }
            RelOp::Version(flags) if flags.is_empty() => EMPTY_LIST,
            RelOp::Version(flags) => {
                let list = self.version_providers(name, flags, evr, id)?;
                self.store_list(&list, &[name])?
            }
            RelOp::Compat | RelOp::Unknown(_) => EMPTY_LIST,
        };

        log::trace!("whatprovides {} -> offset {}", self.ids.dep2str(id), offset);
        self.index.set_rel(rid, offset);
        Ok(offset)
    }

    /// Store `list`, reusing the list of an operand when the content is the same
    fn store_list(&mut self, list: &[SolvableId], operands: &[Id]) -> Result<u32> {
        for &operand in operands {
            let offset = self.provider_offset(operand)?;
            if offset != UNSET && self.index.list(offset) == list {
                return Ok(offset);
            }
        }
        self.index.intern_list(list)
    }

    fn namespace_providers(&mut self, name: Id, evr: Id) -> Result<u32> {
        if name == known::NAMESPACE_OTHERPROVIDERS {
            return self.provider_offset(evr);
        }
        let answer = match &self.namespace_provider {
            Some(provider) => provider.providers(&self.ids, name, evr),
            None => NamespaceAnswer::None,
        };
        log::trace!(
            "namespace callback for {}({}): {:?}",
            self.ids.resolve(name),
            self.ids.dep2str(evr),
            answer
        );
        match answer {
            NamespaceAnswer::None => Ok(EMPTY_LIST),
            NamespaceAnswer::System => Ok(SYSTEM_LIST),
            NamespaceAnswer::Solvables(mut list) => {
                list.sort_unstable();
                list.dedup();
                self.index.intern_list(&list)
            }
            NamespaceAnswer::List(handle) => {
                // rejects handles of an older generation
                self.providers(handle)?;
                Ok(handle.offset())
            }
        }
    }

    fn arch_providers(&mut self, name: Id, arch: Id) -> Result<Vec<SolvableId>> {
        if arch == known::ARCH_SRC || arch == known::ARCH_NOSRC {
            // source packages are never installable, so they are not in the index
            let list = self
                .solvable_ids()
                .filter(|&p| {
                    let s = &self.solvables[p.index()];
                    (s.arch == arch || s.arch == known::ARCH_NOSRC)
                        && !self.repo_disabled(s)
                        && (is_empty_name(name) || self.nevr_matches(s, name))
                })
                .collect();
            return Ok(list);
        }
        if is_empty_name(name) {
            let list = self
                .solvable_ids()
                .filter(|&p| {
                    let s = &self.solvables[p.index()];
                    s.arch == arch && self.considered(s)
                })
                .collect();
            return Ok(list);
        }
        Ok(self
            .provider_vec(name)?
            .into_iter()
            .filter(|p| self.solvables[p.index()].arch == arch)
            .collect())
    }

    fn kind_providers(&mut self, name: Id, kind: Id) -> Result<Vec<SolvableId>> {
        let kind_str = self.ids.resolve(kind).to_string();
        let candidates: Vec<SolvableId> = if is_empty_name(name) {
            self.solvable_ids()
                .filter(|&p| self.considered(&self.solvables[p.index()]))
                .collect()
        } else {
            self.provider_vec(name)?
        };
        Ok(candidates
            .into_iter()
            .filter(|p| {
                let s = &self.solvables[p.index()];
                is_kind(self.ids.resolve(s.name), kind, &kind_str)
            })
            .collect())
    }

    fn version_providers(
        &mut self,
        name: Id,
        flags: VersionFlags,
        evr: Id,
        dep: Id,
    ) -> Result<Vec<SolvableId>> {
        let candidates = self.provider_vec(name)?;
        let aux = match name.as_str_id() {
            Some(sid) => self.index.aux_list(sid).map(<[Id]>::to_vec),
            None => None,
        };
        let name = self.ids.dep_name(name);
        let op = RelOp::Version(flags);
        let deb = self.config.dist_type == DistType::Deb;

        let mut list = Vec::new();
        for (i, &p) in candidates.iter().enumerate() {
            let declared = aux.as_ref().and_then(|aux| aux.get(i)).copied();
            match declared {
                Some(pid) if pid.raw() > 1 => {
                    if self.provide_matches(pid, name, op, evr, deb) {
                        list.push(p);
                    }
                    continue;
                }
                _ => {}
            }

            let s = &self.solvables[p.index()];
            if s.provides.is_empty() {
                if self.nevr_rel_matches(s, dep) {
                    list.push(p);
                }
                continue;
            }
            let matched = self
                .solvable_deps(s, DepKind::Provides)
                .iter()
                .any(|&pid| self.provide_matches(pid, name, op, evr, deb));
            if matched {
                list.push(p);
            }
        }

        if list.is_empty() && self.ids.resolve(name).starts_with("rpmlib(") {
            list.push(SolvableId::SYSTEM);
        }
        Ok(list)
    }

    /// Whether one declared provide satisfies `name op evr`
    fn provide_matches(&self, pid: Id, name: Id, op: RelOp, evr: Id, deb: bool) -> bool {
        match self.ids.reldep(pid) {
            // unversioned provides never match versioned deps on Debian
            None => pid == name && !deb,
            Some(prd) => prd.name == name && self.intersect_evrs(prd.op, prd.evr, op, evr),
        }
    }

    /// Whether a provided range `pflags pevr` overlaps the requested range `flags evr`
    pub fn intersect_evrs(&self, pflags: RelOp, pevr: Id, flags: RelOp, evr: Id) -> bool {
        let (Some(pf), Some(f)) = (pflags.version_flags(), flags.version_flags()) else {
            return false;
        };
        if pf.is_empty() || f.is_empty() {
            return false;
        }
        if pf.is_all() || f.is_all() {
            return true;
        }
        if pf.intersects(f & (VersionFlags::LT | VersionFlags::GT)) {
            return true;
        }
        if pevr == evr {
            return pf.intersects(f & VersionFlags::EQ);
        }
        if let Some(range) = self.ids.reldep(pevr) {
            if range.op != RelOp::Compat {
                return false;
            }
            // (actual, compat): only `>` and `>=` queries see the compat version
            let eq = RelOp::Version(VersionFlags::EQ);
            if !f.contains(VersionFlags::GT) || f.contains(VersionFlags::LT) {
                return self.intersect_evrs(eq, range.name, flags, evr);
            }
            return self.intersect_evrs(RelOp::Version(VersionFlags::LE), range.name, flags, evr)
                && self.intersect_evrs(RelOp::Version(VersionFlags::GE), range.evr, eq, evr);
        }
        let ordering = self
            .comparator
            .depcmp(self.ids.resolve(pevr), self.ids.resolve(evr));
        match ordering {
            EvrOrdering::LeftMissingRelease => pf.contains(VersionFlags::EQ),
            EvrOrdering::Less => f.contains(VersionFlags::LT) || pf.contains(VersionFlags::GT),
            EvrOrdering::Equal => pf.intersects(f & VersionFlags::EQ),
            EvrOrdering::Greater => f.contains(VersionFlags::GT) || pf.contains(VersionFlags::LT),
            EvrOrdering::RightMissingRelease => f.contains(VersionFlags::EQ),
        }
    }

    /// Whether the name, version and arch of `sid` satisfy `dep`
    pub fn match_nevr(&self, sid: SolvableId, dep: Id) -> Result<bool> {
        let s = self.solvable(sid)?;
        Ok(self.nevr_matches(s, dep))
    }

    fn nevr_matches(&self, s: &Solvable, dep: Id) -> bool {
        if dep.is_rel() {
            self.nevr_rel_matches(s, dep)
        } else {
            dep == s.name
        }
    }

    fn nevr_rel_matches(&self, s: &Solvable, dep: Id) -> bool {
        let Some(rd) = self.ids.reldep(dep) else {
            return false;
        };
        let (name, evr) = (rd.name, rd.evr);
        let flags = match rd.op {
            RelOp::Arch => {
                if s.arch != evr && !(evr == known::ARCH_SRC && s.arch == known::ARCH_NOSRC) {
                    return false;
                }
                return self.nevr_matches(s, name);
            }
            RelOp::Or => return self.nevr_matches(s, name) || self.nevr_matches(s, evr),
            RelOp::And | RelOp::With => {
                return self.nevr_matches(s, name) && self.nevr_matches(s, evr)
            }
            RelOp::Multiarch => return evr == known::ARCH_ANY && self.nevr_matches(s, name),
            RelOp::Version(flags) => flags,
            _ => return false,
        };
        if !self.nevr_matches(s, name) {
            return false;
        }
        if evr == s.evr {
            return flags.contains(VersionFlags::EQ);
        }
        if flags.is_empty() {
            return false;
        }
        if flags.is_all() {
            return true;
        }
        match self
            .comparator
            .depcmp(self.ids.resolve(s.evr), self.ids.resolve(evr))
        {
            EvrOrdering::LeftMissingRelease => true,
            EvrOrdering::Less => flags.contains(VersionFlags::LT),
            EvrOrdering::Equal | EvrOrdering::RightMissingRelease => {
                flags.contains(VersionFlags::EQ)
            }
            EvrOrdering::Greater => flags.contains(VersionFlags::GT),
        }
    }

    /// Whether the provided dependency `provider` satisfies `dep`
    pub fn match_dep(&self, provider: Id, dep: Id) -> bool {
        if provider == dep {
            return true;
        }
        match (self.ids.reldep(provider), self.ids.reldep(dep)) {
            (None, None) => false,
            (None, Some(rd)) => self.match_dep(provider, rd.name),
            (Some(prd), None) => self.match_dep(prd.name, dep),
            (Some(prd), Some(rd)) => {
                self.match_dep(prd.name, rd.name)
                    && self.intersect_evrs(prd.op, prd.evr, rd.op, rd.evr)
            }
        }
    }

    /// Considered solvables whose `kind` list holds an entry matching `dep`
    pub fn whatmatchesdep(&self, kind: DepKind, dep: Id, marker: DepMarker) -> Result<Vec<SolvableId>> {
        let matches = self
            .solvable_ids()
            .filter(|&p| {
                let s = &self.solvables[p.index()];
                if !self.considered(s) {
                    return false;
                }
                marked_deps(self.solvable_deps(s, kind), marker)
                    .iter()
                    .any(|&entry| self.match_dep(entry, dep))
            })
            .collect();
        Ok(matches)
    }

    /// Forget cached namespace results so the callback is asked again.
    ///
    /// `ns` and `evr` restrict the flush to one namespace or argument.
    pub fn flush_namespace_providers(&mut self, ns: Option<Id>, evr: Option<Id>) {
        let mut flushed = 0usize;
        let entries = self.index.rel_entries_mut();
        for (rel_id, rd) in self.ids.rels() {
            if rd.op != RelOp::Namespace || rd.name == known::NAMESPACE_OTHERPROVIDERS {
                continue;
            }
            if ns.is_some_and(|ns| ns != rd.name) || evr.is_some_and(|evr| evr != rd.evr) {
                continue;
            }
            let Some(entry) = rel_id.as_rel_id().and_then(|rid| entries.get_mut(rid.index())) else {
                continue;
            };
            if *entry != UNSET {
                *entry = UNSET;
                flushed += 1;
            }
        }
        if flushed > 0 {
            log::debug!("flushed {} namespace provider entries", flushed);
        }
    }

    pub(crate) fn repo_disabled(&self, s: &Solvable) -> bool {
        s.repo
            .and_then(|repo| self.repos.get(repo.index()))
            .map_or(true, |repo| repo.disabled)
    }
}

/// The part of a dependency list selected by `marker`
pub(crate) fn marked_deps(list: &[Id], marker: DepMarker) -> &[Id] {
    match marker {
        DepMarker::None => list,
        DepMarker::Before(m) => match list.iter().position(|&id| id == m) {
            Some(pos) => &list[..pos],
            None => list,
        },
        DepMarker::After(m) => match list.iter().position(|&id| id == m) {
            Some(pos) => &list[pos + 1..],
            None => &[],
        },
    }
}
