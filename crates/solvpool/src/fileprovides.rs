//! File provides discovery
//!
//! Dependencies on absolute paths are satisfied by packages whose file list
//! contains the path. Discovery collects every path some package depends on,
//! searches the file lists once and records each hit as an explicit provide
//! behind `SOLVABLE_FILEMARKER`, so later index builds see them like any
//! other provide.

use std::collections::HashSet;
use std::time::Instant;

use crate::error::Result;
use crate::ids::{known, Id, RelOp};
use crate::pool::Pool;
use crate::relational::marked_deps;
use crate::repo::{DepMarker, RepoId};
use crate::repodata::{split_path, DirId};
use crate::solvable::{DepKind, SolvableId};
use crate::whatprovides::{StaleReason, UNSET};

/// Dependency kinds scanned for file dependencies
const FILE_DEP_KINDS: [DepKind; 7] = [
    DepKind::Obsoletes,
    DepKind::Conflicts,
    DepKind::Requires,
    DepKind::Recommends,
    DepKind::Suggests,
    DepKind::Supplements,
    DepKind::Enhances,
];

/// How far file provides discovery went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileProvidesMode {
    #[default]
    NotAdded,
    /// Only standard location paths were added for available packages
    Filtered,
    All,
}

/// Which repositories a discovery run searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileProvidesScope {
    #[default]
    All,
    /// Search only the installed repository, for every collected path
    InstalledOnly,
}

/// Outcome of [`Pool::add_file_provides`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileProvidesReport {
    /// Paths searched in all repositories
    pub available: Vec<Id>,
    /// Paths searched in the installed repository
    pub installed: Vec<Id>,
    created: usize,
}

impl FileProvidesReport {
    /// Number of file provides added to solvables
    pub fn created(&self) -> usize {
        self.created
    }
}

/// A file owned by `owner` that conflicts with the same path in `other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileConflict {
    pub file: Id,
    pub owner: SolvableId,
    /// Checksum of the owner's file content
    pub md5: Id,
    pub other: SolvableId,
}

#[derive(Debug, Default)]
struct Collector {
    ids: Vec<Id>,
    seen: HashSet<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Available,
    Installed,
}

impl Pool {
    /// Discover file provides and record them on the owning solvables.
    ///
    /// Marks a built index stale; rebuild it afterwards.
    pub fn add_file_provides(&mut self, scope: FileProvidesScope) -> Result<FileProvidesReport> {
        let started = Instant::now();
        self.file_provides_mode = if self.config.add_file_provides_filtered {
            FileProvidesMode::Filtered
        } else {
            FileProvidesMode::All
        };

        let (available, installed) = self.collect_file_deps();
        log::debug!(
            "found {} file dependencies, {} installed file dependencies",
            available.len(),
            installed.len()
        );

        let mut report = FileProvidesReport::default();
        match scope {
            FileProvidesScope::All => {
                if !available.is_empty() {
                    report.created += self.search_file_provides(&available, None)?;
                }
                if let (Some(repo), false) = (self.installed, installed.is_empty()) {
                    report.created += self.search_file_provides(&installed, Some(repo))?;
                }
                report.installed = available.clone();
                for id in installed {
                    if !report.installed.contains(&id) {
                        report.installed.push(id);
                    }
                }
                report.available = available;
            }
            FileProvidesScope::InstalledOnly => {
                let mut candidates = available;
                for id in installed {
                    if !candidates.contains(&id) {
                        candidates.push(id);
                    }
                }
                if let (Some(repo), false) = (self.installed, candidates.is_empty()) {
                    report.created += self.search_file_provides(&candidates, Some(repo))?;
                }
                report.installed = candidates;
            }
        }

        self.index.invalidate(StaleReason::FileProvidesAdded);
        log::debug!(
            "added {} file provides in {} ms",
            report.created,
            started.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Paths depended upon, split into the available and installed collectors
    fn collect_file_deps(&self) -> (Vec<Id>, Vec<Id>) {
        let mut available = Collector::default();
        let mut installed = Collector::default();
        let has_installed = self.installed.is_some();

        for s in self.solvables.iter().skip(1) {
            if s.repo.is_none() {
                continue;
            }
            for kind in FILE_DEP_KINDS {
                for &dep in self.solvable_deps(s, kind) {
                    self.collect_file_dep(dep, &mut available, &mut installed, has_installed);
                }
            }
        }
        (available.ids, installed.ids)
    }

    fn collect_file_dep(
        &self,
        dep: Id,
        available: &mut Collector,
        installed: &mut Collector,
        has_installed: bool,
    ) {
        let mut stack = vec![(dep, Target::Available)];
        while let Some((mut dep, mut target)) = stack.pop() {
            let mut stop = false;
            while let Some(rd) = self.ids.reldep(dep) {
                let collector = match target {
                    Target::Available => &mut *available,
                    Target::Installed => &mut *installed,
                };
                if !collector.seen.insert(dep) {
                    stop = true;
                    break;
                }
                match rd.op {
                    RelOp::Version(_) => dep = rd.name,
                    RelOp::Namespace => {
                        if rd.name == known::NAMESPACE_SPLITPROVIDES {
                            // split provides are only checked against installed packages
                            if !has_installed || !installed.seen.insert(dep) {
                                stop = true;
                                break;
                            }
                            target = Target::Installed;
                        }
                        dep = rd.evr;
                    }
                    RelOp::FileConflict => {
                        stop = true;
                        break;
                    }
                    _ => {
                        // the name is collected before the evr
                        stack.push((rd.evr, target));
                        stack.push((rd.name, target));
                        stop = true;
                        break;
                    }
                }
            }
            if stop || dep.is_null() {
                continue;
            }

            let collector = match target {
                Target::Available => &mut *available,
                Target::Installed => &mut *installed,
            };
            if !collector.seen.insert(dep) {
                continue;
            }
            let path = self.ids.resolve(dep);
            if !path.starts_with('/') {
                continue;
            }
            if target == Target::Available
                && self.file_provides_mode == FileProvidesMode::Filtered
                && !self.file_filter.matches(path)
            {
                continue;
            }
            collector.ids.push(dep);
        }
    }

    /// Search the file lists of one or all repositories for `candidates`
    fn search_file_provides(&mut self, candidates: &[Id], only: Option<RepoId>) -> Result<usize> {
        let paths: Vec<(String, String)> = candidates
            .iter()
            .map(|&id| {
                let (dir, base) = split_path(self.ids.resolve(id));
                (dir.to_string(), base.to_string())
            })
            .collect();

        let mut hits: Vec<(SolvableId, Id)> = Vec::new();
        let mut done: HashSet<SolvableId> = HashSet::new();

        for (repo_id, repo) in self.repos() {
            if only.is_some_and(|only| only != repo_id) || repo.disabled {
                continue;
            }
            let mut provided: HashSet<Id> = HashSet::new();
            let mut provided_range = (SolvableId::NULL, SolvableId::NULL);

            for data in repo.repodata() {
                if let Some(declared) = &data.added_file_provides {
                    provided = declared.iter().copied().collect();
                    provided_range = (data.start, data.end);
                    if candidates.iter().all(|id| provided.contains(id)) {
                        // nothing left to search in this chunk
                        for p in data.start.0..data.end.0 {
                            let p = SolvableId(p);
                            if self.solvables.get(p.index()).is_some_and(|s| s.repo == Some(repo_id)) {
                                done.insert(p);
                            }
                        }
                        continue;
                    }
                }
                if !data.has_filelist() {
                    continue;
                }
                if data.start < provided_range.0 || data.end > provided_range.1 {
                    provided.clear();
                    provided_range = (SolvableId::NULL, SolvableId::NULL);
                }

                let incomplete = data.filelist_filtered
                    && candidates.iter().any(|&id| {
                        !provided.contains(&id) && !self.file_filter.matches(self.ids.resolve(id))
                    });

                let dirs: Vec<Option<DirId>> =
                    paths.iter().map(|(dir, _)| data.lookup_dir(dir)).collect();
                for p in data.start.0..data.end.0 {
                    let p = SolvableId(p);
                    if done.contains(&p)
                        || !self.solvables.get(p.index()).is_some_and(|s| s.repo == Some(repo_id))
                    {
                        continue;
                    }
                    for (i, &id) in candidates.iter().enumerate() {
                        if provided.contains(&id) {
                            continue;
                        }
                        if let Some(dir) = dirs[i] {
                            if data.has_file(p, dir, &paths[i].1) {
                                hits.push((p, id));
                            }
                        }
                    }
                    if !incomplete {
                        done.insert(p);
                    }
                }
            }
        }

        let mut created = 0;
        for (p, id) in hits {
            let existing = marked_deps(
                self.deps(p, DepKind::Provides),
                DepMarker::After(known::SOLVABLE_FILEMARKER),
            );
            if existing.contains(&id) {
                continue;
            }
            log::trace!("{} provides {}", p, self.ids.resolve(id));
            self.push_dep(p, DepKind::Provides, id, DepMarker::After(known::SOLVABLE_FILEMARKER))?;
            created += 1;
        }
        Ok(created)
    }

    /// Record detected file conflicts as provide/conflict pairs.
    ///
    /// A built index is updated in place instead of being marked stale.
    pub fn add_fileconflicts_deps(&mut self, conflicts: &[FileConflict]) -> Result<()> {
        let built = self.ensure_index().is_ok();
        for conflict in conflicts {
            let id = self
                .ids
                .intern_rel(conflict.file, conflict.md5, RelOp::FileConflict);
            if self.solvable(conflict.owner)?.repo.is_none() {
                continue;
            }
            self.push_dep(
                conflict.owner,
                DepKind::Provides,
                id,
                DepMarker::After(known::SOLVABLE_FILEMARKER),
            )?;
            if built {
                self.add_new_provider(conflict.file, conflict.owner)?;
                if let Some(rid) = id.as_rel_id() {
                    self.index.set_rel(rid, UNSET);
                }
            }
            if self.solvable(conflict.other)?.repo.is_none() {
                continue;
            }
            self.push_dep(conflict.other, DepKind::Conflicts, id, DepMarker::None)?;
        }
        Ok(())
    }
}
