use std::collections::HashSet;

use solvpool_evr::EvrComparator;

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::fileprovides::FileProvidesMode;
use crate::ids::{known, Id, IdPool, RelOp, VersionFlags};
use crate::relational::NamespaceProvider;
use crate::repo::{DepMarker, Repo, RepoId};
use crate::repodata::{FileFilter, Repodata, StandardLocations};
use crate::solvable::{DepKind, Solvable, SolvableId};
use crate::whatprovides::{StaleReason, WhatProvides};

/// Pool of all solvables and the indexes built over them.
///
/// The pool owns the identifier tables, the solvable store, the repositories
/// and the WhatProvides index. Mutating the store marks the index stale; it
/// has to be rebuilt with [`Pool::create_whatprovides`] before the next query.
pub struct Pool {
    pub(crate) ids: IdPool,

    /// Solvables indexed by id; 0 is a sentinel, 1 the system solvable
    pub(crate) solvables: Vec<Solvable>,

    pub(crate) repos: Vec<Repo>,

    pub(crate) installed: Option<RepoId>,

    pub(crate) config: PoolConfig,

    /// Architecture id used for architecture independent packages
    pub(crate) noarch: Id,

    /// Installable architectures, all when unset
    pub(crate) compatible_archs: Option<HashSet<Id>>,

    pub(crate) comparator: Box<dyn EvrComparator>,

    pub(crate) namespace_provider: Option<Box<dyn NamespaceProvider>>,

    pub(crate) file_filter: Box<dyn FileFilter>,

    pub(crate) file_provides_mode: FileProvidesMode,

    pub(crate) index: WhatProvides,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("solvables", &self.solvables.len())
            .field("repos", &self.repos.iter().map(|r| r.name.as_str()).collect::<Vec<_>>())
            .field("installed", &self.installed)
            .field("config", &self.config)
            .field("comparator", &self.comparator)
            .field("namespace_provider", &self.namespace_provider.is_some())
            .field("file_provides_mode", &self.file_provides_mode)
            .field("index", &self.index)
            .finish()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Create a new empty pool with RPM semantics
    pub fn new() -> Self {
        Self::build(PoolConfig::default(), Box::new(StandardLocations::default()))
    }

    /// Create a pool following `config`
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        let filter = config.file_filter()?;
        Ok(Self::build(config, Box::new(filter)))
    }

    fn build(config: PoolConfig, file_filter: Box<dyn FileFilter>) -> Self {
        let mut ids = IdPool::new();
        let noarch = config.dist_type.noarch();
        let compatible_archs = config.compatible_archs.as_ref().map(|archs| {
            let mut set: HashSet<Id> = archs.iter().map(|a| ids.intern(a)).collect();
            set.insert(noarch);
            set
        });
        let comparator = Box::new(config.dist_type.comparator(config.promote_epoch));
        Self {
            ids,
            solvables: vec![Solvable::default(), Solvable::system(noarch)],
            repos: Vec::new(),
            installed: None,
            noarch,
            compatible_archs,
            comparator,
            namespace_provider: None,
            file_filter,
            file_provides_mode: FileProvidesMode::NotAdded,
            index: WhatProvides::new(),
            config,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn ids(&self) -> &IdPool {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut IdPool {
        &mut self.ids
    }

    /// Intern a string
    pub fn str2id(&mut self, s: &str) -> Id {
        self.ids.intern(s)
    }

    /// Intern a relation
    pub fn rel2id(&mut self, name: Id, evr: Id, op: RelOp) -> Id {
        self.ids.intern_rel(name, evr, op)
    }

    /// Intern a versioned dependency such as `name >= evr`
    pub fn version_dep(&mut self, name: &str, flags: VersionFlags, evr: &str) -> Id {
        let name = self.ids.intern(name);
        let evr = self.ids.intern(evr);
        self.ids.intern_rel(name, evr, RelOp::Version(flags))
    }

    pub fn id2str(&self, id: Id) -> &str {
        self.ids.resolve(id)
    }

    pub fn dep2str(&self, id: Id) -> String {
        self.ids.dep2str(id)
    }

    /// Replace the version comparator
    pub fn set_comparator(&mut self, comparator: Box<dyn EvrComparator>) {
        self.comparator = comparator;
        self.index.invalidate(StaleReason::Explicit);
    }

    pub fn comparator(&self) -> &dyn EvrComparator {
        self.comparator.as_ref()
    }

    /// Install the callback answering namespace dependencies
    pub fn set_namespace_provider(&mut self, provider: Option<Box<dyn NamespaceProvider>>) {
        self.namespace_provider = provider;
        self.flush_namespace_providers(None, None);
    }

    /// Replace the standard file location filter
    pub fn set_file_filter(&mut self, filter: Box<dyn FileFilter>) {
        self.file_filter = filter;
        self.index.invalidate(StaleReason::Explicit);
    }

    /// Add an empty repository
    pub fn add_repo(&mut self, name: &str) -> RepoId {
        let id = RepoId(self.repos.len() as u32);
        self.repos.push(Repo::new(name));
        log::trace!("Added {} ({})", id, name);
        id
    }

    pub fn repo(&self, repo: RepoId) -> Result<&Repo> {
        self.repos.get(repo.index()).ok_or(PoolError::UnknownRepo(repo))
    }

    pub fn repo_mut(&mut self, repo: RepoId) -> Result<&mut Repo> {
        self.repos.get_mut(repo.index()).ok_or(PoolError::UnknownRepo(repo))
    }

    pub fn repos(&self) -> impl Iterator<Item = (RepoId, &Repo)> {
        self.repos
            .iter()
            .enumerate()
            .map(|(i, repo)| (RepoId(i as u32), repo))
    }

    pub fn set_repo_disabled(&mut self, repo: RepoId, disabled: bool) -> Result<()> {
        let r = self.repo_mut(repo)?;
        if r.disabled != disabled {
            r.disabled = disabled;
            self.index.invalidate(StaleReason::RepoChanged);
        }
        Ok(())
    }

    /// Designate the repository holding the installed packages
    pub fn set_installed(&mut self, repo: Option<RepoId>) -> Result<()> {
        if let Some(repo) = repo {
            self.repo(repo)?;
        }
        if self.installed != repo {
            self.installed = repo;
            self.index.invalidate(StaleReason::InstalledChanged);
        }
        Ok(())
    }

    pub fn installed(&self) -> Option<RepoId> {
        self.installed
    }

    /// Add a solvable to `repo`
    pub fn add_solvable(&mut self, repo: RepoId, name: &str, evr: &str, arch: &str) -> Result<SolvableId> {
        self.repo(repo)?;
        let solvable = Solvable {
            name: self.ids.intern(name),
            evr: self.ids.intern(evr),
            arch: self.ids.intern(arch),
            repo: Some(repo),
            ..Solvable::default()
        };
        let sid = SolvableId(self.solvables.len() as u32);
        self.solvables.push(solvable);
        self.repos[repo.index()].solvables.push(sid);
        self.index.invalidate(StaleReason::SolvablesAdded);
        Ok(sid)
    }

    pub fn solvable(&self, sid: SolvableId) -> Result<&Solvable> {
        if sid.is_null() {
            return Err(PoolError::UnknownSolvable(sid));
        }
        self.solvables.get(sid.index()).ok_or(PoolError::UnknownSolvable(sid))
    }

    pub fn solvable_mut(&mut self, sid: SolvableId) -> Result<&mut Solvable> {
        if sid.is_null() {
            return Err(PoolError::UnknownSolvable(sid));
        }
        self.solvables.get_mut(sid.index()).ok_or(PoolError::UnknownSolvable(sid))
    }

    /// Number of solvable slots including the sentinel and the system solvable
    pub fn solvable_count(&self) -> usize {
        self.solvables.len()
    }

    /// Ids of all solvables that belong to a repository
    pub fn solvable_ids(&self) -> impl Iterator<Item = SolvableId> + '_ {
        (2..self.solvables.len())
            .map(|i| SolvableId(i as u32))
            .filter(|sid| self.solvables[sid.index()].repo.is_some())
    }

    /// The dependency list of the given kind; empty for unknown solvables
    pub fn deps(&self, sid: SolvableId, kind: DepKind) -> &[Id] {
        match self.solvables.get(sid.index()) {
            Some(s) => self.solvable_deps(s, kind),
            None => &[],
        }
    }

    pub(crate) fn solvable_deps(&self, s: &Solvable, kind: DepKind) -> &[Id] {
        match s.repo.and_then(|repo| self.repos.get(repo.index())) {
            Some(repo) => repo.dep_list(s.deps(kind)),
            None => &[],
        }
    }

    /// Add a dependency to one of the solvable's lists
    pub fn add_dep(&mut self, sid: SolvableId, kind: DepKind, dep: Id, marker: DepMarker) -> Result<()> {
        self.push_dep(sid, kind, dep, marker)?;
        if kind == DepKind::Provides {
            self.index.invalidate(StaleReason::SolvablesAdded);
        }
        Ok(())
    }

    /// Add a dependency without touching the index state
    pub(crate) fn push_dep(&mut self, sid: SolvableId, kind: DepKind, dep: Id, marker: DepMarker) -> Result<()> {
        let solvable = self.solvable(sid)?;
        let repo_id = solvable.repo.ok_or(PoolError::UnknownSolvable(sid))?;
        let offset = solvable.deps(kind);
        let repo = self.repo_mut(repo_id)?;
        let offset = repo.add_id_dep(offset, dep, marker);
        *self.solvables[sid.index()].deps_mut(kind) = offset;
        Ok(())
    }

    /// Add the `name = evr` provide every package carries for itself
    pub fn add_self_provides(&mut self, sid: SolvableId) -> Result<()> {
        let solvable = self.solvable(sid)?;
        let (name, evr) = (solvable.name, solvable.evr);
        let dep = self.ids.intern_rel(name, evr, RelOp::Version(VersionFlags::EQ));
        self.add_dep(sid, DepKind::Provides, dep, DepMarker::None)
    }

    /// Add a metadata chunk to `repo`
    pub fn add_repodata(&mut self, repo: RepoId) -> Result<&mut Repodata> {
        let r = self.repo_mut(repo)?;
        r.repodata.push(Repodata::new());
        let index = r.repodata.len() - 1;
        Ok(&mut r.repodata[index])
    }

    /// Add a file to the file list of `sid`, in the last metadata chunk of its repo
    pub fn add_file(&mut self, sid: SolvableId, path: &str) -> Result<()> {
        let repo_id = self.solvable(sid)?.repo.ok_or(PoolError::UnknownSolvable(sid))?;
        let repo = self.repo_mut(repo_id)?;
        if repo.repodata.is_empty() {
            repo.repodata.push(Repodata::new());
        }
        if let Some(data) = repo.repodata.last_mut() {
            data.add_file(sid, path);
        }
        Ok(())
    }

    /// Whether the solvable could be installed on this system at all
    pub fn installable(&self, sid: SolvableId) -> bool {
        match self.solvables.get(sid.index()) {
            Some(s) if sid.index() > 1 => {
                let enabled = s
                    .repo
                    .and_then(|repo| self.repos.get(repo.index()))
                    .is_some_and(|repo| !repo.disabled);
                enabled && self.arch_installable(s)
            }
            _ => false,
        }
    }

    pub(crate) fn arch_installable(&self, s: &Solvable) -> bool {
        if s.arch.is_null() || s.arch == known::ARCH_SRC || s.arch == known::ARCH_NOSRC {
            return false;
        }
        match &self.compatible_archs {
            Some(archs) => archs.contains(&s.arch),
            None => true,
        }
    }

    /// Solvables taking part in the index: enabled repo, installed or installable
    pub(crate) fn considered(&self, s: &Solvable) -> bool {
        let Some(repo_id) = s.repo else {
            return false;
        };
        match self.repos.get(repo_id.index()) {
            Some(repo) if !repo.disabled => {
                self.installed == Some(repo_id) || self.arch_installable(s)
            }
            _ => false,
        }
    }
}
