//! Trivial installability
//!
//! A candidate is trivially installable when it can join the installed set
//! without any other package being installed or removed: every requirement
//! is met by an installed package or by another such candidate, and nothing
//! it conflicts with is installed.

use std::collections::HashSet;

use bitflags::bitflags;

use crate::error::Result;
use crate::ids::{known, Id};
use crate::pool::Pool;
use crate::solvable::{DepKind, SolvableId};

bitflags! {
    /// Classification bits of one solvable
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstallState: u8 {
        const INSTALLED = 1;
        const CONFLICTS = 2;
        /// Installed and constrained by the candidate
        const INTERESTING = 8;
        const UNDECIDED = 16;
    }
}

impl InstallState {
    const INSTALLED_INTERESTING: InstallState = InstallState::INSTALLED.union(InstallState::INTERESTING);

    fn is_installed_interesting(self) -> bool {
        self.contains(Self::INSTALLED_INTERESTING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Installability {
    NotInstallable,
    /// Installable and depends on or replaces installed packages
    Installable,
    /// Installable without touching the installed packages at all
    InstallableNonConstraining,
}

impl From<InstallState> for Installability {
    fn from(state: InstallState) -> Self {
        if state.is_installed_interesting() {
            Installability::Installable
        } else if state.contains(InstallState::INSTALLED) {
            Installability::InstallableNonConstraining
        } else {
            Installability::NotInstallable
        }
    }
}

impl Pool {
    /// Classify each candidate against the `installed` set.
    ///
    /// The index must be built. Patch candidates (`patch:` names) conflict
    /// only by exact NEVR; for packages in `multiversion` such a conflict is
    /// ignored when another installed version of the same name and arch
    /// does not match it.
    pub fn trivial_installable(
        &mut self,
        installed: &HashSet<SolvableId>,
        candidates: &[SolvableId],
        multiversion: Option<&HashSet<SolvableId>>,
    ) -> Result<Vec<Installability>> {
        self.ensure_index()?;
        for &p in candidates {
            self.solvable(p)?;
        }

        let mut map = vec![InstallState::empty(); self.solvables.len()];
        for i in 1..self.solvables.len() {
            if !installed.contains(&SolvableId(i as u32)) {
                continue;
            }
            map[i] |= InstallState::INSTALLED_INTERESTING;
        }
        for &p in candidates {
            // an installed candidate has its own conflicts checked below
            map[p.index()] = InstallState::UNDECIDED;
        }

        let count = candidates.len();
        let mut i = 0;
        let mut did = 0;
        while did < count {
            if i == count {
                i = 0;
            }
            let p = candidates[i];
            i += 1;
            did += 1;

            if !map[p.index()].contains(InstallState::UNDECIDED) {
                continue;
            }

            let mut m = InstallState::INSTALLED;
            let mut deferred = false;
            let mut decided = false;
            for req in self.deps(p, DepKind::Requires).to_vec() {
                if req == known::SOLVABLE_PREREQMARKER {
                    continue;
                }
                let r = self.provided_by_installed(&map, req, false, None)?;
                if r.is_empty() {
                    // decided and missing
                    map[p.index()] = InstallState::CONFLICTS;
                    did = 0;
                    decided = true;
                    break;
                }
                if r == InstallState::UNDECIDED {
                    deferred = true;
                    break;
                }
                m |= r;
            }
            if decided || deferred {
                continue;
            }
            if m.is_installed_interesting() {
                m = InstallState::INSTALLED_INTERESTING;
            }

            let is_patch = self.ids.resolve(self.solvables[p.index()].name).starts_with("patch:");
            let mut conflicting = false;
            for con in self.deps(p, DepKind::Conflicts).to_vec() {
                let r = self.provided_by_installed(&map, con, is_patch, multiversion)?;
                if r.contains(InstallState::INSTALLED) {
                    map[p.index()] = InstallState::CONFLICTS;
                    did = 0;
                    conflicting = true;
                    break;
                }
                let non_constraining =
                    m == InstallState::INSTALLED || m == InstallState::INSTALLED | InstallState::UNDECIDED;
                if non_constraining && con.is_rel() {
                    // replacing an installed package of that name constrains it
                    let name = self.ids.dep_name(con);
                    let r = self.provided_by_installed(&map, name, is_patch, multiversion)?;
                    if r.contains(InstallState::INSTALLED) {
                        m = InstallState::INSTALLED_INTERESTING;
                    }
                }
            }
            if conflicting {
                continue;
            }

            if m != map[p.index()] {
                log::trace!("{} -> {:?}", p, m);
                map[p.index()] = m;
                did = 0;
            }
        }

        Ok(candidates
            .iter()
            .map(|p| Installability::from(map[p.index()]))
            .collect())
    }

    fn provided_by_installed(
        &mut self,
        map: &[InstallState],
        dep: Id,
        is_patch: bool,
        multiversion: Option<&HashSet<SolvableId>>,
    ) -> Result<InstallState> {
        let mut r = InstallState::empty();
        for p in self.provider_vec(dep)? {
            if p == SolvableId::SYSTEM {
                // never constraining
                return Ok(InstallState::INSTALLED);
            }
            if is_patch && !self.match_nevr(p, dep)? {
                continue;
            }
            if is_patch
                && dep.is_rel()
                && multiversion.is_some_and(|mv| mv.contains(&p))
                && self.other_version_installed(map, p, dep)?
            {
                continue;
            }
            let state = map[p.index()];
            if state.is_installed_interesting() {
                return Ok(InstallState::INSTALLED_INTERESTING);
            }
            r |= state & (InstallState::INSTALLED | InstallState::UNDECIDED);
        }
        Ok(r)
    }

    /// Whether an installed version of `n`'s name and arch does not match `con`
    fn other_version_installed(&mut self, map: &[InstallState], n: SolvableId, con: Id) -> Result<bool> {
        let (name, arch) = {
            let s = self.solvable(n)?;
            (s.name, s.arch)
        };
        for p in self.provider_vec(name)? {
            let s = &self.solvables[p.index()];
            if s.name != name || s.arch != arch {
                continue;
            }
            if !map[p.index()].is_installed_interesting() {
                continue;
            }
            if self.match_nevr(p, con)? {
                continue;
            }
            return Ok(true);
        }
        Ok(false)
    }
}
