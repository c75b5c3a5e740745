//! Per-repository metadata chunks holding file lists

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::RegexSet;

use crate::error::Result;
use crate::ids::Id;
use crate::solvable::SolvableId;

lazy_static! {
    /// Paths every primary metadata file list carries, even when filtered
    static ref STANDARD_LOCATIONS: RegexSet = RegexSet::new([
        r"bin/",
        r"^/etc/",
        r"^/usr/lib/sendmail$",
    ])
    .unwrap_or_else(|_| RegexSet::empty());
}

/// Decides whether a path belongs to the standard locations of a filtered file list
pub trait FileFilter: fmt::Debug {
    fn matches(&self, path: &str) -> bool;
}

/// Regex based [`FileFilter`]
#[derive(Debug, Clone)]
pub struct StandardLocations {
    patterns: RegexSet,
}

impl StandardLocations {
    /// Build a filter from custom patterns
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            patterns: RegexSet::new(patterns)?,
        })
    }
}

impl Default for StandardLocations {
    /// `*bin/*`, `/etc/*` and `/usr/lib/sendmail`
    fn default() -> Self {
        Self {
            patterns: STANDARD_LOCATIONS.clone(),
        }
    }
}

impl FileFilter for StandardLocations {
    fn matches(&self, path: &str) -> bool {
        self.patterns.is_match(path)
    }
}

/// Directory id inside a [`DirPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirId(pub u32);

impl DirId {
    pub const ROOT: DirId = DirId(1);
}

/// Directory trie; each entry is a `(parent, component)` pair
#[derive(Debug, Clone)]
pub struct DirPool {
    dirs: IndexSet<(u32, String)>,
}

impl Default for DirPool {
    fn default() -> Self {
        let mut dirs = IndexSet::new();
        dirs.insert((0, "<invalid>".to_string()));
        dirs.insert((0, String::new()));
        Self { dirs }
    }
}

impl DirPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a directory path, optionally creating missing components
    pub fn str2dir(&mut self, path: &str, create: bool) -> Option<DirId> {
        if !create {
            return self.lookup(path);
        }
        let mut parent = DirId::ROOT.0;
        for comp in path.split('/').filter(|c| !c.is_empty()) {
            let (index, _) = self.dirs.insert_full((parent, comp.to_string()));
            parent = index as u32;
        }
        Some(DirId(parent))
    }

    /// Resolve a directory path without creating anything
    pub fn lookup(&self, path: &str) -> Option<DirId> {
        let mut parent = DirId::ROOT.0;
        for comp in path.split('/').filter(|c| !c.is_empty()) {
            let index = self.dirs.get_index_of(&(parent, comp.to_string()))?;
            parent = index as u32;
        }
        Some(DirId(parent))
    }

    pub fn dir2str(&self, dir: DirId) -> String {
        let mut comps = Vec::new();
        let mut current = dir.0;
        while current > DirId::ROOT.0 {
            let Some((parent, comp)) = self.dirs.get_index(current as usize) else {
                break;
            };
            comps.push(comp.as_str());
            current = *parent;
        }
        comps.reverse();
        format!("/{}", comps.join("/"))
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.len() <= 2
    }
}

/// One metadata chunk covering a range of solvables of a repo
#[derive(Debug, Clone, Default)]
pub struct Repodata {
    /// First solvable covered
    pub start: SolvableId,
    /// One past the last solvable covered
    pub end: SolvableId,
    pub dirs: DirPool,
    filelists: BTreeMap<SolvableId, Vec<(DirId, String)>>,

    /// File provides this chunk declares as already added
    pub added_file_provides: Option<Vec<Id>>,

    /// The file lists only hold standard location paths
    pub filelist_filtered: bool,
}

impl Repodata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the covered range so it includes `sid`
    pub fn cover(&mut self, sid: SolvableId) {
        if self.end.is_null() {
            self.start = sid;
            self.end = SolvableId(sid.0 + 1);
            return;
        }
        if sid < self.start {
            self.start = sid;
        }
        if sid >= self.end {
            self.end = SolvableId(sid.0 + 1);
        }
    }

    pub fn covers(&self, sid: SolvableId) -> bool {
        sid >= self.start && sid < self.end
    }

    /// Record a file of `sid`
    pub fn add_file(&mut self, sid: SolvableId, path: &str) {
        let (dir, basename) = split_path(path);
        if let Some(did) = self.dirs.str2dir(dir, true) {
            self.cover(sid);
            self.filelists
                .entry(sid)
                .or_default()
                .push((did, basename.to_string()));
        }
    }

    pub fn has_filelist(&self) -> bool {
        !self.filelists.is_empty()
    }

    pub fn has_file(&self, sid: SolvableId, dir: DirId, basename: &str) -> bool {
        self.filelists
            .get(&sid)
            .is_some_and(|files| files.iter().any(|(d, b)| *d == dir && b == basename))
    }

    /// Directory id of `dir`, if any file lives there
    pub fn lookup_dir(&self, dir: &str) -> Option<DirId> {
        self.dirs.lookup(dir)
    }

    /// Solvables of this chunk that carry `path`, ascending
    pub fn solvables_with_file(&self, path: &str) -> Vec<SolvableId> {
        let (dir, basename) = split_path(path);
        let Some(did) = self.lookup_dir(dir) else {
            return Vec::new();
        };
        self.filelists
            .iter()
            .filter(|(_, files)| files.iter().any(|(d, b)| *d == did && b == basename))
            .map(|(sid, _)| *sid)
            .collect()
    }

    pub fn files(&self, sid: SolvableId) -> Vec<String> {
        self.filelists
            .get(&sid)
            .map(|files| {
                files
                    .iter()
                    .map(|(dir, base)| {
                        let dir = self.dirs.dir2str(*dir);
                        if dir == "/" {
                            format!("/{}", base)
                        } else {
                            format!("{}/{}", dir, base)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Split an absolute path into directory and basename
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_locations() {
        let filter = StandardLocations::default();
        assert!(filter.matches("/usr/bin/foo"));
        assert!(filter.matches("/sbin/init"));
        assert!(filter.matches("/etc/passwd"));
        assert!(filter.matches("/usr/lib/sendmail"));
        assert!(!filter.matches("/usr/lib/sendmail.cf"));
        assert!(!filter.matches("/usr/share/doc/foo"));
    }

    #[test]
    fn test_custom_filter() {
        let filter = StandardLocations::new(["^/opt/"]).unwrap();
        assert!(filter.matches("/opt/tool"));
        assert!(!filter.matches("/usr/bin/foo"));
        assert!(StandardLocations::new(["("]).is_err());
    }

    #[test]
    fn test_dirpool() {
        let mut dirs = DirPool::new();
        assert!(dirs.is_empty());
        let bin = dirs.str2dir("/usr/bin", true).unwrap();
        assert_eq!(dirs.str2dir("/usr/bin", false), Some(bin));
        assert_eq!(dirs.lookup("/usr/sbin"), None);
        assert_eq!(dirs.lookup("/"), Some(DirId::ROOT));
        assert_eq!(dirs.dir2str(bin), "/usr/bin");
        assert_eq!(dirs.dir2str(DirId::ROOT), "/");
    }

    #[test]
    fn test_filelists() {
        let mut data = Repodata::new();
        data.add_file(SolvableId(5), "/usr/bin/foo");
        data.add_file(SolvableId(3), "/usr/bin/bar");
        data.add_file(SolvableId(3), "/README");
        assert_eq!(data.start, SolvableId(3));
        assert_eq!(data.end, SolvableId(6));
        assert!(data.covers(SolvableId(4)));

        let bin = data.lookup_dir("/usr/bin").unwrap();
        assert!(data.has_file(SolvableId(5), bin, "foo"));
        assert!(!data.has_file(SolvableId(3), bin, "foo"));
        assert_eq!(data.solvables_with_file("/usr/bin/bar"), vec![SolvableId(3)]);
        assert!(data.solvables_with_file("/usr/sbin/bar").is_empty());
        assert_eq!(data.files(SolvableId(3)), vec!["/usr/bin/bar", "/README"]);
    }
}
