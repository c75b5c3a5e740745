//! Full `epoch:version-release` comparison

use std::cmp::Ordering;
use std::fmt;

use crate::vercmp::VersionScheme;

/// How two EVR strings are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvrCmpMode {
    /// Total order; a missing release sorts before any release
    Compare,
    /// Like `Compare`, but a missing release on either side is reported as
    /// [`EvrOrdering::LeftMissingRelease`] / [`EvrOrdering::RightMissingRelease`]
    /// when the epoch and version are equal. An empty release (`4-`) counts as missing.
    MatchRelease,
    /// Pattern match: empty epochs, versions or releases match anything
    Match,
    /// Compare epoch and version only
    CompareEvOnly,
}

/// Outcome of an EVR comparison.
///
/// Besides the usual three outcomes, dependency matching distinguishes the
/// case where epoch and version are equal but only one side carries a
/// release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvrOrdering {
    Less,
    /// Versions equal, the left side has no release (`-2`)
    LeftMissingRelease,
    Equal,
    Greater,
    /// Versions equal, the right side has no release (`2`)
    RightMissingRelease,
}

impl EvrOrdering {
    /// Numeric form (`-2..=2`)
    pub fn as_i8(self) -> i8 {
        match self {
            EvrOrdering::LeftMissingRelease => -2,
            EvrOrdering::Less => -1,
            EvrOrdering::Equal => 0,
            EvrOrdering::Greater => 1,
            EvrOrdering::RightMissingRelease => 2,
        }
    }

    /// Collapse to a plain ordering, treating missing releases as equal
    pub fn to_ordering(self) -> Ordering {
        match self {
            EvrOrdering::Less => Ordering::Less,
            EvrOrdering::Greater => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

impl From<Ordering> for EvrOrdering {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => EvrOrdering::Less,
            Ordering::Equal => EvrOrdering::Equal,
            Ordering::Greater => EvrOrdering::Greater,
        }
    }
}

/// Options shared by every comparison of a comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CmpOptions {
    pub scheme: VersionScheme,
    /// A side without an epoch takes the epoch of the other side
    pub promote_epoch: bool,
}

fn skip_zeros(s: &[u8], mut pos: usize) -> usize {
    while pos < s.len() && s[pos] == b'0' {
        pos += 1;
    }
    pos
}

fn epoch_end(s: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < s.len() && s[pos].is_ascii_digit() {
        pos += 1;
    }
    pos
}

/// Compare two EVR strings.
///
/// The epoch is the leading run of digits terminated by `:`, the release is
/// everything after the last `-`.
pub fn evrcmp(evr1: &str, evr2: &str, mode: EvrCmpMode, opts: CmpOptions) -> EvrOrdering {
    if evr1 == evr2 {
        return EvrOrdering::Equal;
    }
    let b1 = evr1.as_bytes();
    let b2 = evr2.as_bytes();
    let cmp = |a: &[u8], b: &[u8]| opts.scheme.compare(a, b);

    let (mut start1, mut start2) = (0usize, 0usize);
    let mut s1 = epoch_end(b1, 0);
    let mut s2 = epoch_end(b2, 0);
    if mode == EvrCmpMode::Match && (b1.first() == Some(&b':') || b2.first() == Some(&b':')) {
        // an empty epoch on either side disables the epoch check
        if b1.get(s1) == Some(&b':') {
            start1 = s1 + 1;
        }
        if b2.get(s2) == Some(&b':') {
            start2 = s2 + 1;
        }
        s1 = start1;
        s2 = start2;
    }
    let colon1 = (s1 != start1 && b1.get(s1) == Some(&b':')).then_some(s1);
    let colon2 = (s2 != start2 && b2.get(s2) == Some(&b':')).then_some(s2);

    match (colon1, colon2) {
        (Some(c1), Some(c2)) => {
            let r = cmp(&b1[start1..c1], &b2[start2..c2]);
            if r != Ordering::Equal {
                return r.into();
            }
            start1 = c1 + 1;
            start2 = c2 + 1;
        }
        (Some(c1), None) => {
            if !opts.promote_epoch && skip_zeros(b1, start1) != c1 {
                return EvrOrdering::Greater;
            }
            start1 = c1 + 1;
        }
        (None, Some(c2)) => {
            if skip_zeros(b2, start2) != c2 {
                return EvrOrdering::Less;
            }
            start2 = c2 + 1;
        }
        (None, None) => {}
    }

    let mut rel1 = b1[start1..].iter().rposition(|&c| c == b'-').map(|p| p + start1);
    let mut rel2 = b2[start2..].iter().rposition(|&c| c == b'-').map(|p| p + start2);
    let v1_end = rel1.unwrap_or(b1.len());
    let v2_end = rel2.unwrap_or(b2.len());

    let mut r = Ordering::Equal;
    if mode != EvrCmpMode::Match || (start1 != v1_end && start2 != v2_end) {
        r = cmp(&b1[start1..v1_end], &b2[start2..v2_end]);
    }
    if r != Ordering::Equal {
        return r.into();
    }

    match mode {
        EvrCmpMode::Compare => {
            if rel1.is_none() && rel2.is_some() {
                return EvrOrdering::Less;
            }
            if rel1.is_some() && rel2.is_none() {
                return EvrOrdering::Greater;
            }
        }
        EvrCmpMode::CompareEvOnly => return EvrOrdering::Equal,
        EvrCmpMode::MatchRelease => {
            // "foo = 4-" is the same as "foo = 4"
            if rel1 == Some(b1.len() - 1) {
                rel1 = None;
            }
            if rel2 == Some(b2.len() - 1) {
                rel2 = None;
            }
        }
        EvrCmpMode::Match => {}
    }

    match (rel1, rel2) {
        (Some(r1), Some(r2)) => {
            let release1 = &b1[r1 + 1..];
            let release2 = &b2[r2 + 1..];
            if mode != EvrCmpMode::Match || (!release1.is_empty() && !release2.is_empty()) {
                r = cmp(release1, release2);
            }
            r.into()
        }
        (None, Some(_)) if mode == EvrCmpMode::MatchRelease => EvrOrdering::LeftMissingRelease,
        (Some(_), None) if mode == EvrCmpMode::MatchRelease => EvrOrdering::RightMissingRelease,
        _ => r.into(),
    }
}

/// Pluggable EVR comparison used by the pool when matching dependencies.
///
/// The comparator decides the dependency tie-break policy through
/// [`EvrComparator::dep_mode`]; distributions differ in whether a missing
/// release on a dependency means "any release".
pub trait EvrComparator: fmt::Debug {
    /// Compare `evr1` with `evr2` in the given mode
    fn evrcmp(&self, evr1: &str, evr2: &str, mode: EvrCmpMode) -> EvrOrdering;

    /// Mode used when comparing a provided EVR against a required EVR
    fn dep_mode(&self) -> EvrCmpMode;

    /// Compare using the dependency mode
    fn depcmp(&self, evr1: &str, evr2: &str) -> EvrOrdering {
        self.evrcmp(evr1, evr2, self.dep_mode())
    }
}

/// Comparator configured for one distribution family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistComparator {
    options: CmpOptions,
    dep_mode: EvrCmpMode,
}

impl DistComparator {
    /// RPM semantics: `Requires: foo = 1.0` matches any release of 1.0
    pub fn rpm() -> Self {
        Self {
            options: CmpOptions { scheme: VersionScheme::Rpm, promote_epoch: false },
            dep_mode: EvrCmpMode::MatchRelease,
        }
    }

    /// Debian semantics: strict comparison, dpkg ordering
    pub fn debian() -> Self {
        Self {
            options: CmpOptions { scheme: VersionScheme::Debian, promote_epoch: false },
            dep_mode: EvrCmpMode::Compare,
        }
    }

    /// Enable or disable epoch promotion
    pub fn promote_epoch(mut self, promote: bool) -> Self {
        self.options.promote_epoch = promote;
        self
    }

    /// Override the dependency comparison mode
    pub fn with_dep_mode(mut self, mode: EvrCmpMode) -> Self {
        self.dep_mode = mode;
        self
    }

    pub fn options(&self) -> CmpOptions {
        self.options
    }
}

impl Default for DistComparator {
    fn default() -> Self {
        Self::rpm()
    }
}

impl EvrComparator for DistComparator {
    fn evrcmp(&self, evr1: &str, evr2: &str, mode: EvrCmpMode) -> EvrOrdering {
        evrcmp(evr1, evr2, mode, self.options)
    }

    fn dep_mode(&self) -> EvrCmpMode {
        self.dep_mode
    }
}
