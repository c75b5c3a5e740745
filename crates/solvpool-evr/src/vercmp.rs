//! Segment-wise version string comparison
//!
//! Both comparators work on a single version component (no epoch, no
//! release). Splitting an EVR into its parts is done by [`crate::evrcmp`].

use std::cmp::Ordering;

/// Version comparison scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VersionScheme {
    /// rpmvercmp: alternating numeric/alpha segments, `~` sorts before everything
    #[default]
    Rpm,
    /// dpkg: lexical runs with `~` lowest, letters before other symbols
    Debian,
}

impl VersionScheme {
    /// Compare two version components using this scheme
    pub fn compare(self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            VersionScheme::Rpm => vercmp_rpm(a, b),
            VersionScheme::Debian => vercmp_deb(a, b),
        }
    }
}

fn is_segment_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'~'
}

fn digit_run(s: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < s.len() && s[end].is_ascii_digit() {
        end += 1;
    }
    end
}

fn alpha_run(s: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < s.len() && s[end].is_ascii_alphabetic() {
        end += 1;
    }
    end
}

/// RPM style comparison of two version components.
///
/// Numeric segments compare numerically (leading zeros ignored) and always
/// sort newer than alphabetic segments. A `~` sorts before anything,
/// including the end of the string, so `1.0~rc1 < 1.0`.
pub fn vercmp_rpm(s1: &[u8], s2: &[u8]) -> Ordering {
    let (mut i, mut j) = (0usize, 0usize);
    loop {
        while i < s1.len() && !is_segment_char(s1[i]) {
            i += 1;
        }
        while j < s2.len() && !is_segment_char(s2[j]) {
            j += 1;
        }
        if i < s1.len() && s1[i] == b'~' {
            if j < s2.len() && s2[j] == b'~' {
                i += 1;
                j += 1;
                continue;
            }
            return Ordering::Less;
        }
        if j < s2.len() && s2[j] == b'~' {
            return Ordering::Greater;
        }
        if i >= s1.len() || j >= s2.len() {
            break;
        }
        if s1[i].is_ascii_digit() || s2[j].is_ascii_digit() {
            while s1[i] == b'0' && i + 1 < s1.len() && s1[i + 1].is_ascii_digit() {
                i += 1;
            }
            while s2[j] == b'0' && j + 1 < s2.len() && s2[j + 1].is_ascii_digit() {
                j += 1;
            }
            let e1 = digit_run(s1, i);
            let e2 = digit_run(s2, j);
            let r = (e1 - i)
                .cmp(&(e2 - j))
                .then_with(|| s1[i..e1].cmp(&s2[j..e2]));
            if r != Ordering::Equal {
                return r;
            }
            i = e1;
            j = e2;
        } else {
            let e1 = alpha_run(s1, i);
            let e2 = alpha_run(s2, j);
            let (l1, l2) = (e1 - i, e2 - j);
            if l1 > l2 {
                // a longer run wins unless its prefix already sorts lower
                return match s1[i..i + l2].cmp(&s2[j..e2]) {
                    Ordering::Less => Ordering::Less,
                    _ => Ordering::Greater,
                };
            }
            if l1 < l2 {
                return match s1[i..e1].cmp(&s2[j..j + l1]) {
                    Ordering::Greater => Ordering::Greater,
                    _ => Ordering::Less,
                };
            }
            let r = s1[i..e1].cmp(&s2[j..e2]);
            if r != Ordering::Equal {
                return r;
            }
            i = e1;
            j = e2;
        }
    }
    if i < s1.len() {
        Ordering::Greater
    } else if j < s2.len() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

fn deb_weight(c: i32) -> i32 {
    if c == i32::from(b'~') {
        -1
    } else if c == 0 || (c >= 0 && (c as u8).is_ascii_alphanumeric()) {
        c
    } else {
        c + 256
    }
}

/// Debian style comparison of two version components.
pub fn vercmp_deb(s1: &[u8], s2: &[u8]) -> Ordering {
    let (mut i, mut j) = (0usize, 0usize);
    let next = |s: &[u8], pos: &mut usize| -> i32 {
        if *pos < s.len() {
            let c = s[*pos];
            *pos += 1;
            i32::from(c)
        } else {
            0
        }
    };
    let is_digit = |c: i32| (i32::from(b'0')..=i32::from(b'9')).contains(&c);

    loop {
        let mut c1 = next(s1, &mut i);
        let mut c2 = next(s2, &mut j);
        if is_digit(c1) && is_digit(c2) {
            while c1 == i32::from(b'0') {
                c1 = next(s1, &mut i);
            }
            while c2 == i32::from(b'0') {
                c2 = next(s2, &mut j);
            }
            let mut r = 0;
            while is_digit(c1) && is_digit(c2) {
                if r == 0 {
                    r = c1 - c2;
                }
                c1 = next(s1, &mut i);
                c2 = next(s2, &mut j);
            }
            if is_digit(c1) {
                return Ordering::Greater;
            }
            if is_digit(c2) {
                return Ordering::Less;
            }
            if r != 0 {
                return r.cmp(&0);
            }
        }
        let w1 = deb_weight(c1);
        let w2 = deb_weight(c2);
        if w1 != w2 {
            return w1.cmp(&w2);
        }
        if w1 == 0 {
            return Ordering::Equal;
        }
    }
}
