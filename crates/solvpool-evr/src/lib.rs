//! Epoch:version-release comparison for package versions
//!
//! This crate provides the RPM and Debian version orderings used by the
//! solvpool provider index, along with the dependency matching modes that
//! decide how a missing release is treated.

mod evrcmp;
mod vercmp;

pub use evrcmp::{evrcmp, CmpOptions, DistComparator, EvrCmpMode, EvrComparator, EvrOrdering};
pub use vercmp::{vercmp_deb, vercmp_rpm, VersionScheme};
