pub mod config;
pub mod error;
pub mod fileprovides;
pub mod ids;
pub mod installable;
pub mod pool;
pub mod relational;
pub mod repo;
pub mod repodata;
pub mod solvable;
pub mod whatprovides;

pub use config::{DistType, PoolConfig};
pub use error::{PoolError, Result};
pub use fileprovides::{FileConflict, FileProvidesMode, FileProvidesReport, FileProvidesScope};
pub use ids::{known, Id, IdKind, IdPool, RelOp, Reldep, VersionFlags};
pub use installable::{InstallState, Installability};
pub use pool::Pool;
pub use relational::{NamespaceAnswer, NamespaceProvider};
pub use repo::{DepMarker, Repo, RepoId};
pub use repodata::{FileFilter, Repodata, StandardLocations};
pub use solvable::{DepKind, Solvable, SolvableId};
pub use whatprovides::{IndexState, ProviderList, StaleReason};
#[cfg(test)] mod tests;
