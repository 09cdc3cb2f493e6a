//! Domain logic - pure branching and versioning rules independent of git

pub mod branch;
pub mod commit;
pub mod strategy;
pub mod tag;
pub mod version;

pub use branch::{BranchNaming, BranchRef, Role};
pub use commit::ParsedCommit;
pub use strategy::{ReconcileMethod, ReconcilePlan, RequestedMethod};
pub use tag::TagPattern;
pub use version::{next_version, BumpMode, Version, VersionBump};
