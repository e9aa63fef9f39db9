//! prmirror Core Library
//!
//! Typed git objects, the per-entity identity policy, run configuration
//! and the error type shared by the fetcher, the writer and the CLI.

pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod walk;

pub use config::{FileConfig, GraphConfig, MirrorConfig, RawSettings, RepoRef};
pub use error::{MirrorError, MirrorResult};
pub use identity::EntityKind;
pub use model::{Blob, Commit, Properties, PullRequest, Tree, TreeEntry, TreeEntryKind};
pub use walk::WalkPolicy;
