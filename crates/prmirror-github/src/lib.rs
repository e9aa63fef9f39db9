//! # prmirror GitHub
//!
//! Read-only access to a pull request and the git objects behind it.
//!
//! [`GitObjectSource`] is the seam the mirror depends on; [`GitHubClient`]
//! implements it over the GitHub REST API.

mod api;
pub mod client;
pub mod source;

pub use client::{GitHubClient, API_VERSION};
pub use source::GitObjectSource;
