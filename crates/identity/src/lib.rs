//! Project identity resolution for pkgsync.
//!
//! Given a sparse description of a project (some subset of a local path, a
//! remote URL, a namespace, a repository name, and handles to a working copy
//! or forge), this crate derives the most complete consistent identity it can,
//! cloning or querying a forge only when a gap demands it.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network or
//! git I/O of its own. It defines *what* is needed in [`ports`];
//! infrastructure crates (`vcs`, `forge`) define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype names (`Namespace`, `RepoName`, `FullName`, etc.) |
//! | [`types`] | Shared value types (`GitRef`, `FactKind`, `Timestamp`) |
//! | [`errors`] | [`IdentityError`] |
//! | [`ports`] | Collaborator traits and the forge registry |
//! | [`remote_url`] | Clone-URL parsing |
//! | [`facts`] | The fact store |
//! | [`rules`] | The derivation rule table |
//! | [`engine`] | The fixpoint loop |
//! | [`lifecycle`] | Ephemeral working-directory ownership |
//! | [`project`] | [`LocalProject`], the public entry point |

pub mod engine;
pub mod errors;
pub mod facts;
pub mod identifiers;
pub mod lifecycle;
pub mod ports;
pub mod project;
pub mod remote_url;
pub mod rules;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use engine::{Engine, Firing, Resolution, RuleFailure};
pub use errors::IdentityError;
pub use facts::{Change, Facts, Origin};
pub use identifiers::{
    BranchName, CommitSha, FullName, Namespace, RemoteUrl, RepoName, ResolutionId,
};
pub use ports::{
    Collaborators, ForgeError, ForgeProject, ForgeRegistry, ForgeService, GitUrls, NoNetwork,
    ReachabilityProbe, VcsBackend, VcsError, VcsHandle,
};
pub use project::{IdentitySnapshot, LocalProject, ProjectSpec};
pub use remote_url::RemoteLocation;
pub use types::{FactKind, GitRef, Timestamp};
