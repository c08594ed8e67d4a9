//! Newtype identity values.
//!
//! Every name that participates in a project identity is a distinct newtype
//! wrapping a `String`. This prevents accidentally interchanging, for example,
//! a [`Namespace`] with a [`RepoName`] even though both are plain strings under
//! the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new value, returning `None` if it is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Forge names
// ---------------------------------------------------------------------------

string_id! {
    /// The owner of a project on a forge: a user, an organisation, or a
    /// (possibly nested) GitLab group such as `"group/subgroup"`.
    Namespace
}

string_id! {
    /// The name of a project within its [`Namespace`] (e.g. `"widget"`).
    RepoName
}

string_id! {
    /// A clone URL for a remote repository.
    ///
    /// Stored verbatim; see [`crate::remote_url`] for parsing.
    RemoteUrl
}

// ---------------------------------------------------------------------------
// Git names
// ---------------------------------------------------------------------------

string_id! {
    /// A Git branch name (e.g. `"main"`, `"f40"`).
    BranchName
}

string_id! {
    /// A Git commit SHA (40-character lowercase hex string).
    CommitSha
}

// ---------------------------------------------------------------------------
// Full name
// ---------------------------------------------------------------------------

/// `"namespace/repo"`: the forge-qualified name of a project.
///
/// The repository name is everything after the last `/`; the namespace is
/// everything before it. Both halves are non-empty by construction, so
/// `FullName::join(ns, repo).split() == (ns, repo)` always holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

impl FullName {
    /// Parses a `"namespace/repo"` string.
    ///
    /// Returns `None` if there is no `/` or either half is empty.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        match v.rsplit_once('/') {
            Some((ns, repo)) if !ns.is_empty() && !repo.is_empty() => Some(Self(v)),
            _ => None,
        }
    }

    /// Builds the full name from its two halves.
    pub fn join(namespace: &Namespace, repo: &RepoName) -> Self {
        Self(format!("{namespace}/{repo}"))
    }

    /// Splits the full name into its namespace and repository halves.
    pub fn split(&self) -> (Namespace, RepoName) {
        // Non-empty halves are guaranteed by `parse` and `join`.
        let (ns, repo) = self.0.rsplit_once('/').unwrap_or(("", &self.0));
        (Namespace(ns.to_owned()), RepoName(repo.to_owned()))
    }

    /// Returns the namespace half.
    pub fn namespace(&self) -> Namespace {
        self.split().0
    }

    /// Returns the repository half.
    pub fn repo_name(&self) -> RepoName {
        self.split().1
    }

    /// Returns the full name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FullName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for FullName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FullName::parse(value.clone()).ok_or(value)
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single resolution run (one call to `resolve`).
///
/// Generated fresh for every run; attached to the resolution span so that all
/// rule activity from one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionId(Uuid);

impl ResolutionId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
