//! Top-level error type for project identity construction and resolution.
//!
//! [`IdentityError`] covers conditions surfaced to the caller. Collaborator
//! errors ([`crate::ports::VcsError`], [`crate::ports::ForgeError`]) are
//! defined next to their port traits; inside the fixpoint loop they are
//! recorded and skipped rather than raised.

use thiserror::Error;

use crate::ports::VcsError;
use crate::FactKind;

/// Errors surfaced by [`crate::LocalProject`].
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Caller-supplied facts cannot coexist: `full_name` disagrees with the
    /// explicit `namespace`/`repo_name`.
    ///
    /// Produced at construction; nothing is silently overwritten.
    #[error("Contradictory facts: full name '{full_name}' does not match '{namespace}/{repo_name}'")]
    Contradiction {
        /// The explicit full name.
        full_name: String,
        /// The explicit (or implied) namespace.
        namespace: String,
        /// The explicit (or implied) repository name.
        repo_name: String,
    },

    /// A caller-supplied value is malformed (e.g. a full name without `/`).
    #[error("Invalid value for {fact}: '{value}'")]
    InvalidFact {
        /// Which fact the value was supplied for.
        fact: FactKind,
        /// The rejected value.
        value: String,
    },

    /// The ambiguous path-or-URL input is neither an existing directory nor a
    /// reachable URL.
    #[error("'{value}' is neither an existing directory nor a reachable URL")]
    UnusablePathOrUrl {
        /// The rejected input.
        value: String,
    },

    /// Resolution converged but facts the caller requires are still unset.
    #[error("Could not resolve: {}", format_missing(missing))]
    Unresolvable {
        /// The facts that remained unset.
        missing: Vec<FactKind>,
    },

    /// A version-control operation on the resolved working copy failed.
    ///
    /// Indicates broken local state; never papered over.
    #[error("Version control error: {0}")]
    VersionControl(#[from] VcsError),

    /// The engine exceeded its pass ceiling without reaching a fixpoint.
    #[error("Resolution did not converge after {passes} passes")]
    Diverged {
        /// Number of passes executed.
        passes: usize,
    },
}

fn format_missing(missing: &[FactKind]) -> String {
    missing
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_lists_missing_facts() {
        let err = IdentityError::Unresolvable {
            missing: vec![FactKind::RemoteUrl, FactKind::Namespace],
        };
        assert_eq!(err.to_string(), "Could not resolve: remote_url, namespace");
    }
}
