//! The fact store: every known field of one project's identity.
//!
//! Each field lives in a [`Slot`] that is unset, explicit, or derived.
//! Explicit values come from the caller at construction and are locked.
//! Derived values come from rules and follow one of three write disciplines:
//!
//! - [`Slot::fill`] writes only into an unset slot.
//! - [`Slot::refine`] may replace a differing derived value. Re-deriving an
//!   identical value settles the slot, after which it refuses replacement.
//! - [`Slot::track`] keeps a derived value equal to a function of other
//!   slots; it never settles.
//!
//! All three report a [`Change`] so the engine can detect the fixpoint by
//! value, never by incidental mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::lifecycle::WorkingCopy;
use crate::ports::{ForgeProject, ForgeService, VcsHandle};
use crate::{FactKind, FullName, GitRef, Namespace, RemoteUrl, RepoName};

/// Whether a write altered the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Change {
    Changed,
    Unchanged,
}

impl Change {
    pub fn is_changed(self) -> bool {
        self == Change::Changed
    }
}

impl std::ops::BitOr for Change {
    type Output = Change;

    fn bitor(self, rhs: Change) -> Change {
        if self.is_changed() || rhs.is_changed() {
            Change::Changed
        } else {
            Change::Unchanged
        }
    }
}

/// Where a slot's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Supplied by the caller; never overwritten.
    Explicit,
    /// Produced by a rule. `settled` once a refinement reproduced it.
    Derived { settled: bool },
}

/// One field of the fact store.
#[derive(Clone)]
pub struct Slot<T> {
    value: Option<T>,
    origin: Origin,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            origin: Origin::Derived { settled: false },
        }
    }
}

impl<T> Slot<T> {
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn origin(&self) -> Option<Origin> {
        self.value.as_ref().map(|_| self.origin)
    }

    pub fn is_explicit(&self) -> bool {
        self.is_set() && self.origin == Origin::Explicit
    }

    /// Locks `value` in as caller-supplied: at construction, or for a
    /// requested ref once it is checked out.
    pub(crate) fn set_explicit(&mut self, value: T) {
        self.value = Some(value);
        self.origin = Origin::Explicit;
    }

    /// Writes `value` if the slot is unset.
    pub(crate) fn fill(&mut self, value: T) -> Change {
        if self.value.is_some() {
            return Change::Unchanged;
        }
        self.value = Some(value);
        self.origin = Origin::Derived { settled: false };
        Change::Changed
    }
}

impl<T: PartialEq> Slot<T> {
    /// Writes `value` unless the slot is explicit, settled, or already equal.
    ///
    /// An equal re-derivation settles the slot.
    pub(crate) fn refine(&mut self, value: T) -> Change {
        match self.origin {
            Origin::Explicit if self.value.is_some() => Change::Unchanged,
            Origin::Derived { settled: true } if self.value.is_some() => Change::Unchanged,
            _ if self.value.as_ref() == Some(&value) => {
                self.origin = Origin::Derived { settled: true };
                Change::Unchanged
            }
            _ => {
                self.value = Some(value);
                self.origin = Origin::Derived { settled: false };
                Change::Changed
            }
        }
    }

    /// Writes `value` unless the slot is explicit or already equal.
    pub(crate) fn track(&mut self, value: T) -> Change {
        if self.is_explicit() || self.value.as_ref() == Some(&value) {
            return Change::Unchanged;
        }
        self.value = Some(value);
        self.origin = Origin::Derived { settled: false };
        Change::Changed
    }
}

/// Every known field of one project's identity.
#[derive(Default)]
pub struct Facts {
    pub(crate) local_path: Slot<PathBuf>,
    pub(crate) vcs: Slot<Arc<dyn VcsHandle>>,
    pub(crate) git_ref: Slot<GitRef>,
    pub(crate) project: Slot<Arc<dyn ForgeProject>>,
    pub(crate) service: Slot<Arc<dyn ForgeService>>,
    pub(crate) remote_url: Slot<RemoteUrl>,
    pub(crate) full_name: Slot<FullName>,
    pub(crate) namespace: Slot<Namespace>,
    pub(crate) repo_name: Slot<RepoName>,
    pub(crate) working_copy: WorkingCopy,
    pub(crate) offline: bool,
}

impl Facts {
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.get().map(PathBuf::as_path)
    }

    pub fn vcs(&self) -> Option<&Arc<dyn VcsHandle>> {
        self.vcs.get()
    }

    pub fn git_ref(&self) -> Option<&GitRef> {
        self.git_ref.get()
    }

    pub fn project(&self) -> Option<&Arc<dyn ForgeProject>> {
        self.project.get()
    }

    pub fn service(&self) -> Option<&Arc<dyn ForgeService>> {
        self.service.get()
    }

    pub fn remote_url(&self) -> Option<&RemoteUrl> {
        self.remote_url.get()
    }

    pub fn full_name(&self) -> Option<&FullName> {
        self.full_name.get()
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.get()
    }

    pub fn repo_name(&self) -> Option<&RepoName> {
        self.repo_name.get()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.working_copy.is_ephemeral()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn is_set(&self, fact: FactKind) -> bool {
        match fact {
            FactKind::LocalPath => self.local_path.is_set(),
            FactKind::VersionControlHandle => self.vcs.is_set(),
            FactKind::Ref => self.git_ref.is_set(),
            FactKind::ForgeProject => self.project.is_set(),
            FactKind::ForgeService => self.service.is_set(),
            FactKind::RemoteUrl => self.remote_url.is_set(),
            FactKind::FullName => self.full_name.is_set(),
            FactKind::Namespace => self.namespace.is_set(),
            FactKind::RepoName => self.repo_name.is_set(),
        }
    }

    pub fn is_explicit(&self, fact: FactKind) -> bool {
        match fact {
            FactKind::LocalPath => self.local_path.is_explicit(),
            FactKind::VersionControlHandle => self.vcs.is_explicit(),
            FactKind::Ref => self.git_ref.is_explicit(),
            FactKind::ForgeProject => self.project.is_explicit(),
            FactKind::ForgeService => self.service.is_explicit(),
            FactKind::RemoteUrl => self.remote_url.is_explicit(),
            FactKind::FullName => self.full_name.is_explicit(),
            FactKind::Namespace => self.namespace.is_explicit(),
            FactKind::RepoName => self.repo_name.is_explicit(),
        }
    }

    /// Facts that are still unset, in fact-store order.
    pub fn missing(&self) -> Vec<FactKind> {
        FactKind::ALL
            .into_iter()
            .filter(|f| !self.is_set(*f))
            .collect()
    }

    /// `true` when `full_name` agrees with `namespace`/`repo_name` (or when
    /// any of the three is unset).
    pub fn is_consistent(&self) -> bool {
        match (self.namespace(), self.repo_name(), self.full_name()) {
            (Some(ns), Some(repo), Some(full)) => *full == FullName::join(ns, repo),
            _ => true,
        }
    }
}
