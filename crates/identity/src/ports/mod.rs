//! Collaborator port definitions.
//!
//! The engine reaches version control, forges, and the network only through
//! these traits. Infrastructure crates (`vcs`, `forge`) implement them; tests
//! substitute deterministic stubs.

mod forge;
mod probe;
mod vcs;

use std::sync::Arc;

pub use forge::{ForgeError, ForgeProject, ForgeRegistry, ForgeService, GitUrls};
pub use probe::{NoNetwork, ReachabilityProbe};
pub use vcs::{VcsBackend, VcsError, VcsHandle};

/// The set of collaborators one [`crate::LocalProject`] resolves against.
#[derive(Clone)]
pub struct Collaborators {
    pub vcs: Arc<dyn VcsBackend>,
    pub probe: Arc<dyn ReachabilityProbe>,
    pub forges: ForgeRegistry,
}

impl Collaborators {
    /// Collaborators with the given backend, no network probe, and no forges.
    pub fn local(vcs: Arc<dyn VcsBackend>) -> Self {
        Self {
            vcs,
            probe: Arc::new(NoNetwork),
            forges: ForgeRegistry::new(),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_forge(mut self, service: Arc<dyn ForgeService>) -> Self {
        self.forges.register(service);
        self
    }
}
