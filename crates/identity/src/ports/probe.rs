//! Reachability port.

/// Answers whether a URL responds successfully.
pub trait ReachabilityProbe: Send + Sync {
    /// Issues a HEAD-style request to `url`.
    ///
    /// Transport errors are not failures: they mean "unreachable".
    fn probe(&self, url: &str) -> bool;
}

/// A probe that never reaches anything. Used when no network is wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetwork;

impl ReachabilityProbe for NoNetwork {
    fn probe(&self, _url: &str) -> bool {
        false
    }
}
