//! The fixpoint resolution engine.
//!
//! Every pass evaluates each rule once, in table order, and records which
//! rules changed a fact. The first pass in which no rule changes anything ends
//! the run. Change detection is by value (see [`crate::facts::Slot`]), so a
//! rule whose precondition stays true after firing does not keep the loop
//! alive.
//!
//! A rule whose collaborator call fails is logged and recorded as not having
//! fired; it is re-evaluated on the next pass if one happens. Rules that need
//! the network are skipped when the facts are offline.

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::facts::{Change, Facts};
use crate::ports::Collaborators;
use crate::rules::{Rule, RULES};
use crate::{FactKind, IdentityError, ResolutionId, Timestamp};

/// A rule that changed at least one fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Firing {
    /// 1-based pass number.
    pub pass: usize,
    pub rule: &'static str,
}

/// A rule whose collaborator call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub pass: usize,
    pub rule: &'static str,
    pub reason: String,
}

/// Report of one resolution run.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub id: ResolutionId,
    /// Number of passes, including the final quiet one.
    pub passes: usize,
    pub fired: Vec<Firing>,
    pub failures: Vec<RuleFailure>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    /// Facts still unset at the fixpoint.
    pub missing: Vec<FactKind>,
}

impl Resolution {
    /// `true` if the run changed any fact.
    pub fn changed(&self) -> bool {
        !self.fired.is_empty()
    }

    /// `true` if every fact is set.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Drives a rule table to its fixpoint.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'r> {
    rules: &'r [Rule],
    max_passes: usize,
}

impl Engine<'static> {
    /// The engine over the standard rule table.
    pub fn standard() -> Self {
        Engine::new(&RULES)
    }
}

impl<'r> Engine<'r> {
    /// Every fill happens at most once per slot and refinements settle, so a
    /// real run needs only a handful of passes. The ceiling is a guard.
    pub fn new(rules: &'r [Rule]) -> Self {
        Self {
            rules,
            max_passes: 2 * rules.len() + 1,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn rules(&self) -> &'r [Rule] {
        self.rules
    }

    /// Applies the rules to `facts` until no rule changes anything.
    pub fn run(
        &self,
        facts: &mut Facts,
        collaborators: &Collaborators,
    ) -> Result<Resolution, IdentityError> {
        let id = ResolutionId::new_random();
        let span = info_span!("resolve", resolution_id = %id, offline = facts.offline);
        let _guard = span.enter();

        let started_at = Timestamp::now();
        let mut fired = Vec::new();
        let mut failures = Vec::new();
        let mut pass = 0;

        loop {
            if pass == self.max_passes {
                warn!(passes = pass, "Pass ceiling reached without a fixpoint");
                return Err(IdentityError::Diverged { passes: pass });
            }
            pass += 1;

            let mut changed = false;
            for rule in self.rules {
                if rule.online_only && facts.offline {
                    continue;
                }
                match rule.apply(facts, collaborators) {
                    Ok(Change::Changed) => {
                        debug!(pass, rule = rule.name, "Rule fired");
                        fired.push(Firing {
                            pass,
                            rule: rule.name,
                        });
                        changed = true;
                    }
                    Ok(Change::Unchanged) => {}
                    Err(err) => {
                        warn!(pass, rule = rule.name, error = %err, "Rule did not fire");
                        failures.push(RuleFailure {
                            pass,
                            rule: rule.name,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            if !changed {
                break;
            }
        }

        debug_assert!(facts.is_consistent(), "full name diverged from its halves");
        let missing = facts.missing();
        info!(passes = pass, fired = fired.len(), missing = ?missing, "Resolution converged");

        Ok(Resolution {
            id,
            passes: pass,
            fired,
            failures,
            started_at,
            finished_at: Timestamp::now(),
            missing,
        })
    }
}
