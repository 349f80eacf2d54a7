//! Justification resolution.
//!
//! Given a derivation index and a target formula, enumerate every
//! alternative way of justifying the target: each alternative is the set of
//! premises left unexplained plus the chain of signed steps used.
//!
//! Every node's alternatives always include the node itself as a premise.
//! Each derivation of the node then contributes the joint alternatives of its
//! premises (cartesian product in premise order) extended by its own step.
//!
//! Traversal uses an explicit frame stack. Each frame owns an immutable
//! snapshot of the path from the target to itself; a derivation with any
//! premise on that path is skipped whole. Results are memoized per formula,
//! so every formula is expanded at most once per resolution.
//!
//! The number of alternatives grows with the product of the premises'
//! alternative counts. No bound is applied.

use std::borrow::Cow;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::types::{AssertionUnit, DerivationIndex, JustificationSet, JustificationUnit};

/// Resolve every justification of `target` against `index`.
pub fn resolve(target: &str, index: &DerivationIndex) -> JustificationSet {
    Resolver::new(index).resolve(target)
}

struct Frame {
    cid: String,
    path: Vec<String>,
    /// Next derivation of `cid` to consider
    next: usize,
    alternatives: JustificationSet,
}

impl Frame {
    fn new(cid: String, path: Vec<String>) -> Self {
        let alternatives = JustificationSet::from([JustificationUnit::premise(cid.clone())]);
        Self {
            cid,
            path,
            next: 0,
            alternatives,
        }
    }
}

/// Single-use resolution state over one index.
pub struct Resolver<'a> {
    index: &'a DerivationIndex,
    memo: HashMap<String, JustificationSet>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a DerivationIndex) -> Self {
        Self {
            index,
            memo: HashMap::new(),
        }
    }

    /// Resolve `target`, consuming the resolver and its memo table.
    pub fn resolve(mut self, target: &str) -> JustificationSet {
        let index = self.index;
        let mut stack = vec![Frame::new(target.to_string(), vec![target.to_string()])];

        while let Some(frame) = stack.last_mut() {
            let Some(unit) = index.derivations(&frame.cid).get(frame.next) else {
                let Some(done) = stack.pop() else { break };
                trace!(cid = %done.cid, alternatives = done.alternatives.len(), "Resolved formula");
                if stack.is_empty() {
                    self.memo.insert(done.cid, done.alternatives.clone());
                    return done.alternatives;
                }
                self.memo.insert(done.cid, done.alternatives);
                continue;
            };

            if let Some(dep) = unit.dependencies.iter().find(|d| frame.path.contains(*d)) {
                debug!(cid = %frame.cid, dependency = %dep, agent = %unit.agent, "Skipping cyclic derivation");
                frame.next += 1;
                continue;
            }

            let pending = unit
                .dependencies
                .iter()
                .find(|d| index.is_derived(d) && !self.memo.contains_key(*d));
            if let Some(dep) = pending {
                let mut path = frame.path.clone();
                path.push(dep.clone());
                stack.push(Frame::new(dep.clone(), path));
                continue;
            }

            let combined = self.combine(unit);
            frame.alternatives.extend(combined);
            frame.next += 1;
        }

        // Only reachable if the initial frame vanished without resolving.
        JustificationSet::from([JustificationUnit::premise(target)])
    }

    /// Alternatives for a premise: memoized if it is derived, else itself.
    fn alternatives(&self, cid: &str) -> Cow<'_, JustificationSet> {
        match self.memo.get(cid) {
            Some(alts) if self.index.is_derived(cid) => Cow::Borrowed(alts),
            _ => Cow::Owned(JustificationSet::from([JustificationUnit::premise(cid)])),
        }
    }

    /// Every joint alternative of one derivation's premises, extended by its
    /// step. Not deduplicated.
    fn combine(&self, unit: &AssertionUnit) -> Vec<JustificationUnit> {
        let mut product = vec![JustificationUnit::empty()];
        for dep in &unit.dependencies {
            let alts = self.alternatives(dep);
            product = product
                .iter()
                .flat_map(|left| alts.iter().map(move |right| left.join(right)))
                .collect();
        }

        let step = unit.step();
        product
            .into_iter()
            .map(|alt| alt.then(step.clone()))
            .collect()
    }
}
