//! Derived, in-memory types of a lookup session.
//!
//! With the `typescript` feature enabled, the result types can be exported
//! to TypeScript using ts-rs.

use std::collections::{BTreeSet, HashMap};

use dispatch_core::ProductionMode;
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Normalized justification mode of an assertion.
///
/// Serializes as `null`, `"axiom"`, `"conjecture"`, or the tool's CID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Mode {
    Unspecified,
    Axiom,
    Conjecture,
    /// CID of the tool record
    Tool(String),
}

impl From<Option<String>> for Mode {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Self::Unspecified,
            Some(s) if s == "axiom" => Self::Axiom,
            Some(s) if s == "conjecture" => Self::Conjecture,
            Some(cid) => Self::Tool(cid),
        }
    }
}

impl From<Mode> for Option<String> {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Unspecified => None,
            Mode::Axiom => Some("axiom".into()),
            Mode::Conjecture => Some("conjecture".into()),
            Mode::Tool(cid) => Some(cid),
        }
    }
}

impl From<&ProductionMode> for Mode {
    fn from(mode: &ProductionMode) -> Self {
        match mode {
            ProductionMode::Unspecified => Self::Unspecified,
            ProductionMode::Axiom => Self::Axiom,
            ProductionMode::Conjecture => Self::Conjecture,
            ProductionMode::Tool(link) => Self::Tool(link.cid().to_string()),
        }
    }
}

/// One derivation step: who signed it and under which mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Step {
    /// Agent fingerprint
    pub agent: String,
    #[cfg_attr(feature = "typescript", ts(type = "string | null"))]
    pub mode: Mode,
}

impl Step {
    pub fn new(agent: impl Into<String>, mode: Mode) -> Self {
        Self {
            agent: agent.into(),
            mode,
        }
    }
}

/// Normalized claim of one valid assertion, indexed by its conclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionUnit {
    /// Agent fingerprint
    pub agent: String,
    pub mode: Mode,
    /// Premise formula CIDs, in sequent order
    pub dependencies: Vec<String>,
}

impl AssertionUnit {
    pub fn step(&self) -> Step {
        Step::new(self.agent.clone(), self.mode.clone())
    }
}

/// Conclusion CID to every assertion deriving it, in ingestion order.
#[derive(Debug, Clone, Default)]
pub struct DerivationIndex {
    entries: HashMap<String, Vec<AssertionUnit>>,
}

impl DerivationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, conclusion: impl Into<String>, unit: AssertionUnit) {
        self.entries.entry(conclusion.into()).or_default().push(unit);
    }

    /// Derivations of a formula; empty when it is not derived anywhere.
    pub fn derivations(&self, cid: &str) -> &[AssertionUnit] {
        self.entries.get(cid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_derived(&self, cid: &str) -> bool {
        !self.derivations(cid).is_empty()
    }

    /// Number of distinct conclusions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of indexed assertions.
    pub fn assertion_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// One alternative justification of a formula: the premises it still rests
/// on, and the chain of signed steps that reach it from them.
///
/// Equality is structural: same dependency set, same step sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct JustificationUnit {
    pub dependencies: BTreeSet<String>,
    pub via: Vec<Step>,
}

impl JustificationUnit {
    /// Take `cid` itself as an unresolved premise.
    pub fn premise(cid: impl Into<String>) -> Self {
        Self {
            dependencies: BTreeSet::from([cid.into()]),
            via: Vec::new(),
        }
    }

    /// Neutral element of [`join`](Self::join).
    pub fn empty() -> Self {
        Self {
            dependencies: BTreeSet::new(),
            via: Vec::new(),
        }
    }

    /// Joint justification: dependencies unioned, steps concatenated.
    pub fn join(&self, other: &Self) -> Self {
        Self {
            dependencies: self.dependencies.union(&other.dependencies).cloned().collect(),
            via: self.via.iter().chain(other.via.iter()).cloned().collect(),
        }
    }

    /// Extend the provenance chain with one more step.
    pub fn then(mut self, step: Step) -> Self {
        self.via.push(step);
        self
    }
}

/// Deduplicated set of alternatives, in a deterministic order.
pub type JustificationSet = BTreeSet<JustificationUnit>;
