//! # State Invariants
//!
//! Snapshot invariants hold in every reachable state; transition invariants
//! relate two consecutive snapshots. Both are checked after every action by
//! [`AggregatorTestHarness::run`](super::AggregatorTestHarness::run).

extern crate std;

use std::boxed::Box;
use std::string::{String, ToString};
use std::vec::Vec;

use super::AggregatorSnapshot;

// ── Invariant Trait ──────────────────────────────────────────────────────────

/// A named invariant that can be verified against a state snapshot.
pub trait Invariant {
    fn name(&self) -> &str;

    /// `Err(description)` on violation.
    fn check(&self, snapshot: &AggregatorSnapshot) -> Result<(), String>;
}

// ── Built-in Invariants ──────────────────────────────────────────────────────

/// The owner is always in the provider set.
pub struct OwnerIsProvider;

impl Invariant for OwnerIsProvider {
    fn name(&self) -> &str {
        "owner is a provider"
    }

    fn check(&self, snapshot: &AggregatorSnapshot) -> Result<(), String> {
        let tracked = snapshot.providers.iter().any(|(a, _)| *a == snapshot.owner);
        if tracked && !snapshot.is_provider(&snapshot.owner) {
            return Err(std::format!("owner {:?} is not a provider", snapshot.owner));
        }
        Ok(())
    }
}

/// Batch ids start at 1.
pub struct BatchIdPositive;

impl Invariant for BatchIdPositive {
    fn name(&self) -> &str {
        "batch id >= 1"
    }

    fn check(&self, snapshot: &AggregatorSnapshot) -> Result<(), String> {
        if snapshot.batch.id == 0 {
            return Err("batch id is 0".to_string());
        }
        Ok(())
    }
}

/// A result is stored exactly for processed contexts.
pub struct ResultIffProcessed;

impl Invariant for ResultIffProcessed {
    fn name(&self) -> &str {
        "result stored iff context processed"
    }

    fn check(&self, snapshot: &AggregatorSnapshot) -> Result<(), String> {
        for (id, ctx, result) in &snapshot.decryptions {
            if ctx.processed != result.is_some() {
                return Err(std::format!(
                    "request {}: processed={} but result={:?}",
                    id, ctx.processed, result
                ));
            }
        }
        Ok(())
    }
}

/// Every finalized result equals the plaintext sum accepted before the
/// request was issued.
pub struct ResultsMatchSubmissions;

impl Invariant for ResultsMatchSubmissions {
    fn name(&self) -> &str {
        "decrypted value == accepted sum at request time"
    }

    fn check(&self, snapshot: &AggregatorSnapshot) -> Result<(), String> {
        for (id, expected) in &snapshot.expected_results {
            if let Some((_, _, Some(value))) = snapshot.decryption(*id) {
                if u64::from(*value) != *expected {
                    return Err(std::format!(
                        "request {} decrypted to {}, expected {}",
                        id, value, expected
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A decryption context can only exist once the accumulator does.
pub struct ContextsNeedAccumulator;

impl Invariant for ContextsNeedAccumulator {
    fn name(&self) -> &str {
        "decryption contexts imply an accumulator"
    }

    fn check(&self, snapshot: &AggregatorSnapshot) -> Result<(), String> {
        if !snapshot.decryptions.is_empty() && snapshot.accumulator.is_none() {
            return Err(std::format!(
                "{} contexts but no accumulator",
                snapshot.decryptions.len()
            ));
        }
        Ok(())
    }
}

// ── Invariant Set ────────────────────────────────────────────────────────────

/// A composable set of invariants checked together.
pub struct InvariantSet {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantSet {
    pub fn new() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }

    /// All built-in snapshot invariants.
    pub fn aggregator_defaults() -> Self {
        let mut set = Self::new();
        set.add(Box::new(OwnerIsProvider));
        set.add(Box::new(BatchIdPositive));
        set.add(Box::new(ResultIffProcessed));
        set.add(Box::new(ResultsMatchSubmissions));
        set.add(Box::new(ContextsNeedAccumulator));
        set
    }

    pub fn add(&mut self, invariant: Box<dyn Invariant>) {
        self.invariants.push(invariant);
    }

    /// `(invariant_name, violation_message)` for every failure.
    pub fn check_all(&self, snapshot: &AggregatorSnapshot) -> Vec<(String, String)> {
        let mut violations = Vec::new();
        for inv in &self.invariants {
            if let Err(msg) = inv.check(snapshot) {
                violations.push((inv.name().to_string(), msg));
            }
        }
        violations
    }

    /// Panics with a report when any invariant is violated.
    pub fn assert_all(&self, snapshot: &AggregatorSnapshot) {
        let violations = self.check_all(snapshot);
        if !violations.is_empty() {
            let mut report = String::from("Invariant violations detected:\n");
            for (name, msg) in &violations {
                report.push_str(&std::format!("  ✗ [{}]: {}\n", name, msg));
            }
            panic!("{}", report);
        }
    }

    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

impl Default for InvariantSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── Transition Invariants ────────────────────────────────────────────────────

/// Invariants over a `(before, after)` pair of snapshots.
pub trait TransitionInvariant {
    fn name(&self) -> &str;
    fn check(&self, before: &AggregatorSnapshot, after: &AggregatorSnapshot) -> Result<(), String>;
}

/// The batch id never decreases, and grows by at most one per action.
pub struct BatchIdMonotonic;

impl TransitionInvariant for BatchIdMonotonic {
    fn name(&self) -> &str {
        "batch id is non-decreasing"
    }

    fn check(&self, before: &AggregatorSnapshot, after: &AggregatorSnapshot) -> Result<(), String> {
        if after.batch.id < before.batch.id {
            return Err(std::format!(
                "batch id went backwards: {} -> {}",
                before.batch.id, after.batch.id
            ));
        }
        if after.batch.id > before.batch.id + 1 {
            return Err(std::format!(
                "batch id skipped: {} -> {}",
                before.batch.id, after.batch.id
            ));
        }
        if after.batch.id > before.batch.id && !before.batch.open {
            return Err(std::format!(
                "batch id advanced from a closed batch: {} -> {}",
                before.batch.id, after.batch.id
            ));
        }
        Ok(())
    }
}

/// `processed` never flips back, and a stored result never changes.
pub struct ProcessedNeverReverts;

impl TransitionInvariant for ProcessedNeverReverts {
    fn name(&self) -> &str {
        "processed contexts are final"
    }

    fn check(&self, before: &AggregatorSnapshot, after: &AggregatorSnapshot) -> Result<(), String> {
        for (id, ctx, result) in &before.decryptions {
            if !ctx.processed {
                continue;
            }
            match after.decryption(*id) {
                Some((_, later, later_result)) if later.processed && later_result == result => {}
                other => {
                    return Err(std::format!(
                        "request {} was finalized but is now {:?}",
                        id, other
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Decryption contexts keep the batch id and state hash they were created
/// with.
pub struct ContextBindingStable;

impl TransitionInvariant for ContextBindingStable {
    fn name(&self) -> &str {
        "context binding is immutable"
    }

    fn check(&self, before: &AggregatorSnapshot, after: &AggregatorSnapshot) -> Result<(), String> {
        for (id, ctx, _) in &before.decryptions {
            if let Some((_, later, _)) = after.decryption(*id) {
                if later.batch_id != ctx.batch_id || later.state_hash != ctx.state_hash {
                    return Err(std::format!("request {} binding changed", id));
                }
            }
        }
        Ok(())
    }
}

/// Composite checker for transition invariants.
pub struct TransitionInvariantSet {
    invariants: Vec<Box<dyn TransitionInvariant>>,
}

impl TransitionInvariantSet {
    pub fn new() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }

    pub fn aggregator_defaults() -> Self {
        let mut set = Self::new();
        set.add(Box::new(BatchIdMonotonic));
        set.add(Box::new(ProcessedNeverReverts));
        set.add(Box::new(ContextBindingStable));
        set
    }

    pub fn add(&mut self, invariant: Box<dyn TransitionInvariant>) {
        self.invariants.push(invariant);
    }

    pub fn check_all(
        &self,
        before: &AggregatorSnapshot,
        after: &AggregatorSnapshot,
    ) -> Vec<(String, String)> {
        let mut violations = Vec::new();
        for inv in &self.invariants {
            if let Err(msg) = inv.check(before, after) {
                violations.push((inv.name().to_string(), msg));
            }
        }
        violations
    }

    pub fn assert_all(&self, before: &AggregatorSnapshot, after: &AggregatorSnapshot) {
        let violations = self.check_all(before, after);
        if !violations.is_empty() {
            let mut report = String::from("Transition invariant violations:\n");
            for (name, msg) in &violations {
                report.push_str(&std::format!("  ✗ [{}]: {}\n", name, msg));
            }
            panic!("{}", report);
        }
    }
}

impl Default for TransitionInvariantSet {
    fn default() -> Self {
        Self::new()
    }
}
