//! Per-run agent memory.

use warden_contracts::agent::Step;

/// The goal and ordered step history of one run.
///
/// Owned exclusively by the `AgentRun` that created it and discarded when the
/// run ends. Append-only: steps are never edited or removed, and no
/// validation happens here.
#[derive(Debug, Clone)]
pub struct AgentState {
    goal: String,
    steps: Vec<Step>,
}

impl AgentState {
    pub fn new(goal: impl Into<String>) -> Self {
        Self { goal: goal.into(), steps: Vec::new() }
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Read-only view of the history in causal order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn add_step(&mut self, step: Step) {
        self.steps.push(step);
    }
}
