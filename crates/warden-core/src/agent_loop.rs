//! The WARDEN agent loop: a step-bounded think-act-observe state machine.
//!
//! Each iteration runs the same pipeline:
//!
//!   State → Prompt → Provider (stream) → Parse → [Gateway::dispatch] → Step
//!
//! A run is consumed as an `Iterator` of `AgentEvent`s. Work happens lazily
//! inside `next()`, so the caller controls the pace: text fragments are handed
//! out as the provider yields them, and dropping the iterator between events
//! stops the run before its next provider call or tool dispatch.
//!
//! Every run ends with exactly one terminal event (`Finish` or `Error`), after
//! which the iterator is fused and yields `None`.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use tracing::{debug, info, warn};

use warden_contracts::{
    agent::{Action, RunId, Step},
    config::DEFAULT_MAX_STEPS,
    error::{WardenError, WardenResult},
    event::AgentEvent,
    tool::ToolSummary,
};

use crate::{
    parser::{parse_response, Directive},
    prompt::build_prompt,
    state::AgentState,
    traits::{CompletionProvider, CompletionStream, ToolGateway},
};

/// Drives runs against one provider and one gateway.
///
/// The loop itself holds no per-run state, so a single `AgentLoop` can start
/// any number of sequential or concurrent runs.
pub struct AgentLoop {
    provider: Box<dyn CompletionProvider>,
    gateway: Box<dyn ToolGateway>,
    max_steps: usize,
}

impl AgentLoop {
    /// Create a loop with the default step budget.
    pub fn new(provider: Box<dyn CompletionProvider>, gateway: Box<dyn ToolGateway>) -> Self {
        Self { provider, gateway, max_steps: DEFAULT_MAX_STEPS }
    }

    /// Override the maximum number of model round-trips per run.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Start a run toward `goal`. Nothing happens until the first `next()`.
    pub fn run(&self, goal: impl Into<String>) -> AgentRun<'_> {
        let run_id = RunId::new();
        let state = AgentState::new(goal);
        info!(
            run_id = %run_id,
            max_steps = self.max_steps,
            goal = %state.goal(),
            "agent run starting"
        );
        AgentRun {
            agent: self,
            run_id,
            state,
            catalog: self.gateway.catalog(),
            status: RunStatus::Running { step: 0 },
            phase: Phase::Prompt,
            pending: VecDeque::new(),
        }
    }
}

/// Where a run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Still iterating; `step` completed tool calls so far.
    Running { step: usize },
    /// The model emitted a finish directive.
    Finished,
    /// The run stopped on a terminal error.
    Errored,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running { .. })
    }
}

/// Sub-phase of a running iteration.
enum Phase {
    /// Render the prompt and start the provider.
    Prompt,
    /// Forwarding fragments from the provider.
    Stream(Box<dyn CompletionStream>),
    /// `ToolCall` has been emitted; dispatch when the consumer asks again.
    Dispatch { thought: String, action: Action },
    /// A terminal event has been queued.
    Done,
}

/// One run in progress, yielding its events in emission order.
pub struct AgentRun<'a> {
    agent: &'a AgentLoop,
    run_id: RunId,
    state: AgentState,
    catalog: Vec<ToolSummary>,
    status: RunStatus,
    phase: Phase,
    pending: VecDeque<AgentEvent>,
}

impl AgentRun<'_> {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// The run's history so far.
    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn into_state(self) -> AgentState {
        self.state
    }

    fn step(&self) -> usize {
        self.state.steps().len()
    }

    /// Render the prompt and open the provider stream, unless the budget is spent.
    fn begin_iteration(&mut self) {
        let step = self.step();
        let max_steps = self.agent.max_steps;
        if step >= max_steps {
            self.fail(WardenError::StepBudgetExceeded { max_steps });
            return;
        }

        let prompt = build_prompt(&self.state, &self.catalog);
        debug!(
            run_id = %self.run_id,
            step,
            prompt_chars = prompt.len(),
            "requesting completion"
        );

        match self.agent.provider.complete(&prompt) {
            Ok(stream) => self.phase = Phase::Stream(stream),
            Err(err) => self.fail(err),
        }
    }

    /// Parse the aggregated response and queue the resulting events.
    fn settle(&mut self, full_text: WardenResult<String>) {
        let parsed = match full_text.and_then(|text| parse_response(&text)) {
            Ok(parsed) => parsed,
            Err(err) => return self.fail(err),
        };

        let thought = parsed.thought_or_sentinel().to_string();
        self.pending.push_back(AgentEvent::Thought { thought: thought.clone() });

        match parsed.directive {
            Directive::Finish(result) => {
                info!(run_id = %self.run_id, steps = self.step(), "agent finished");
                self.pending.push_back(AgentEvent::Finish { result });
                self.status = RunStatus::Finished;
                self.phase = Phase::Done;
            }
            Directive::Action(action) => {
                debug!(
                    run_id = %self.run_id,
                    step = self.step(),
                    tool = %action.tool_name,
                    "model requested tool call"
                );
                self.pending.push_back(AgentEvent::ToolCall { action: action.clone() });
                self.phase = Phase::Dispatch { thought, action };
            }
        }
    }

    /// Route the action through the gateway and record the completed step.
    fn dispatch(&mut self, thought: String, action: Action) {
        let observation = self.agent.gateway.dispatch(&action);
        debug!(
            run_id = %self.run_id,
            step = self.step(),
            tool = %action.tool_name,
            observation_chars = observation.len(),
            "tool call observed"
        );

        self.pending.push_back(AgentEvent::ToolOutput { observation: observation.clone() });
        self.state.add_step(Step { thought, action, observation });
        self.status = RunStatus::Running { step: self.step() };
        self.phase = Phase::Prompt;
    }

    fn fail(&mut self, err: WardenError) {
        warn!(run_id = %self.run_id, step = self.step(), error = %err, "agent run stopped");
        self.pending.push_back(AgentEvent::Error { message: err.to_string() });
        self.status = RunStatus::Errored;
        self.phase = Phase::Done;
    }
}

impl Iterator for AgentRun<'_> {
    type Item = AgentEvent;

    fn next(&mut self) -> Option<AgentEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Done => return None,
                Phase::Prompt => self.begin_iteration(),
                Phase::Stream(mut stream) => match stream.next_fragment() {
                    Some(Ok(delta)) => {
                        self.phase = Phase::Stream(stream);
                        return Some(AgentEvent::TextDelta { delta });
                    }
                    Some(Err(err)) => self.fail(err),
                    None => self.settle(stream.full_text()),
                },
                Phase::Dispatch { thought, action } => self.dispatch(thought, action),
            }
        }
    }
}

impl FusedIterator for AgentRun<'_> {}

// ── Tests ────────────────────────────────────────────────────────────────────
