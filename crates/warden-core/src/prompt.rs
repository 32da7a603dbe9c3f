//! Instruction rendering.
//!
//! `build_prompt` is a pure function of the run state and the tool catalogue.
//! It re-renders the entire history on every call; nothing is truncated or
//! summarized, so prompt size grows linearly with the step count.

use std::fmt::Write;

use warden_contracts::{agent::Step, tool::ToolSummary};

use crate::state::AgentState;

const PREAMBLE: &str = "\
You are an expert software development assistant. Your task is to accurately and \
efficiently resolve the user's request by thinking step-by-step and using the provided tools.

Your response must always be in the following format:

<thought>Your reasoning for the next step, considering previous actions and observations.</thought>
<action tool=\"toolName\" args='{\"arg1\": \"value1\", \"arg2\": \"value2\"}'></action>

If you have achieved the goal or cannot make further progress, you must respond with:

<thought>Your final conclusion or explanation.</thought>
<finish>Your final answer or summary of the task.</finish>
";

/// Render the instruction for the next model round-trip.
pub fn build_prompt(state: &AgentState, tools: &[ToolSummary]) -> String {
    let mut out = String::from(PREAMBLE);

    if !tools.is_empty() {
        out.push_str("\n--- Available Tools ---\n");
        for tool in tools {
            render_tool(&mut out, tool);
        }
        out.push_str("--- End Tools ---\n");
    }

    if !state.steps().is_empty() {
        out.push_str("\n--- History ---\n");
        for step in state.steps() {
            render_step(&mut out, step);
        }
        out.push_str("--- End History ---\n");
    }

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "\n--- Current Task ---\nUser's Goal: {}\nWhat is your next thought and action?",
        state.goal()
    );
    out
}

fn render_tool(out: &mut String, tool: &ToolSummary) {
    let _ = writeln!(out, "- {}: {}", tool.name, tool.description);
    let _ = writeln!(out, "  Input schema: {}", tool.input_schema);
}

fn render_step(out: &mut String, step: &Step) {
    let _ = writeln!(out, "<thought>{}</thought>", step.thought);
    let _ = writeln!(
        out,
        "<action tool=\"{}\" args='{}'></action>",
        step.action.tool_name, step.action.args
    );
    let _ = writeln!(out, "<observation>{}</observation>", step.observation);
}
