//! The secure gateway: the trust boundary between model intent and tools.
//!
//! Every action runs through the same strictly ordered pipeline, and the
//! first failing gate short-circuits the rest:
//!
//!   Lookup → Validate → Sandbox → Filter → Execute (contained)
//!
//! The security invariant is absolute: `Tool::execute()` is NEVER called
//! unless every earlier gate has passed. The only call site for `execute` is
//! at the end of `secure_execute`, reachable only after the four checks.
//!
//! The output contract is uniform: the caller always gets a `String`,
//! whether a gate rejected the call, the tool succeeded, or the tool faulted.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use warden_contracts::{
    agent::Action,
    tool::{Tool, ToolContext, ToolKind, ToolSummary},
};
use warden_core::traits::ToolGateway;

use crate::{
    filter::check_command,
    registry::ToolRegistry,
    sandbox::{absolute_root, resolve_within},
    validate::validate_args,
};

/// The argument name the sandbox gate inspects.
pub const PATH_ARG: &str = "path";

/// The argument name the command filter inspects on `Process` tools.
pub const COMMAND_ARG: &str = "command";

/// A `ToolGateway` bound to one registry and one sandbox root.
///
/// The registry is shared; any number of gateways (e.g. one per workspace)
/// may point at the same `Arc<ToolRegistry>`.
#[derive(Debug, Clone)]
pub struct SecureGateway {
    registry: Arc<ToolRegistry>,
    sandbox_root: PathBuf,
}

impl SecureGateway {
    /// Bind `registry` to `sandbox_root`. A relative root is made absolute
    /// against the process working directory, once, here.
    pub fn new(registry: Arc<ToolRegistry>, sandbox_root: impl AsRef<Path>) -> Self {
        Self { registry, sandbox_root: absolute_root(sandbox_root.as_ref()) }
    }

    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl ToolGateway for SecureGateway {
    fn dispatch(&self, action: &Action) -> String {
        execute_in_root(&action.tool_name, &action.args, &self.registry, &self.sandbox_root)
    }

    fn catalog(&self) -> Vec<ToolSummary> {
        self.registry.summaries()
    }
}

/// Run one tool call through every gate.
///
/// `sandbox_root` may be relative; it is resolved against the process working
/// directory before any containment check.
pub fn secure_execute(
    tool_name: &str,
    raw_args: &Value,
    registry: &ToolRegistry,
    sandbox_root: &Path,
) -> String {
    execute_in_root(tool_name, raw_args, registry, &absolute_root(sandbox_root))
}

/// The pipeline proper. `root` must already be absolute and normalized.
fn execute_in_root(tool_name: &str, raw_args: &Value, registry: &ToolRegistry, root: &Path) -> String {
    // ── Gate 1: Lookup ───────────────────────────────────────────────────────
    let Some(tool) = registry.lookup(tool_name) else {
        warn!(tool = %tool_name, gate = "lookup", "unknown tool requested");
        return format!("Error: Tool '{tool_name}' not found.");
    };

    // ── Gate 2: Validate ─────────────────────────────────────────────────────
    if let Err(violations) = validate_args(&tool.input_schema(), raw_args) {
        warn!(
            tool = %tool_name,
            gate = "validate",
            violation_count = violations.len(),
            "arguments failed schema validation"
        );
        let issues = violations
            .iter()
            .map(|v| format!("  - {v}"))
            .collect::<Vec<_>>()
            .join("\n");
        return format!("Error: Invalid input for tool '{tool_name}'.\nIssues:\n{issues}");
    }

    // ── Gate 3: Sandbox ──────────────────────────────────────────────────────
    //
    // Only a top-level string argument literally named `path` is checked.
    if let Some(path) = raw_args.get(PATH_ARG).and_then(Value::as_str) {
        if resolve_within(root, path).is_none() {
            warn!(
                tool = %tool_name,
                gate = "sandbox",
                path = %path,
                root = %root.display(),
                "path escapes sandbox root"
            );
            return format!(
                "Error: Path traversal attempt detected. Access to '{path}' is outside the allowed working directory."
            );
        }
    }

    // ── Gate 4: Filter ───────────────────────────────────────────────────────
    if tool.kind() == ToolKind::Process {
        if let Some(command) = raw_args.get(COMMAND_ARG).and_then(Value::as_str) {
            if let Err(reason) = check_command(command) {
                warn!(
                    tool = %tool_name,
                    gate = "filter",
                    reason = %reason,
                    "command rejected by denylist"
                );
                return format!(
                    "Error: The command '{command}' is disallowed for security reasons ({reason})."
                );
            }
        }
    }

    // ── Gate 5: Execute with containment ─────────────────────────────────────
    debug!(tool = %tool_name, "all gates passed, executing tool");
    run_contained(tool.as_ref(), raw_args, root)
}

/// Call the executor, converting both `Err` and panics into observations.
fn run_contained(tool: &dyn Tool, args: &Value, root: &Path) -> String {
    let ctx = ToolContext::new(root);
    let detail = match panic::catch_unwind(AssertUnwindSafe(|| tool.execute(args, &ctx))) {
        Ok(Ok(observation)) => return observation,
        Ok(Err(fault)) => fault.to_string(),
        Err(payload) => panic_detail(payload.as_ref()),
    };

    error!(tool = %tool.name(), detail = %detail, "tool raised an unexpected fault");
    format!(
        "Error: An unexpected error occurred while executing the tool '{}'. Details: {}",
        tool.name(),
        detail
    )
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use warden_contracts::{
        agent::Action,
        error::ToolError,
        tool::{Tool, ToolContext, ToolKind},
    };
    use warden_core::traits::ToolGateway;

    use crate::registry::ToolRegistry;

    use super::{secure_execute, SecureGateway};

    const WORK_DIR: &str = "/home/agent/workspace";

    // ── Mock tools ───────────────────────────────────────────────────────────

    /// Records every argument set it is executed with.
    struct RecordingTool {
        name: &'static str,
        kind: ToolKind,
        schema: Value,
        calls: Arc<Mutex<Vec<Value>>>,
    }

    impl RecordingTool {
        fn with_path() -> Self {
            Self {
                name: "tool_with_path",
                kind: ToolKind::FileSystem,
                schema: json!({
                    "type": "object",
                    "properties": { "path": { "type": "string" } },
                    "required": ["path"]
                }),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }

        fn shell() -> Self {
            Self {
                name: "run_shell_command",
                kind: ToolKind::Process,
                schema: json!({
                    "type": "object",
                    "properties": { "command": { "type": "string" } },
                    "required": ["command"]
                }),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "records its calls"
        }

        fn input_schema(&self) -> Value {
            self.schema.clone()
        }

        fn kind(&self) -> ToolKind {
            self.kind
        }

        fn execute(&self, args: &Value, _ctx: &ToolContext<'_>) -> Result<String, ToolError> {
            self.calls.lock().unwrap().push(args.clone());
            Ok(format!("Executed {} with {}", self.name, args))
        }
    }

    /// Fails with an unexpected fault.
    struct FaultingTool;

    impl Tool for FaultingTool {
        fn name(&self) -> &str {
            "tool_that_faults"
        }

        fn description(&self) -> &str {
            "always faults"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }

        fn execute(&self, _args: &Value, _ctx: &ToolContext<'_>) -> Result<String, ToolError> {
            Err(ToolError::failed("Internal tool failure"))
        }
    }

    /// Panics outright.
    struct PanickingTool;

    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "tool_that_panics"
        }

        fn description(&self) -> &str {
            "always panics"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }

        fn execute(&self, _args: &Value, _ctx: &ToolContext<'_>) -> Result<String, ToolError> {
            panic!("index out of bounds");
        }
    }

    struct Fixture {
        registry: ToolRegistry,
        path_calls: Arc<Mutex<Vec<Value>>>,
        shell_calls: Arc<Mutex<Vec<Value>>>,
    }

    fn fixture() -> Fixture {
        let path_tool = RecordingTool::with_path();
        let shell_tool = RecordingTool::shell();
        let path_calls = path_tool.calls.clone();
        let shell_calls = shell_tool.calls.clone();
        let registry = ToolRegistry::new(vec![
            Arc::new(path_tool),
            Arc::new(shell_tool),
            Arc::new(FaultingTool),
            Arc::new(PanickingTool),
        ])
        .unwrap();
        Fixture { registry, path_calls, shell_calls }
    }

    fn run(f: &Fixture, tool: &str, args: Value) -> String {
        secure_execute(tool, &args, &f.registry, Path::new(WORK_DIR))
    }

    // ── Gate 1: Lookup ───────────────────────────────────────────────────────

    #[test]
    fn test_unknown_tool() {
        let f = fixture();
        assert_eq!(run(&f, "nonexistent", json!({})), "Error: Tool 'nonexistent' not found.");
    }

    // ── Gate 2: Validate ─────────────────────────────────────────────────────

    #[test]
    fn test_invalid_input_lists_field() {
        let f = fixture();
        let result = run(&f, "tool_with_path", json!({ "wrongParam": "value" }));

        assert!(result.starts_with("Error: Invalid input for tool 'tool_with_path'.\nIssues:\n"), "{result}");
        assert!(result.contains("  - [path]: "), "{result}");
        assert!(f.path_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_type_is_rejected_before_sandbox() {
        let f = fixture();
        let result = run(&f, "tool_with_path", json!({ "path": ["../../etc/passwd"] }));

        assert!(result.starts_with("Error: Invalid input"), "{result}");
        assert!(f.path_calls.lock().unwrap().is_empty());
    }

    // ── Gate 3: Sandbox ──────────────────────────────────────────────────────

    #[test]
    fn test_path_inside_root_is_forwarded_unchanged() {
        let f = fixture();
        let input = json!({ "path": "sub/file.txt" });
        run(&f, "tool_with_path", input.clone());

        assert_eq!(*f.path_calls.lock().unwrap(), vec![input]);
    }

    #[test]
    fn test_parent_traversal_is_blocked() {
        let f = fixture();
        let result = run(&f, "tool_with_path", json!({ "path": "../../etc/passwd" }));

        assert_eq!(
            result,
            "Error: Path traversal attempt detected. Access to '../../etc/passwd' is outside the allowed working directory."
        );
        assert!(f.path_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_absolute_path_outside_root_is_blocked() {
        let f = fixture();
        let result = run(&f, "tool_with_path", json!({ "path": "/etc/passwd" }));

        assert!(result.contains("Error: Path traversal attempt detected."));
        assert!(f.path_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sandbox_uses_work_dir_root() {
        let f = fixture();
        let escaped = secure_execute(
            "tool_with_path",
            &json!({ "path": "../../etc/passwd" }),
            &f.registry,
            Path::new("/work"),
        );
        assert!(escaped.contains("Path traversal"));

        secure_execute("tool_with_path", &json!({ "path": "sub/file.txt" }), &f.registry, Path::new("/work"));
        assert_eq!(f.path_calls.lock().unwrap().len(), 1);
    }

    // ── Gate 4: Filter ───────────────────────────────────────────────────────

    #[test]
    fn test_safe_command_is_allowed() {
        let f = fixture();
        let input = json!({ "command": "ls -la" });
        run(&f, "run_shell_command", input.clone());

        assert_eq!(*f.shell_calls.lock().unwrap(), vec![input]);
    }

    #[test]
    fn test_denied_program_is_blocked() {
        let f = fixture();
        let result = run(&f, "run_shell_command", json!({ "command": "rm -rf /" }));

        assert!(
            result.starts_with("Error: The command 'rm -rf /' is disallowed for security reasons"),
            "{result}"
        );
        assert!(f.shell_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_chaining_is_blocked_for_the_metacharacter() {
        let f = fixture();
        let result = run(&f, "run_shell_command", json!({ "command": "echo a && rm b" }));

        assert!(result.contains("is disallowed for security reasons"), "{result}");
        assert!(result.contains("shell metacharacter '&&'"), "{result}");
        assert!(f.shell_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_filter_applies_only_to_process_tools() {
        let f = fixture();
        // A file-system tool may legitimately carry text that looks like a command.
        let input = json!({ "path": "notes; rm -rf.txt" });
        run(&f, "tool_with_path", input.clone());

        assert_eq!(*f.path_calls.lock().unwrap(), vec![input]);
    }

    // ── Gate 5: Execute ──────────────────────────────────────────────────────

    #[test]
    fn test_tool_fault_is_contained() {
        let f = fixture();
        assert_eq!(
            run(&f, "tool_that_faults", json!({})),
            "Error: An unexpected error occurred while executing the tool 'tool_that_faults'. Details: Internal tool failure"
        );
    }

    #[test]
    fn test_tool_panic_is_contained() {
        let f = fixture();
        let result = run(&f, "tool_that_panics", json!({}));

        assert!(result.starts_with("Error: An unexpected error occurred while executing the tool 'tool_that_panics'."));
        assert!(result.ends_with("Details: index out of bounds"), "{result}");
    }

    // ── ToolGateway impl ─────────────────────────────────────────────────────

    #[test]
    fn test_gateway_dispatch_and_catalog() {
        let f = fixture();
        let path_calls = f.path_calls.clone();
        let gateway = SecureGateway::new(Arc::new(f.registry), WORK_DIR);

        let observation = gateway.dispatch(&Action::new("tool_with_path", json!({ "path": "a.txt" })));
        assert!(observation.starts_with("Executed tool_with_path"));
        assert_eq!(path_calls.lock().unwrap().len(), 1);

        let names: Vec<String> = gateway.catalog().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["tool_with_path", "run_shell_command", "tool_that_faults", "tool_that_panics"]);
        assert_eq!(gateway.sandbox_root(), Path::new(WORK_DIR));
    }

    #[test]
    fn test_relative_sandbox_root_is_resolved() {
        let f = fixture();
        let gateway = SecureGateway::new(Arc::new(f.registry), "workspace");
        assert!(gateway.sandbox_root().is_absolute());

        let result = gateway.dispatch(&Action::new("tool_with_path", json!({ "path": "../escape.txt" })));
        assert!(result.contains("Path traversal"));
    }
}
