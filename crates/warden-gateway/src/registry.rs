//! The tool registry.
//!
//! Built once from a list of tools and immutable afterwards, so one registry
//! can be shared (behind an `Arc`) by any number of concurrent runs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use warden_contracts::{
    error::{WardenError, WardenResult},
    tool::{Tool, ToolSummary},
};

pub struct ToolRegistry {
    /// Tools in registration order.
    tools: Vec<Arc<dyn Tool>>,
    /// Name → position in `tools`.
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Register `tools`, failing on the first duplicated name.
    ///
    /// A duplicate is a wiring bug, not a runtime condition: callers should
    /// treat `WardenError::DuplicateTool` as fatal and abort before any run.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> WardenResult<Self> {
        let mut index = HashMap::with_capacity(tools.len());
        for (position, tool) in tools.iter().enumerate() {
            let name = tool.name().to_string();
            if index.contains_key(&name) {
                return Err(WardenError::DuplicateTool { name });
            }
            index.insert(name, position);
        }
        debug!(tool_count = tools.len(), "tool registry built");
        Ok(Self { tools, index })
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    /// Snapshot of every registered tool, in registration order.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    pub fn summaries(&self) -> Vec<ToolSummary> {
        self.tools.iter().map(|tool| tool.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use serde_json::{json, Value};

    use warden_contracts::{
        error::{ToolError, WardenError},
        event::AgentEvent,
        tool::{Tool, ToolContext},
    };
    use warden_core::{AgentLoop, ScriptedProvider};

    use crate::gateway::SecureGateway;

    use super::ToolRegistry;

    struct NamedTool(&'static str);

    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }

        fn execute(&self, _args: &Value, _ctx: &ToolContext<'_>) -> Result<String, ToolError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn distinct_names_are_all_retrievable() {
        let registry =
            ToolRegistry::new(vec![Arc::new(NamedTool("tool_one")), Arc::new(NamedTool("tool_two"))])
                .unwrap();

        assert_eq!(registry.lookup("tool_one").unwrap().name(), "tool_one");
        assert_eq!(registry.lookup("tool_two").unwrap().name(), "tool_two");
        assert!(registry.lookup("nonexistent").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_names_fail_construction() {
        let result = ToolRegistry::new(vec![Arc::new(NamedTool("x")), Arc::new(NamedTool("x"))]);

        match result {
            Err(WardenError::DuplicateTool { name }) => assert_eq!(name, "x"),
            other => panic!("expected DuplicateTool, got {:?}", other),
        }
    }

    #[test]
    fn list_preserves_registration_order() {
        let registry = ToolRegistry::new(vec![
            Arc::new(NamedTool("c")),
            Arc::new(NamedTool("a")),
            Arc::new(NamedTool("b")),
        ])
        .unwrap();

        let names: Vec<String> = registry.list().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, ["c", "a", "b"]);

        let summaries = registry.summaries();
        assert_eq!(summaries[0].name, "c");
        assert_eq!(summaries[0].description, "test tool");
    }

    // ── Concurrent runs ──────────────────────────────────────────────────────

    /// Counts executions across every run sharing it.
    struct CountingTool(Arc<AtomicUsize>);

    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "count"
        }

        fn description(&self) -> &str {
            "counts its calls"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }

        fn execute(&self, _args: &Value, _ctx: &ToolContext<'_>) -> Result<String, ToolError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("call {n}"))
        }
    }

    #[test]
    fn one_registry_serves_concurrent_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(ToolRegistry::new(vec![Arc::new(CountingTool(calls.clone()))]).unwrap());
        let action = "<thought>Count.</thought><action tool=\"count\" args='{}'></action>";

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let provider = ScriptedProvider::new([action, action, action, "<finish>counted</finish>"]);
                    let gateway = SecureGateway::new(registry, "/work");
                    let agent = AgentLoop::new(Box::new(provider), Box::new(gateway));
                    agent.run("count three times").collect::<Vec<AgentEvent>>()
                })
            })
            .collect();

        for handle in handles {
            let events = handle.join().expect("run thread panicked");
            assert_eq!(events.last(), Some(&AgentEvent::Finish { result: "counted".into() }));
            let outputs = events.iter().filter(|e| matches!(e, AgentEvent::ToolOutput { .. })).count();
            assert_eq!(outputs, 3);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn empty_registry_is_valid() {
        let registry = ToolRegistry::new(vec![]).unwrap();
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }
}
