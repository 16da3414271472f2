//! Server-side parameter injection.
//!
//! Some tools need context the model must never control, like the owner's
//! GitHub username. The injector merges that value into the arguments of
//! the tools that need it, overwriting anything the model supplied.

use std::collections::HashSet;

use doppel_core::tool::ToolCall;
use serde_json::{Map, Value};

/// Injects one key/value pair into the arguments of selected tools.
#[derive(Debug, Clone)]
pub struct ContextInjector {
    key: String,
    value: String,
    tools: HashSet<String>,
}

impl ContextInjector {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        tools: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            tools: tools.into_iter().collect(),
        }
    }

    /// An injector that never fires.
    pub fn disabled() -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            tools: HashSet::new(),
        }
    }

    /// Merge the context value into the call's arguments if the tool wants
    /// it. Non-object arguments are replaced with an object first.
    pub fn apply(&self, call: &mut ToolCall) {
        if !self.tools.contains(&call.name) {
            return;
        }

        if !call.arguments.is_object() {
            call.arguments = Value::Object(Map::new());
        }
        if let Some(obj) = call.arguments.as_object_mut() {
            obj.insert(self.key.clone(), Value::String(self.value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn injector() -> ContextInjector {
        ContextInjector::new("username", "aayushmaan", vec!["repo_search".to_string()])
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn adds_username_to_selected_tool() {
        let mut c = call("repo_search", json!({"query": "agents"}));
        injector().apply(&mut c);
        assert_eq!(c.arguments["username"], "aayushmaan");
        assert_eq!(c.arguments["query"], "agents");
    }

    #[test]
    fn overwrites_model_supplied_value() {
        let mut c = call("repo_search", json!({"query": "x", "username": "attacker"}));
        injector().apply(&mut c);
        assert_eq!(c.arguments["username"], "aayushmaan");
    }

    #[test]
    fn leaves_other_tools_untouched() {
        let mut c = call("web_search", json!({"query": "news"}));
        injector().apply(&mut c);
        assert!(c.arguments.get("username").is_none());
    }

    #[test]
    fn repairs_non_object_arguments() {
        let mut c = call("repo_search", json!("not an object"));
        injector().apply(&mut c);
        assert_eq!(c.arguments["username"], "aayushmaan");
    }

    #[test]
    fn disabled_injector_is_inert() {
        let mut c = call("repo_search", json!({"query": "x"}));
        ContextInjector::disabled().apply(&mut c);
        assert!(c.arguments.get("username").is_none());
    }
}
