//! Operator console command interpreter.
//!
//! `Console::execute` parses one line and returns what to print. It has no
//! I/O of its own, so the REPL loop and tests drive it the same way.

use std::sync::Arc;

use serde_json::Value;

use crate::context::ContextRegistry;
use crate::modules::registry::ModuleRegistry;
use crate::proxy::commands as proxy_commands;
use crate::proxy::rules::ProxyRules;

/// What the REPL should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    pub exit: bool,
}

impl CommandOutput {
    fn lines(lines: Vec<String>) -> Self {
        Self { lines, exit: false }
    }
}

/// Console bound to the live server state.
#[derive(Debug, Clone)]
pub struct Console {
    proxy: Arc<ProxyRules>,
    contexts: Arc<ContextRegistry>,
    registry: Arc<ModuleRegistry>,
}

impl Console {
    pub fn new(
        proxy: Arc<ProxyRules>,
        contexts: Arc<ContextRegistry>,
        registry: Arc<ModuleRegistry>,
    ) -> Self {
        Self {
            proxy,
            contexts,
            registry,
        }
    }

    pub fn execute(&self, line: &str) -> CommandOutput {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => CommandOutput::lines(Vec::new()),
            ["proxy" | ".proxy", args @ ..] => {
                let outcome = proxy_commands::execute(&self.proxy.snapshot(), args);
                self.proxy.replace(outcome.settings);
                CommandOutput::lines(outcome.lines)
            }
            ["context" | ".context", args @ ..] => CommandOutput::lines(self.context(args, line)),
            ["routes" | ".routes"] => CommandOutput::lines(self.routes()),
            ["help" | ".help"] => CommandOutput::lines(help()),
            ["exit" | ".exit" | "quit"] => CommandOutput {
                lines: vec!["Bye.".to_string()],
                exit: true,
            },
            [other, ..] => CommandOutput::lines(vec![format!(
                "Unknown command: {}. Type \"help\" for a list of commands.",
                other
            )]),
        }
    }

    fn context(&self, args: &[&str], line: &str) -> Vec<String> {
        match args {
            [] => self.show_context("/"),
            [path] => self.show_context(path),
            [path, "set", key, ..] => {
                // The value is the rest of the line, so JSON may contain spaces.
                let raw = skip_words(line, 4).trim();
                match serde_json::from_str::<Value>(raw) {
                    Ok(value) => {
                        self.contexts.find(path).set(*key, value);
                        vec![format!("Set {} in context for {}", key, path)]
                    }
                    Err(e) => vec![format!("Invalid JSON value: {}", e)],
                }
            }
            _ => vec![
                "usage: context [path]".to_string(),
                "       context <path> set <key> <json>".to_string(),
            ],
        }
    }

    fn show_context(&self, path: &str) -> Vec<String> {
        let snapshot = self.contexts.find(path).snapshot();
        let pretty = serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| snapshot.to_string());
        pretty.lines().map(str::to_string).collect()
    }

    fn routes(&self) -> Vec<String> {
        let routes = self.registry.routes();
        if routes.is_empty() {
            return vec!["No routes registered.".to_string()];
        }
        routes
            .into_iter()
            .map(|(template, methods)| {
                let methods: Vec<&str> = methods.iter().map(|m| m.as_str()).collect();
                format!("{} {}", methods.join(","), template)
            })
            .collect()
    }
}

pub fn help() -> Vec<String> {
    let mut lines: Vec<String> = [
        "context [path]                  show the context for a path",
        "context <path> set <key> <json> store a value in that context",
        "routes                          list routes and methods",
        "help                            show this message",
        "exit                            stop the server",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    lines.extend(proxy_commands::help());
    lines
}

/// The remainder of `line` after its first `n` whitespace-separated words.
fn skip_words(line: &str, n: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..n {
        rest = match rest.split_once(char::is_whitespace) {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::proxy::rules::ProxySettings;
    use serde_json::json;

    fn console() -> Console {
        Console::new(
            Arc::new(ProxyRules::new(ProxySettings::new(Some("http://localhost:9000".into())))),
            Arc::new(ContextRegistry::default()),
            Arc::new(ModuleRegistry::default()),
        )
    }

    #[test]
    fn test_proxy_commands_update_live_rules() {
        let console = console();

        let output = console.execute("proxy on /foo/bar");
        assert_eq!(
            output.lines,
            vec!["Requests to /foo/bar will be proxied to http://localhost:9000/foo/bar"]
        );
        assert!(console.proxy.is_enabled("/foo/bar/baz"));

        console.execute(".proxy off /foo/bar");
        assert!(!console.proxy.is_enabled("/foo/bar"));
    }

    #[test]
    fn test_context_show_and_set() {
        let console = console();
        console
            .contexts
            .register("/pets", Context::from_value(json!({ "count": 1 })));

        let output = console.execute("context /pets/1 set owner {\"name\": \"Ann\"}");
        assert_eq!(output.lines, vec!["Set owner in context for /pets/1"]);
        assert_eq!(
            console.contexts.find("/pets").get("owner"),
            Some(json!({ "name": "Ann" }))
        );

        let shown = console.execute("context /pets").lines.join("\n");
        assert!(shown.contains("\"count\": 1"));

        let bad = console.execute("context /pets set owner {oops");
        assert!(bad.lines[0].starts_with("Invalid JSON value"));
    }

    #[test]
    fn test_context_set_with_irregular_spacing() {
        let console = console();
        let output = console.execute("  context /pets  set\tcount   { \"n\": 2 }");
        assert_eq!(output.lines, vec!["Set count in context for /pets"]);
        assert_eq!(console.contexts.find("/pets").get("count"), Some(json!({ "n": 2 })));

        assert_eq!(skip_words("a  b\tc d", 3), "d");
        assert_eq!(skip_words("a b", 4), "");
    }

    #[test]
    fn test_exit_and_unknown() {
        let console = console();
        assert!(console.execute("exit").exit);
        assert!(!console.execute("").exit);
        assert!(console.execute("frobnicate").lines[0].starts_with("Unknown command: frobnicate"));
        assert_eq!(console.execute("routes").lines, vec!["No routes registered."]);
    }
}
