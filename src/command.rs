//! Menu command registry.

use std::collections::HashMap;
use std::fmt;

/// Menu entry a call is made for, used to label the log lines.
#[derive(Debug, Clone, Copy)]
pub struct TestCase<'a> {
    pub id: u32,
    pub name: &'a str,
}

impl fmt::Display for TestCase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.name)
    }
}

/// Action bound to a menu entry. It gets the session it runs in and the
/// label of the entry it was invoked through.
pub type Action<C> = fn(&mut C, TestCase<'_>);

pub struct Command<C> {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    action: Action<C>,
}

impl<C> Command<C> {
    pub fn test_case(&self) -> TestCase<'static> {
        TestCase {
            id: self.id,
            name: self.name,
        }
    }

    pub fn run(&self, ctx: &mut C) {
        (self.action)(ctx, self.test_case());
    }
}

/// Commands in registration order, reachable by numeric id or by name.
pub struct CommandRegistry<C> {
    commands: Vec<Command<C>>,
    keys: HashMap<String, usize>,
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            keys: HashMap::new(),
        }
    }

    /// Register `action` under both `id` and `name`. A later registration
    /// with the same key shadows the earlier one.
    pub fn register(
        &mut self,
        id: u32,
        name: &'static str,
        description: &'static str,
        action: Action<C>,
    ) -> &mut Self {
        let slot = self.commands.len();
        self.commands.push(Command {
            id,
            name,
            description,
            action,
        });
        self.keys.insert(id.to_string(), slot);
        self.keys.insert(name.to_string(), slot);
        self
    }

    pub fn resolve(&self, token: &str) -> Option<&Command<C>> {
        self.keys.get(token).map(|&slot| &self.commands[slot])
    }

    pub fn list(&self) -> impl Iterator<Item = &Command<C>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Calls(Vec<String>);

    fn record(calls: &mut Calls, case: TestCase<'_>) {
        calls.0.push(case.to_string());
    }

    fn registry() -> CommandRegistry<Calls> {
        let mut registry = CommandRegistry::new();
        registry
            .register(0, "isAvailable", "Check if provider is available", record)
            .register(1, "sourceConnectTo", "Connect to a media source", record);
        registry
    }

    #[test]
    fn id_and_name_resolve_to_same_entry() {
        let registry = registry();

        let by_id = registry.resolve("1").unwrap();
        let by_name = registry.resolve("sourceConnectTo").unwrap();
        assert!(std::ptr::eq(by_id, by_name));
        assert_eq!(by_id.id, 1);
    }

    #[test]
    fn unknown_token_is_not_found() {
        let registry = registry();
        assert!(registry.resolve("999").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn list_keeps_registration_order() {
        let registry = registry();
        let names: Vec<_> = registry.list().map(|c| c.name).collect();
        assert_eq!(names, ["isAvailable", "sourceConnectTo"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn run_passes_label() {
        let registry = registry();
        let mut calls = Calls::default();
        registry.resolve("isAvailable").unwrap().run(&mut calls);
        assert_eq!(calls.0, ["0 - isAvailable"]);
    }
}
