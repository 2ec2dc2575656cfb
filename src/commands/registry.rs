//! Handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Index command and event definitions, load reports, atomic swap handle
//! - 1.0.0: Initial implementation for handler dispatch

use log::{info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::definition::{
    CommandDefinition, CommandSchema, DefinitionError, EventDefinition, HandlerDefinition,
};
use crate::platform::EventKind;

/// A registered event handler and its one-shot state
pub struct EventRegistration {
    definition: EventDefinition,
    fired: AtomicBool,
}

impl EventRegistration {
    fn new(definition: EventDefinition) -> Self {
        Self {
            definition,
            fired: AtomicBool::new(false),
        }
    }

    pub fn definition(&self) -> &EventDefinition {
        &self.definition
    }

    /// Whether the handler should run for this occurrence
    ///
    /// Always true for persistent handlers; true exactly once for `once`
    /// handlers, even under concurrent deliveries.
    pub fn claim(&self) -> bool {
        if !self.definition.once() {
            return true;
        }
        self.fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Registry mapping command names and event kinds to definitions
///
/// Built before dispatch starts and read-only afterwards. Reloading builds a
/// new registry and swaps it in through a [`RegistryHandle`].
///
/// # Example
///
/// ```ignore
/// let (registry, report) = load_definitions(builtin_definitions());
/// if let Some(command) = registry.get_command("ping") {
///     command.execute_handler().execute(ctx, invocation).await?;
/// }
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandDefinition>,
    events: HashMap<EventKind, Vec<Arc<EventRegistration>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition
    ///
    /// A command with an existing name replaces the previous one, which is
    /// returned. Event handlers accumulate in registration order.
    pub fn register(&mut self, definition: HandlerDefinition) -> Option<CommandDefinition> {
        match definition {
            HandlerDefinition::Command(command) => {
                self.commands.insert(command.name().to_string(), command)
            }
            HandlerDefinition::Event(event) => {
                self.events
                    .entry(event.kind())
                    .or_default()
                    .push(Arc::new(EventRegistration::new(event)));
                None
            }
        }
    }

    /// Validate and index a batch of candidates
    ///
    /// Invalid candidates are logged and reported; they never abort the batch.
    pub fn load(
        &mut self,
        candidates: impl IntoIterator<Item = DefinitionCandidate>,
    ) -> RegistryLoadReport {
        let mut report = RegistryLoadReport::default();

        for candidate in candidates {
            match candidate.definition {
                Ok(definition) => {
                    let identity = definition.identity();
                    if self.register(definition).is_some() {
                        warn!(
                            "⚠️ Command '{}' from {} replaces an earlier definition",
                            identity, candidate.source
                        );
                    }
                    report.loaded += 1;
                }
                Err(reason) => {
                    warn!("⚠️ Skipping invalid definition in {}: {}", candidate.source, reason);
                    report.failed.push(FailedSource {
                        source: candidate.source,
                        reason,
                    });
                }
            }
        }

        info!(
            "📋 Loaded {} definitions ({} commands, {} event handlers), {} failed",
            report.loaded,
            self.commands.len(),
            self.event_handler_count(),
            report.failed.len()
        );
        report
    }

    pub fn get_command(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    /// Event handlers for `kind` in registration order
    pub fn event_handlers(&self, kind: EventKind) -> &[Arc<EventRegistration>] {
        self.events.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }

    pub fn event_handler_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    /// Schemas of all commands, sorted by name
    pub fn command_schemas(&self) -> Vec<&CommandSchema> {
        let mut schemas: Vec<_> = self.commands.values().map(CommandDefinition::schema).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }
}

/// A definition produced by some source (module, plugin, file)
pub struct DefinitionCandidate {
    pub source: String,
    pub definition: Result<HandlerDefinition, DefinitionError>,
}

impl DefinitionCandidate {
    pub fn new<D: Into<HandlerDefinition>>(
        source: impl Into<String>,
        definition: Result<D, DefinitionError>,
    ) -> Self {
        Self {
            source: source.into(),
            definition: definition.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSource {
    pub source: String,
    pub reason: DefinitionError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryLoadReport {
    pub loaded: usize,
    pub failed: Vec<FailedSource>,
}

/// Build a fresh registry from a batch of candidates
pub fn load_definitions(
    candidates: impl IntoIterator<Item = DefinitionCandidate>,
) -> (CommandRegistry, RegistryLoadReport) {
    let mut registry = CommandRegistry::new();
    let report = registry.load(candidates);
    (registry, report)
}

/// Shared, swappable reference to the active registry
///
/// Readers take a snapshot and keep using it for the whole dispatch, so a
/// concurrent reload is never observed half-built.
#[derive(Clone)]
pub struct RegistryHandle {
    current: Arc<RwLock<Arc<CommandRegistry>>>,
}

impl RegistryHandle {
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    pub fn snapshot(&self) -> Arc<CommandRegistry> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the active registry, returning the previous one
    pub fn swap(&self, registry: CommandRegistry) -> Arc<CommandRegistry> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(registry))
    }
}
