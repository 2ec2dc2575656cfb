//! Handler definitions
//!
//! A [`HandlerDefinition`] is either a command or an event binding. Both are
//! only obtainable through their builders, which reject incomplete shapes, so
//! everything that reaches the registry is dispatchable.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::handler::{AutocompleteExecutor, CommandExecutor, EventExecutor};
use crate::platform::EventKind;

/// Discord limits for command and option metadata
pub const MAX_NAME_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 100;
pub const MAX_OPTIONS: usize = 25;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("'{name}' has no execute handler")]
    MissingExecute { name: String },

    #[error("invalid command name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid description for '{name}': {reason}")]
    InvalidDescription { name: String, reason: &'static str },

    #[error("invalid option '{option}' on '{name}': {reason}")]
    InvalidOption {
        name: String,
        option: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
}

/// Permission a member needs by default to see a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberPermission {
    ManageChannels,
    ManageGuild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSchema {
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub autocomplete: bool,
    /// Restrict channel options to guild text channels
    pub text_channels_only: bool,
    pub options: Vec<OptionSchema>,
}

impl OptionSchema {
    pub fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            autocomplete: false,
            text_channels_only: false,
            options: Vec::new(),
        }
    }

    pub fn subcommand(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::SubCommand, name, description)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }

    pub fn text_channels_only(mut self) -> Self {
        self.text_channels_only = true;
        self
    }

    pub fn option(mut self, option: OptionSchema) -> Self {
        self.options.push(option);
        self
    }
}

/// Declarative command metadata, registered with the platform as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    pub options: Vec<OptionSchema>,
    pub guild_only: bool,
    pub default_member_permission: Option<MemberPermission>,
}

impl CommandSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            guild_only: false,
            default_member_permission: None,
        }
    }

    pub fn option(mut self, option: OptionSchema) -> Self {
        self.options.push(option);
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    pub fn default_member_permission(mut self, permission: MemberPermission) -> Self {
        self.default_member_permission = Some(permission);
        self
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if let Some(reason) = name_problem(&self.name) {
            return Err(DefinitionError::InvalidName {
                name: self.name.clone(),
                reason,
            });
        }
        if let Some(reason) = description_problem(&self.description) {
            return Err(DefinitionError::InvalidDescription {
                name: self.name.clone(),
                reason,
            });
        }
        validate_options(&self.name, &self.options)
    }
}

fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name.chars().count() > MAX_NAME_LEN {
        Some("name longer than 32 characters")
    } else if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        Some("only lowercase letters, digits, '-' and '_' are allowed")
    } else {
        None
    }
}

fn description_problem(description: &str) -> Option<&'static str> {
    if description.trim().is_empty() {
        Some("description is empty")
    } else if description.chars().count() > MAX_DESCRIPTION_LEN {
        Some("description longer than 100 characters")
    } else {
        None
    }
}

fn validate_options(command: &str, options: &[OptionSchema]) -> Result<(), DefinitionError> {
    let invalid = |option: &OptionSchema, reason| DefinitionError::InvalidOption {
        name: command.to_string(),
        option: option.name.clone(),
        reason,
    };

    if options.len() > MAX_OPTIONS {
        return Err(DefinitionError::InvalidOption {
            name: command.to_string(),
            option: String::new(),
            reason: "more than 25 options",
        });
    }

    for option in options {
        if let Some(reason) = name_problem(&option.name) {
            return Err(invalid(option, reason));
        }
        if let Some(reason) = description_problem(&option.description) {
            return Err(invalid(option, reason));
        }
        let nests = matches!(option.kind, OptionKind::SubCommand | OptionKind::SubCommandGroup);
        if !nests && !option.options.is_empty() {
            return Err(invalid(option, "only subcommands can contain options"));
        }
        if option.autocomplete && option.kind != OptionKind::String {
            return Err(invalid(option, "autocomplete is only supported on string options"));
        }
        validate_options(command, &option.options)?;
    }
    Ok(())
}

/// A user-invocable command
#[derive(Clone)]
pub struct CommandDefinition {
    schema: CommandSchema,
    cooldown_seconds: Option<u64>,
    autocomplete: Option<Arc<dyn AutocompleteExecutor>>,
    execute: Arc<dyn CommandExecutor>,
}

impl CommandDefinition {
    pub fn builder(schema: CommandSchema) -> CommandDefinitionBuilder {
        CommandDefinitionBuilder {
            schema,
            cooldown_seconds: None,
            autocomplete: None,
            execute: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &CommandSchema {
        &self.schema
    }

    /// Declared cooldown; `None` means the dispatcher default applies
    pub fn cooldown_seconds(&self) -> Option<u64> {
        self.cooldown_seconds
    }

    pub fn autocomplete_handler(&self) -> Option<Arc<dyn AutocompleteExecutor>> {
        self.autocomplete.clone()
    }

    pub fn execute_handler(&self) -> Arc<dyn CommandExecutor> {
        Arc::clone(&self.execute)
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.schema.name)
            .field("cooldown_seconds", &self.cooldown_seconds)
            .field("autocomplete", &self.autocomplete.is_some())
            .finish()
    }
}

pub struct CommandDefinitionBuilder {
    schema: CommandSchema,
    cooldown_seconds: Option<u64>,
    autocomplete: Option<Arc<dyn AutocompleteExecutor>>,
    execute: Option<Arc<dyn CommandExecutor>>,
}

impl CommandDefinitionBuilder {
    /// Seconds between invocations by the same user; `0` disables the cooldown
    pub fn cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }

    pub fn autocomplete(mut self, handler: Arc<dyn AutocompleteExecutor>) -> Self {
        self.autocomplete = Some(handler);
        self
    }

    pub fn execute(mut self, handler: Arc<dyn CommandExecutor>) -> Self {
        self.execute = Some(handler);
        self
    }

    pub fn build(self) -> Result<CommandDefinition, DefinitionError> {
        self.schema.validate()?;
        let execute = self.execute.ok_or_else(|| DefinitionError::MissingExecute {
            name: self.schema.name.clone(),
        })?;
        Ok(CommandDefinition {
            schema: self.schema,
            cooldown_seconds: self.cooldown_seconds,
            autocomplete: self.autocomplete,
            execute,
        })
    }
}

/// A callback bound to a platform event
#[derive(Clone)]
pub struct EventDefinition {
    kind: EventKind,
    once: bool,
    execute: Arc<dyn EventExecutor>,
}

impl EventDefinition {
    pub fn builder(kind: EventKind) -> EventDefinitionBuilder {
        EventDefinitionBuilder {
            kind,
            once: false,
            execute: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Fire on the first occurrence only
    pub fn once(&self) -> bool {
        self.once
    }

    pub fn execute_handler(&self) -> Arc<dyn EventExecutor> {
        Arc::clone(&self.execute)
    }
}

impl fmt::Debug for EventDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDefinition")
            .field("kind", &self.kind)
            .field("once", &self.once)
            .finish()
    }
}

pub struct EventDefinitionBuilder {
    kind: EventKind,
    once: bool,
    execute: Option<Arc<dyn EventExecutor>>,
}

impl EventDefinitionBuilder {
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn execute(mut self, handler: Arc<dyn EventExecutor>) -> Self {
        self.execute = Some(handler);
        self
    }

    pub fn build(self) -> Result<EventDefinition, DefinitionError> {
        let execute = self.execute.ok_or_else(|| DefinitionError::MissingExecute {
            name: self.kind.to_string(),
        })?;
        Ok(EventDefinition {
            kind: self.kind,
            once: self.once,
            execute,
        })
    }
}

#[derive(Debug, Clone)]
pub enum HandlerDefinition {
    Command(CommandDefinition),
    Event(EventDefinition),
}

impl HandlerDefinition {
    /// Command name or event type
    pub fn identity(&self) -> String {
        match self {
            HandlerDefinition::Command(command) => command.name().to_string(),
            HandlerDefinition::Event(event) => event.kind().to_string(),
        }
    }
}

impl From<CommandDefinition> for HandlerDefinition {
    fn from(definition: CommandDefinition) -> Self {
        HandlerDefinition::Command(definition)
    }
}

impl From<EventDefinition> for HandlerDefinition {
    fn from(definition: EventDefinition) -> Self {
        HandlerDefinition::Event(definition)
    }
}
